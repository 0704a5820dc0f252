// Licensed under the Apache-2.0 license

//! Boot sequencing against the emulated HSM.

#[cfg(test)]
pub mod test {
    use crate::test::{new_hal, BOOT_POLLS};
    use emulator_hsm::{EmulatorConfig, Phase};
    use hsm_mbox_common::{ErrorCode, KitStatus, ProcessingState, SecureBootState};
    use kit_host::boot_hsm;
    use kit_protocol::config::MAX_RESPONSE_BYTES;
    use kit_protocol::hsm_hal::HSM_MAILBOX_ADDRESS;
    use kit_protocol::{BootState, HsmDevice, KitConfig, KitHal};

    fn secure_emulator() -> EmulatorConfig {
        EmulatorConfig::default()
            .with_secure_boot(true)
            .with_boot_latency_polls(2)
    }

    #[test]
    fn test_secure_boot_flow() {
        let mut hal = new_hal(secure_emulator(), KitConfig::new().with_secure_boot(true));

        assert_eq!(hal.poll_boot(), BootState::LoadingFirmware);
        assert_eq!(hal.poll_boot(), BootState::SelfTest);
        assert!(matches!(hal.hsm().phase(), Phase::Authenticating(_)));
        assert_eq!(hal.poll_boot(), BootState::AwaitingOperational);
        assert!(hal.hsm().self_test_ran());

        boot_hsm(&mut hal, BOOT_POLLS).unwrap();
        assert!(hal.boot_sequencer().is_ready());
        assert!(!hal.boot_sequencer().boot_failed());

        let status = hal.hsm().status();
        assert_eq!(status.processing_state, ProcessingState::Operational);
        assert_eq!(status.secure_boot_state, SecureBootState::Passed);
        assert_eq!(status.error_code, ErrorCode::None);
    }

    #[test]
    fn test_self_test_failure_still_boots() {
        let mut hal = new_hal(
            secure_emulator().with_self_test_passes(false),
            KitConfig::new().with_secure_boot(true),
        );
        boot_hsm(&mut hal, BOOT_POLLS).unwrap();
        assert!(hal.boot_sequencer().boot_failed());
        assert_eq!(hal.hsm().status().error_code, ErrorCode::SelfTestFailure);

        let mut response = vec![0u8; MAX_RESPONSE_BYTES];
        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[03]s[0F]", &mut response);
        assert_eq!(reply.status, KitStatus::ExecutionError);
    }

    #[test]
    fn test_non_secure_boot_skips_firmware() {
        let mut hal = new_hal(
            EmulatorConfig::default().with_boot_latency_polls(4),
            KitConfig::new().with_secure_boot(false),
        );
        let polls = boot_hsm(&mut hal, BOOT_POLLS).unwrap();
        assert!(polls > 4);
        assert_eq!(hal.hsm().command_count(), 0);
        assert!(!hal.hsm().self_test_ran());
        assert_eq!(
            hal.hsm().status().secure_boot_state,
            SecureBootState::Disabled
        );
    }

    #[test]
    fn test_missing_firmware_hangs_boot() {
        let mut hal = new_hal(
            secure_emulator().with_firmware_present(false),
            KitConfig::new().with_secure_boot(true),
        );
        let err = boot_hsm(&mut hal, BOOT_POLLS).unwrap_err();
        assert!(err.to_string().contains("not ready"));
        assert_eq!(hal.boot_sequencer().state(), BootState::AwaitingOperational);
        assert!(hal.boot_sequencer().boot_failed());

        let status = hal.hsm().status();
        assert_eq!(status.processing_state, ProcessingState::SafeMode);
        assert_eq!(status.error_code, ErrorCode::FirmwareAuthFailure);

        let mut response = vec![0u8; MAX_RESPONSE_BYTES];
        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[03]s[0F]", &mut response);
        assert_eq!(reply.status, KitStatus::CommFail);
    }
}
