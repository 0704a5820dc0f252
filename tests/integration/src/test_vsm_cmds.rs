// Licensed under the Apache-2.0 license

//! VSM commands sent through the HSM mailbox backend to the emulated HSM.

#[cfg(test)]
pub mod test {
    use crate::test::{booted_hal, le_words, new_hal};
    use emulator_hsm::EmulatorConfig;
    use hsm_mbox_common::{CmdResultCode, KitStatus, VsMetaData};
    use kit_protocol::config::MAX_RESPONSE_BYTES;
    use kit_protocol::hsm_hal::HSM_MAILBOX_ADDRESS;
    use kit_protocol::{KitConfig, KitHal};

    const WRITE_SLOT_15: &str =
        "g[56]c[00]s[0F]l[00000006]d[000102030405060708090A0B0C0D0E0F1011121314151617]";

    fn payload() -> Vec<u8> {
        (0u8..24).collect()
    }

    #[test]
    fn test_write_info_read_delete() {
        let mut hal = booted_hal(KitConfig::new());
        let mut response = vec![0u8; MAX_RESPONSE_BYTES];

        let reply = hal.talk(HSM_MAILBOX_ADDRESS, WRITE_SLOT_15.as_bytes(), &mut response);
        assert_eq!(reply.status, KitStatus::Success);
        assert_eq!(&response[..reply.len], &[0, 0, 0, 0]);
        assert_eq!(hal.hsm().slots().occupied(), 1);

        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[03]s[0F]", &mut response);
        assert_eq!(reply.status, KitStatus::Success);
        let words = le_words(&response[..reply.len]);
        assert_eq!(words[..2], [0, 24]);
        assert_eq!(words[2..], VsMetaData::raw(24).to_words());

        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[01]s[0F]", &mut response);
        assert_eq!(reply.status, KitStatus::Success);
        assert_eq!(reply.len, 8 + 16 + 24);
        assert_eq!(le_words(&response[..8]), [0, 40]);
        assert_eq!(
            le_words(&response[8..24]),
            VsMetaData::raw(24).to_words()
        );
        assert_eq!(&response[24..48], payload().as_slice());

        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[02]s[0F]", &mut response);
        assert_eq!(reply.status, KitStatus::Success);
        assert_eq!(hal.hsm().slots().occupied(), 0);

        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[01]s[0F]", &mut response);
        assert_eq!(reply.status, KitStatus::ExecutionError);
        assert_eq!(
            le_words(&response[..reply.len]),
            [CmdResultCode::E_VSEMPTY.0, 0]
        );
    }

    #[test]
    fn test_write_occupied_slot() {
        let mut hal = booted_hal(KitConfig::new());
        let mut response = vec![0u8; MAX_RESPONSE_BYTES];

        hal.talk(HSM_MAILBOX_ADDRESS, WRITE_SLOT_15.as_bytes(), &mut response);
        let reply = hal.talk(HSM_MAILBOX_ADDRESS, WRITE_SLOT_15.as_bytes(), &mut response);
        assert_eq!(reply.status, KitStatus::ExecutionError);
        assert_eq!(
            le_words(&response[..reply.len]),
            [CmdResultCode::E_VSOCCUPIED.0]
        );
    }

    #[test]
    fn test_write_without_payload_rejected() {
        let mut hal = booted_hal(KitConfig::new());
        let mut response = vec![0u8; MAX_RESPONSE_BYTES];

        hal.talk(HSM_MAILBOX_ADDRESS, WRITE_SLOT_15.as_bytes(), &mut response);
        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[00]s[10]l[00000006]", &mut response);
        assert_eq!(reply.status, KitStatus::ParseError);
        assert_eq!(hal.hsm().slots().occupied(), 1);
        assert!(hal.hsm().slots().get(0x10).is_err());
    }

    #[test]
    fn test_short_write_never_reaches_hsm() {
        let mut hal = booted_hal(KitConfig::new());
        let mut response = vec![0u8; MAX_RESPONSE_BYTES];
        let before = hal.hsm().command_count();

        let reply = hal.talk(
            HSM_MAILBOX_ADDRESS,
            b"g[56]c[00]s[0F]l[05]d[0000000011111111222222223333333344444444]",
            &mut response,
        );
        assert_eq!(reply.status, KitStatus::InvalidParam);
        assert_eq!(reply.len, 0);
        assert_eq!(hal.hsm().command_count(), before);
    }

    #[test]
    fn test_reserved_slot_policy() {
        let write_slot_0 = WRITE_SLOT_15.replace("s[0F]", "s[00]");
        let mut response = vec![0u8; MAX_RESPONSE_BYTES];

        let mut hal = booted_hal(KitConfig::new());
        let reply = hal.talk(HSM_MAILBOX_ADDRESS, write_slot_0.as_bytes(), &mut response);
        assert_eq!(reply.status, KitStatus::InvalidParam);
        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[02]s[FF]", &mut response);
        assert_eq!(reply.status, KitStatus::InvalidParam);
        assert_eq!(hal.hsm().command_count(), 0);

        // With the policy off the HSM itself refuses the reserved slot.
        let mut hal = booted_hal(KitConfig::new().with_reject_reserved_slots(false));
        let reply = hal.talk(HSM_MAILBOX_ADDRESS, write_slot_0.as_bytes(), &mut response);
        assert_eq!(reply.status, KitStatus::ExecutionError);
        assert_eq!(
            le_words(&response[..reply.len]),
            [CmdResultCode::E_INVPARAM.0]
        );
    }

    #[test]
    fn test_invalid_and_malformed_commands() {
        let mut hal = booted_hal(KitConfig::new());
        let mut response = vec![0xAAu8; MAX_RESPONSE_BYTES];

        let not_valid: [&[u8]; 3] = [b"g[56]c[0F]", b"g[01]c[00]", b""];
        for command in not_valid {
            let reply = hal.talk(HSM_MAILBOX_ADDRESS, command, &mut response);
            assert_eq!(reply.status, KitStatus::CommandNotValid);
            assert_eq!(reply.len, 0);
        }

        let malformed: [&[u8]; 7] = [
            b"g[56]c[",
            b"g[56]c[03]s[ZZ]",
            b"g[56]c[0003]s[0F]",
            b"g[56]c[00]s[0F]l[06]d[0001]",
            b"g[56]c[00]s[0F]d[00010203]",
            b"g[56]c[00]s[10]l[00000006]",
            b"g[56]c[00]s[11]l[01]d[AABBCCDD]l[00000006]",
        ];
        for command in malformed {
            let reply = hal.talk(HSM_MAILBOX_ADDRESS, command, &mut response);
            assert_eq!(reply.status, KitStatus::ParseError);
            assert_eq!(reply.len, 0);
        }
        assert!(response.iter().all(|&byte| byte == 0xAA));
    }

    #[test]
    fn test_hsm_not_ready() {
        let mut hal = new_hal(EmulatorConfig::default(), KitConfig::new());
        let mut response = vec![0u8; MAX_RESPONSE_BYTES];

        let reply = hal.talk(HSM_MAILBOX_ADDRESS, b"g[56]c[03]s[0F]", &mut response);
        assert_eq!(reply.status, KitStatus::CommFail);
        assert_eq!(hal.hsm().command_count(), 0);
    }
}
