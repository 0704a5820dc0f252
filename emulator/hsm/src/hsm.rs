// Licensed under the Apache-2.0 license

//! Emulated HSM co-processor
//!
//! The status register advances on every read, the way firmware observes a
//! real HSM booting while it polls:
//!
//! ```text
//! Reset -> Booting(n) -> Operational                      (non-secure)
//! Reset -> Booting(n) -> AwaitingFirmware
//!       -- load --> Authenticating(n) -> Operational      (secure)
//!       -- load, no image --> SafeMode
//! ```

use std::cell::Cell;

use crate::config::EmulatorConfig;
use crate::slots::SlotStore;
use hsm_mbox_common::{
    CmdResultCode, ErrorCode, HsmStatusReg, LifecycleState, ProcessingState, SecureBootState,
    VsMetaData,
};
use kit_protocol::hsm::{
    HsmDevice, HsmResponse, VsInput, ERASED_FLASH_WORD, FIRMWARE_HEADER_WORDS,
};
use log::{debug, info, warn};

/// Header of the image placed in emulated host flash.
pub const FIRMWARE_IMAGE_HEADER: [u32; FIRMWARE_HEADER_WORDS] =
    [0x4B49_5446, 0x0001_0000, 0x0002_0000, 0x0000_0000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reset,
    Booting(u32),
    AwaitingFirmware,
    Authenticating(u32),
    Operational,
    SafeMode,
}

pub struct EmulatedHsm {
    config: EmulatorConfig,
    phase: Cell<Phase>,
    error_code: ErrorCode,
    self_test_ran: bool,
    slots: SlotStore,
    commands: u32,
}

impl EmulatedHsm {
    pub fn new(config: EmulatorConfig) -> Self {
        Self {
            config,
            phase: Cell::new(Phase::Reset),
            error_code: ErrorCode::None,
            self_test_ran: false,
            slots: SlotStore::new(),
            commands: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Mailbox commands received so far.
    pub fn command_count(&self) -> u32 {
        self.commands
    }

    pub fn self_test_ran(&self) -> bool {
        self.self_test_ran
    }

    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    fn advance(&self) {
        let next = match self.phase.get() {
            Phase::Reset => Phase::Booting(self.config.boot_latency_polls),
            Phase::Booting(0) if self.config.secure_boot => Phase::AwaitingFirmware,
            Phase::Booting(0) | Phase::Authenticating(0) => Phase::Operational,
            Phase::Booting(n) => Phase::Booting(n - 1),
            Phase::Authenticating(n) => Phase::Authenticating(n - 1),
            other => other,
        };
        if next != self.phase.get() {
            debug!("Emulated HSM phase {:?} -> {:?}", self.phase.get(), next);
        }
        self.phase.set(next);
    }

    fn register(&self) -> HsmStatusReg {
        let (busy, ps, sbs) = match self.phase.get() {
            Phase::Reset => (true, ProcessingState::Reset, SecureBootState::Reset),
            Phase::Booting(_) => (true, ProcessingState::Boot, SecureBootState::Reset),
            Phase::AwaitingFirmware => (false, ProcessingState::Boot, SecureBootState::BootFlashAuth),
            Phase::Authenticating(_) => (true, ProcessingState::Boot, SecureBootState::BootFlashAuth),
            Phase::Operational if self.config.secure_boot => {
                (false, ProcessingState::Operational, SecureBootState::Passed)
            }
            Phase::Operational => (false, ProcessingState::Operational, SecureBootState::Disabled),
            Phase::SafeMode => (false, ProcessingState::SafeMode, SecureBootState::Failed),
        };
        let lcs = if self.config.secure_boot {
            LifecycleState::Secured
        } else {
            LifecycleState::Open
        };

        let mut reg = HsmStatusReg(0);
        reg.set_busy(busy);
        reg.set_ecode(self.error_code.tag());
        reg.set_sbs(sbs.tag());
        reg.set_lcs(lcs.tag());
        reg.set_ps(ps.tag());
        reg
    }

    fn vsm_gate(&mut self) -> Result<(), CmdResultCode> {
        self.commands += 1;
        if self.phase.get() == Phase::Operational {
            Ok(())
        } else {
            Err(CmdResultCode::E_NOTREADY)
        }
    }
}

impl HsmDevice for EmulatedHsm {
    fn status_register(&self) -> u32 {
        self.advance();
        self.register().0
    }

    fn firmware_header(&self) -> [u32; FIRMWARE_HEADER_WORDS] {
        if self.config.firmware_present {
            FIRMWARE_IMAGE_HEADER
        } else {
            [ERASED_FLASH_WORD; FIRMWARE_HEADER_WORDS]
        }
    }

    fn boot_load_firmware(&mut self) -> HsmResponse {
        self.commands += 1;
        match self.phase.get() {
            Phase::Reset | Phase::Booting(_) | Phase::AwaitingFirmware => {}
            _ => return HsmResponse::new(CmdResultCode::E_NOTSUPPORTED),
        }

        if !self.config.firmware_present {
            warn!("Emulated HSM: firmware authentication failed");
            self.error_code = ErrorCode::FirmwareAuthFailure;
            self.phase.set(Phase::SafeMode);
            return HsmResponse::new(CmdResultCode::E_AUTHFAILED);
        }

        info!("Emulated HSM: firmware image accepted");
        self.phase
            .set(Phase::Authenticating(self.config.boot_latency_polls));
        HsmResponse::new(CmdResultCode::S_OK)
    }

    fn boot_self_test(&mut self) -> HsmResponse {
        self.commands += 1;
        if self.phase.get() == Phase::SafeMode {
            return HsmResponse::new(CmdResultCode::E_NOTREADY);
        }
        self.self_test_ran = true;
        if self.config.self_test_passes {
            HsmResponse::new(CmdResultCode::S_OK)
        } else {
            self.error_code = ErrorCode::SelfTestFailure;
            HsmResponse::new(CmdResultCode::E_SELFTEST)
        }
    }

    fn vsm_input_data(&mut self, slot: u8, input: &VsInput<'_>) -> HsmResponse {
        let result = self
            .vsm_gate()
            .and_then(|_| self.slots.write(slot, input.meta, input.data));
        match result {
            Ok(()) => HsmResponse::new(CmdResultCode::S_OK),
            Err(code) => HsmResponse::new(code),
        }
    }

    fn vsm_output_data(
        &mut self,
        slot: u8,
        requested_words: usize,
        output: &mut [u32],
    ) -> HsmResponse {
        let result = self
            .vsm_gate()
            .and_then(|_| self.slots.read(slot, requested_words, output));
        match result {
            Ok(words) => HsmResponse::with_words(CmdResultCode::S_OK, &[words as u32]),
            Err(code) => HsmResponse::new(code),
        }
    }

    fn vsm_delete_slot(&mut self, slot: u8) -> HsmResponse {
        let result = self.vsm_gate().and_then(|_| self.slots.delete(slot));
        match result {
            Ok(()) => HsmResponse::new(CmdResultCode::S_OK),
            Err(code) => HsmResponse::new(code),
        }
    }

    fn vsm_get_slot_info(&mut self, slot: u8, meta: &mut VsMetaData) -> HsmResponse {
        if let Err(code) = self.vsm_gate() {
            return HsmResponse::new(code);
        }
        match self.slots.get(slot) {
            Ok(stored) => {
                *meta = stored.meta;
                HsmResponse::with_words(CmdResultCode::S_OK, &[stored.size_bytes()])
            }
            Err(code) => HsmResponse::new(code),
        }
    }
}
