// Licensed under the Apache-2.0 license

//! HSM boot sequencing
//!
//! ```text
//! Reset -> LoadingFirmware -> SelfTest -> AwaitingOperational -> Ready
//!   \__________(non-secure)___^
//! ```
//!
//! Each call to [`BootSequencer::poll`] performs at most one transition so
//! the sequencer can be driven from a supervisory loop. No timeout is applied
//! here; a hung HSM is the supervisor's watchdog concern.

use crate::config::KitConfig;
use crate::hsm::{HsmDevice, ERASED_FLASH_WORD};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Reset,
    LoadingFirmware,
    SelfTest,
    AwaitingOperational,
    Ready,
}

pub struct BootSequencer {
    state: BootState,
    secure_boot: bool,
    boot_failed: bool,
    status_polls: u32,
}

impl BootSequencer {
    pub fn new(config: &KitConfig) -> Self {
        Self {
            state: BootState::Reset,
            secure_boot: config.secure_boot,
            boot_failed: false,
            status_polls: 0,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == BootState::Ready
    }

    /// Set when the boot self test reported a failure.
    ///
    /// Diagnostic only: the HSM still transitions to Ready once it reports
    /// operational.
    pub fn boot_failed(&self) -> bool {
        self.boot_failed
    }

    /// Status register reads spent waiting for the operational state.
    pub fn status_polls(&self) -> u32 {
        self.status_polls
    }

    /// Advance by at most one state.
    pub fn poll(&mut self, hsm: &mut dyn HsmDevice) -> BootState {
        self.state = match self.state {
            BootState::Reset => {
                let raw = hsm.status_register();
                info!("Initial HSM Status: {:#010x}", raw);
                info!("    {}", hsm.status());
                if self.secure_boot {
                    BootState::LoadingFirmware
                } else {
                    BootState::SelfTest
                }
            }
            BootState::LoadingFirmware => {
                self.load_firmware(hsm);
                BootState::SelfTest
            }
            BootState::SelfTest => {
                self.self_test(hsm);
                info!("Waiting for HSM to become OPERATIONAL");
                BootState::AwaitingOperational
            }
            BootState::AwaitingOperational => {
                self.status_polls = self.status_polls.saturating_add(1);
                let status = hsm.status();
                if status.is_ready() {
                    info!("HSM is OPERATIONAL: {}", status);
                    BootState::Ready
                } else {
                    BootState::AwaitingOperational
                }
            }
            BootState::Ready => BootState::Ready,
        };
        self.state
    }

    /// Busy-wait until the HSM is ready.
    pub fn run_until_ready(&mut self, hsm: &mut dyn HsmDevice) {
        while self.poll(hsm) != BootState::Ready {
            core::hint::spin_loop();
        }
    }

    fn load_firmware(&mut self, hsm: &mut dyn HsmDevice) {
        let header = hsm.firmware_header();
        info!(
            "HSM Firmware Header: {:08x} {:08x} {:08x} {:08x}",
            header[0], header[1], header[2], header[3]
        );
        if header[0] == ERASED_FLASH_WORD {
            warn!("HSM firmware not present in flash");
        }

        info!("Loading HSM firmware");
        let rsp = hsm.boot_load_firmware();
        if rsp.result_code.is_ok() {
            info!("HSM firmware loaded");
        } else {
            error!("HSM firmware load failed: {}", rsp.result_code);
        }
    }

    fn self_test(&mut self, hsm: &mut dyn HsmDevice) {
        if !self.secure_boot {
            return;
        }
        let rsp = hsm.boot_self_test();
        if rsp.result_code.is_ok() {
            info!("HSM ROM Test PASS: CMD_BOOT_SELF_TEST");
        } else {
            error!(
                "HSM ROM Test FAIL: CMD_BOOT_SELF_TEST - {}",
                rsp.result_code
            );
            self.boot_failed = true;
        }
    }
}
