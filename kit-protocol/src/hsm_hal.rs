// Licensed under the Apache-2.0 license

//! HSM mailbox backend for the kit HAL.
//!
//! `talk` carries a Kit Protocol command string in and the binary command
//! response out. The mailbox is synchronous, so `send`/`receive` are not
//! supported and the discovered device is marked no-poll.

use crate::boot::{BootSequencer, BootState};
use crate::command::{CommandContext, CommandResponse};
use crate::config::KitConfig;
use crate::dispatch::Dispatcher;
use crate::error::ParseResult;
use crate::hal::{DeviceInfo, DeviceList, DeviceType, ExtHeader, InterfaceId, KitHal, Reply};
use crate::hsm::HsmDevice;
use hsm_mbox_common::KitStatus;
use log::{debug, info, warn};

/// Address reported for the mailbox device.
pub const HSM_MAILBOX_ADDRESS: u32 = 0x00;

pub struct HsmMailboxHal<H: HsmDevice> {
    hsm: H,
    context: CommandContext,
    dispatcher: Dispatcher,
    boot: BootSequencer,
}

impl<H: HsmDevice> HsmMailboxHal<H> {
    pub fn new(hsm: H, config: KitConfig) -> Self {
        Self {
            hsm,
            context: CommandContext::new(),
            boot: BootSequencer::new(&config),
            dispatcher: Dispatcher::new(config),
        }
    }

    pub fn hsm(&self) -> &H {
        &self.hsm
    }

    pub fn hsm_mut(&mut self) -> &mut H {
        &mut self.hsm
    }

    pub fn boot_sequencer(&self) -> &BootSequencer {
        &self.boot
    }

    /// Advance the boot sequence by one step.
    pub fn poll_boot(&mut self) -> BootState {
        self.boot.poll(&mut self.hsm)
    }

    /// `Success` when the HSM is idle and operational, `CommFail` otherwise.
    pub fn check_ready(&self) -> KitStatus {
        if self.hsm.status().is_ready() {
            KitStatus::Success
        } else {
            KitStatus::CommFail
        }
    }

    /// Parse and dispatch one command without the readiness gate.
    pub fn execute(&mut self, command: &[u8]) -> ParseResult<CommandResponse<'_>> {
        let cmd = self.context.parse(command)?;
        Ok(self.dispatcher.dispatch(&mut self.hsm, cmd))
    }
}

impl<H: HsmDevice> KitHal for HsmMailboxHal<H> {
    fn interface(&self) -> InterfaceId {
        InterfaceId::HsmMailbox
    }

    fn init(&mut self) {
        self.context.prime_buffers();
    }

    fn deinit(&mut self) {}

    fn discover(&mut self, devices: &mut DeviceList) {
        if self.check_ready() != KitStatus::Success {
            debug!("HSM not ready, skipping mailbox discovery");
            return;
        }
        let device = DeviceInfo {
            address: HSM_MAILBOX_ADDRESS,
            bus_type: InterfaceId::HsmMailbox,
            header: ExtHeader::HsmMailbox,
            device_type: DeviceType::Hsm,
            no_poll: true,
        };
        if devices.try_push(device).is_err() {
            warn!("Device list full, HSM mailbox not recorded");
        }
    }

    fn wake(&mut self, _address: u32) -> KitStatus {
        KitStatus::Success
    }

    fn idle(&mut self, _address: u32) -> KitStatus {
        KitStatus::Success
    }

    fn sleep(&mut self, _address: u32) -> KitStatus {
        KitStatus::Success
    }

    fn talk(&mut self, _address: u32, command: &[u8], response: &mut [u8]) -> Reply {
        info!("HSM Device TALK(CMD) {} bytes", command.len());

        if !self.boot.is_ready() || self.check_ready() != KitStatus::Success {
            warn!("HSM not ready for commands");
            return Reply::status_only(KitStatus::CommFail);
        }

        let rsp = match self.execute(command) {
            Ok(rsp) => rsp,
            Err(err) => {
                warn!("{}", err);
                return Reply::status_only(KitStatus::ParseError);
            }
        };

        let bytes = rsp.as_bytes();
        match response.get_mut(..bytes.len()) {
            Some(dest) => {
                dest.copy_from_slice(bytes);
                Reply {
                    status: rsp.status,
                    len: bytes.len(),
                }
            }
            None => Reply::status_only(KitStatus::BufferTooSmall),
        }
    }

    fn send(&mut self, _address: u32, _data: &[u8]) -> KitStatus {
        KitStatus::CommandNotSupported
    }

    fn receive(&mut self, _address: u32, _buffer: &mut [u8]) -> Reply {
        Reply::status_only(KitStatus::CommandNotSupported)
    }
}
