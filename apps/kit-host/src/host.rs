// Licensed under the Apache-2.0 license

//! Host side of the kit: boots the HSM, selects the mailbox backend and
//! pushes Kit Protocol lines through HID framing.

use anyhow::{anyhow, bail, Result};
use hsm_mbox_common::KitStatus;
use kit_protocol::config::{HID_REPORT_SIZE, MAX_RESPONSE_BYTES};
use kit_protocol::hsm_hal::HSM_MAILBOX_ADDRESS;
use kit_protocol::{
    BootState, FrameAccumulator, HalRegistry, HsmDevice, HsmMailboxHal, InterfaceId, Reply,
};
use log::{error, info, warn};

/// Drive the boot sequence until the HSM is ready or `max_polls` run out.
pub fn boot_hsm<H: HsmDevice>(hal: &mut HsmMailboxHal<H>, max_polls: u32) -> Result<u32> {
    for poll in 1..=max_polls {
        if hal.poll_boot() == BootState::Ready {
            if hal.boot_sequencer().boot_failed() {
                warn!("HSM is operational but its boot self test failed");
            }
            return Ok(poll);
        }
    }
    let status = hal.hsm().status();
    error!("HSM Status: {}", status);
    bail!(
        "HSM not ready after {} boot polls (state {:?})",
        max_polls,
        hal.boot_sequencer().state()
    )
}

/// Kit Protocol session over a set of registered backends.
pub struct KitHost<'a> {
    registry: HalRegistry<'a>,
    frames: FrameAccumulator,
    delimiter: u8,
    response: Box<[u8; MAX_RESPONSE_BYTES]>,
}

impl<'a> KitHost<'a> {
    /// Discover devices on `registry` and select the HSM mailbox.
    pub fn new(mut registry: HalRegistry<'a>, delimiter: u8) -> Result<Self> {
        let first = registry.discover_all();
        info!("First device bus: {:?}", first);
        if !registry
            .devices()
            .iter()
            .any(|device| device.bus_type == InterfaceId::HsmMailbox)
        {
            bail!("HSM mailbox device not found");
        }
        registry
            .select(InterfaceId::HsmMailbox)
            .map_err(|status| anyhow!("Selecting HSM mailbox failed: {}", status))?;

        Ok(Self {
            registry,
            frames: FrameAccumulator::new(delimiter),
            delimiter,
            response: Box::new([0; MAX_RESPONSE_BYTES]),
        })
    }

    /// Send one Kit Protocol command and return `<status> <response hex>`.
    pub fn process_line(&mut self, line: &str) -> Result<String> {
        let reply = self.transact(line.as_bytes())?;
        Ok(format!(
            "{:02X} {}",
            u8::from(reply.status),
            hex::encode_upper(&self.response[..reply.len])
        ))
    }

    /// Split `message` into HID reports, reassemble it and talk to the HSM.
    pub fn transact(&mut self, message: &[u8]) -> Result<Reply> {
        let mut wire = message.to_vec();
        wire.push(self.delimiter);

        let mut complete = false;
        for chunk in wire.chunks(HID_REPORT_SIZE - 1) {
            let mut report = [0u8; HID_REPORT_SIZE];
            report[..chunk.len()].copy_from_slice(chunk);
            match self.frames.push_report(&report) {
                Ok(done) => complete = done,
                Err(err) => {
                    self.frames.release();
                    bail!("HID framing failed: {}", err);
                }
            }
        }
        if !complete {
            self.frames.release();
            bail!("Message delimiter not seen");
        }

        let reply = match self.frames.message() {
            Some(text) => self
                .registry
                .talk(HSM_MAILBOX_ADDRESS, text, &mut self.response[..]),
            None => Reply::status_only(KitStatus::CommFail),
        };
        self.frames.release();
        Ok(reply)
    }

    pub fn response(&self, reply: &Reply) -> &[u8] {
        &self.response[..reply.len]
    }
}
