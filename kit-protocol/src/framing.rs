// Licensed under the Apache-2.0 license

//! Reassembly of Kit Protocol messages from USB HID OUT reports.
//!
//! The host splits a delimiter-terminated message across fixed-size reports.
//! Only the first `HID_REPORT_SIZE - 1` bytes of each report carry message
//! text. Once the delimiter arrives the message is held until the consumer
//! calls [`FrameAccumulator::release`]; reports arriving in between are
//! refused so the pending message cannot be corrupted.
//!
//! A message that overflows the buffer is dropped along with the rest of its
//! text, up to and including its delimiter.

use crate::config::{HID_REPORT_SIZE, MAX_MESSAGE_LEN};
use crate::error::FrameError;
use arrayvec::ArrayVec;
use log::{debug, warn};

pub struct FrameAccumulator {
    buffer: ArrayVec<u8, MAX_MESSAGE_LEN>,
    delimiter: u8,
    message_ready: bool,
    discarding: bool,
}

impl FrameAccumulator {
    pub fn new(delimiter: u8) -> Self {
        Self {
            buffer: ArrayVec::new(),
            delimiter,
            message_ready: false,
            discarding: false,
        }
    }

    /// Append one report. Returns `Ok(true)` when it completed a message.
    pub fn push_report(&mut self, report: &[u8]) -> Result<bool, FrameError> {
        if self.message_ready {
            return Err(FrameError::MessagePending);
        }

        for &byte in report.iter().take(HID_REPORT_SIZE - 1) {
            if self.discarding {
                if byte == self.delimiter {
                    debug!("Tail of oversized Kit message discarded");
                    self.discarding = false;
                    return Ok(false);
                }
                continue;
            }
            if byte == self.delimiter {
                debug!("Kit message received: {} bytes", self.buffer.len());
                self.message_ready = true;
                return Ok(true);
            }
            if self.buffer.try_push(byte).is_err() {
                warn!("Kit message exceeds {} bytes, dropped", MAX_MESSAGE_LEN);
                self.buffer.clear();
                self.discarding = true;
                return Err(FrameError::Overflow);
            }
        }
        Ok(false)
    }

    pub fn is_message_ready(&self) -> bool {
        self.message_ready
    }

    /// The completed message without its delimiter.
    pub fn message(&self) -> Option<&[u8]> {
        self.message_ready.then_some(self.buffer.as_slice())
    }

    /// Bytes buffered so far for the message in progress.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop the current message, or what is left of an oversized one, and
    /// accept the next one.
    pub fn release(&mut self) {
        self.buffer.clear();
        self.message_ready = false;
        self.discarding = false;
    }
}
