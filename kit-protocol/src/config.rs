// Licensed under the Apache-2.0 license

//! Kit Protocol configuration

/// Capacity of the input and output DMA word buffers.
pub const MAX_DATA_WORDS: usize = 2048;

/// Result code plus payload length.
pub const RESPONSE_HEADER_BYTES: usize = 8;

pub const MAX_RESPONSE_BYTES: usize = RESPONSE_HEADER_BYTES + MAX_DATA_WORDS * 4;

/// Longest accepted Kit Protocol message: the token overhead plus a full
/// hex-encoded data buffer.
pub const MAX_MESSAGE_LEN: usize = 64 + MAX_DATA_WORDS * 8;

/// Size of one USB HID report.
pub const HID_REPORT_SIZE: usize = 64;

pub const MAX_DISCOVER_DEVICES: usize = 8;

pub const DEFAULT_MESSAGE_DELIMITER: u8 = b'\n';

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitConfig {
    /// Load firmware and run the boot self test before declaring the HSM ready.
    pub secure_boot: bool,
    /// Refuse writes and deletes addressed to slot 0 or 255.
    pub reject_reserved_slots: bool,
    /// Byte terminating a Kit Protocol message on the transport.
    pub message_delimiter: u8,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            secure_boot: cfg!(feature = "secure-boot"),
            reject_reserved_slots: true,
            message_delimiter: DEFAULT_MESSAGE_DELIMITER,
        }
    }
}

impl KitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secure_boot(mut self, secure_boot: bool) -> Self {
        self.secure_boot = secure_boot;
        self
    }

    pub fn with_reject_reserved_slots(mut self, reject: bool) -> Self {
        self.reject_reserved_slots = reject;
        self
    }

    pub fn with_message_delimiter(mut self, delimiter: u8) -> Self {
        self.message_delimiter = delimiter;
        self
    }
}
