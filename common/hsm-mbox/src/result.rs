// Licensed under the Apache-2.0 license

//! Result codes.
//!
//! Two tiers are reported to the host: a coarse [`KitStatus`] for the
//! transport, and the detailed [`CmdResultCode`] produced by the HSM which
//! travels inside the response payload.

use core::fmt;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Result code returned by the HSM for a mailbox command.
///
/// Kept as a newtype so codes this firmware does not know still reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CmdResultCode(pub u32);

impl CmdResultCode {
    pub const S_OK: Self = Self(0x0000_0000);
    pub const E_GENERAL: Self = Self(0x8000_0001);
    pub const E_NOTSUPPORTED: Self = Self(0x8000_0002);
    pub const E_INVPARAM: Self = Self(0x8000_0003);
    pub const E_INVINPUT: Self = Self(0x8000_0004);
    pub const E_OUTPUTTOOSMALL: Self = Self(0x8000_0005);
    pub const E_AUTHFAILED: Self = Self(0x8000_0006);
    pub const E_CHECKSUM: Self = Self(0x8000_0007);
    pub const E_SELFTEST: Self = Self(0x8000_0008);
    pub const E_VSEMPTY: Self = Self(0x8000_0009);
    pub const E_VSOCCUPIED: Self = Self(0x8000_000A);
    pub const E_VSINVALID: Self = Self(0x8000_000B);
    pub const E_NOTREADY: Self = Self(0x8000_000C);

    pub fn is_ok(self) -> bool {
        self == Self::S_OK
    }

    /// Little-endian wire form, as placed at the start of every response.
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::S_OK => "S_OK",
            Self::E_GENERAL => "E_GENERAL",
            Self::E_NOTSUPPORTED => "E_NOTSUPPORTED",
            Self::E_INVPARAM => "E_INVPARAM",
            Self::E_INVINPUT => "E_INVINPUT",
            Self::E_OUTPUTTOOSMALL => "E_OUTPUTTOOSMALL",
            Self::E_AUTHFAILED => "E_AUTHFAILED",
            Self::E_CHECKSUM => "E_CHECKSUM",
            Self::E_SELFTEST => "E_SELFTEST",
            Self::E_VSEMPTY => "E_VSEMPTY",
            Self::E_VSOCCUPIED => "E_VSOCCUPIED",
            Self::E_VSINVALID => "E_VSINVALID",
            Self::E_NOTREADY => "E_NOTREADY",
            _ => return None,
        })
    }
}

impl From<u32> for CmdResultCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<CmdResultCode> for u32 {
    fn from(value: CmdResultCode) -> Self {
        value.0
    }
}

impl fmt::Display for CmdResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

/// Kit Protocol transport status returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum KitStatus {
    Success = 0x00,
    ParseError = 0xD2,
    InvalidParam = 0xE2,
    BufferTooSmall = 0xED,
    CommFail = 0xF0,
    CommandNotValid = 0xF2,
    ExecutionError = 0xF4,
    CommandNotSupported = 0xF5,
}

impl KitStatus {
    pub fn is_success(self) -> bool {
        self == KitStatus::Success
    }
}

impl fmt::Display for KitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            KitStatus::Success => "Success",
            KitStatus::ParseError => "Parse error",
            KitStatus::InvalidParam => "Invalid parameter",
            KitStatus::BufferTooSmall => "Buffer too small",
            KitStatus::CommFail => "Communication failure",
            KitStatus::CommandNotValid => "Command not valid",
            KitStatus::ExecutionError => "Execution error",
            KitStatus::CommandNotSupported => "Command not supported",
        };
        f.write_str(text)
    }
}
