// Licensed under the Apache-2.0 license

//! HSM_STATUS register decode.
//!
//! Layout (read-only from the host side):
//! - Bit  0     - BUSY
//! - Bits 19:16 - ECODE, error code
//! - Bits 14:12 - SBS, secure boot state
//! - Bits 10:8  - LCS, lifecycle state
//! - Bits 6:4   - PS, processing state
//!
//! Every 32-bit value decodes. Encodings the hardware does not assign come
//! back as `Reserved(tag)` so callers can log them and refuse to act on them.

use bitfield::bitfield;
use core::fmt;
use num_enum::FromPrimitive;

bitfield! {
    /// Raw HSM_STATUS register value.
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct HsmStatusReg(u32);
    impl Debug;
    pub busy, set_busy: 0;
    pub u8, ecode, set_ecode: 19, 16;
    pub u8, sbs, set_sbs: 14, 12;
    pub u8, lcs, set_lcs: 10, 8;
    pub u8, ps, set_ps: 6, 4;
}

macro_rules! status_field {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)*
            /// Encoding not assigned by the hardware.
            #[num_enum(catch_all)]
            Reserved(u8),
        }

        impl $name {
            /// Numeric tag as read from the register.
            pub fn tag(self) -> u8 {
                match self {
                    $(Self::$variant => $value,)*
                    Self::Reserved(tag) => tag,
                }
            }

            /// Short name used in status log lines.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                    Self::Reserved(_) => "Reserved",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Self::Reserved(tag) => write!(f, "Reserved({})", tag),
                    other => f.write_str(other.name()),
                }
            }
        }
    };
}

status_field! {
    /// ECODE[19:16]
    ErrorCode {
        None = 0 => "No error",
        SelfTestFailure = 1 => "Self test failure",
        SecureFlashIntegrity = 2 => "Secure flash integrity error",
        UncorrectableMemory = 3 => "Uncorrectable local memory bit error",
        UnrecoverableFault = 4 => "Unrecoverable fault",
        SafeModeTamper = 5 => "Safe mode tamper event",
        HostSafeMode = 6 => "Host safe mode command",
        FirmwareAuthFailure = 7 => "HSM firmware authentication failure",
    }
}

status_field! {
    /// SBS[14:12]
    SecureBootState {
        Reset = 0 => "Reset",
        Disabled = 1 => "Disabled",
        BootFlashAuth = 2 => "Boot Flash Authentication",
        AdditionalAuth = 3 => "Additional Authentication",
        Failed = 4 => "Failed",
        Passed = 5 => "Passed",
    }
}

status_field! {
    /// LCS[10:8]
    LifecycleState {
        Reset = 0 => "Reset",
        IcManufacturing = 1 => "IC Manufacturing",
        Erased = 2 => "Erased",
        Open = 3 => "Open",
        Secured = 4 => "Secured",
    }
}

status_field! {
    /// PS[6:4]
    ProcessingState {
        Reset = 0 => "Reset",
        Boot = 1 => "Boot",
        Operational = 2 => "Operational",
        SafeMode = 3 => "Safe Mode",
    }
}

/// One decoded read of HSM_STATUS.
///
/// Never cached: the fields legitimately change between consecutive reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsmStatus {
    pub busy: bool,
    pub error_code: ErrorCode,
    pub secure_boot_state: SecureBootState,
    pub lifecycle_state: LifecycleState,
    pub processing_state: ProcessingState,
}

impl HsmStatus {
    pub fn decode(raw: u32) -> Self {
        let reg = HsmStatusReg(raw);
        Self {
            busy: reg.busy(),
            error_code: ErrorCode::from_primitive(reg.ecode()),
            secure_boot_state: SecureBootState::from_primitive(reg.sbs()),
            lifecycle_state: LifecycleState::from_primitive(reg.lcs()),
            processing_state: ProcessingState::from_primitive(reg.ps()),
        }
    }

    pub fn is_operational(&self) -> bool {
        self.processing_state == ProcessingState::Operational
    }

    /// Operational and not busy; the only state in which mailbox commands may be issued.
    pub fn is_ready(&self) -> bool {
        self.is_operational() && !self.busy
    }
}

impl From<u32> for HsmStatus {
    fn from(raw: u32) -> Self {
        Self::decode(raw)
    }
}

impl fmt::Display for HsmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  ECODE: {}  SBS: {}  LCS: {}  PS: {}",
            if self.busy { "BUSY" } else { "NOT busy" },
            self.error_code,
            self.secure_boot_state,
            self.lifecycle_state,
            self.processing_state
        )
    }
}
