// Licensed under the Apache-2.0 license

//! HSM mailbox vocabulary
//!
//! Register layouts, result codes and slot metadata shared by the Kit
//! Protocol firmware and the HSM emulator.

#![cfg_attr(target_os = "none", no_std)]

pub mod result;
pub mod status;
pub mod vsm;

pub use result::{CmdResultCode, KitStatus};
pub use status::{
    ErrorCode, HsmStatus, HsmStatusReg, LifecycleState, ProcessingState, SecureBootState,
};
pub use vsm::{
    is_reserved_slot, CommandGroup, VsHeader, VsMetaData, VsSlotType, VsmCommand, BYTES_PER_WORD,
    VSS_META_WORDS,
};
