// Licensed under the Apache-2.0 license

//! Kit Protocol command bridge for the HSM mailbox
//!
//! Host tooling sends textual `K[V]` commands over USB HID. This crate
//! reassembles them, parses them, routes them to the HSM Virtual Slot
//! Manager and builds the binary responses sent back to the host.

#![cfg_attr(target_os = "none", no_std)]

pub mod boot;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod framing;
pub mod hal;
pub mod hsm;
pub mod hsm_hal;
pub mod parser;

pub use boot::{BootSequencer, BootState};
pub use command::{CommandContext, CommandHeader, CommandResponse, ParsedCommand};
pub use config::KitConfig;
pub use dispatch::Dispatcher;
pub use error::{FrameError, ParseError, ParseResult};
pub use framing::FrameAccumulator;
pub use hal::{DeviceInfo, DeviceList, HalRegistry, InterfaceId, KitHal, Reply};
pub use hsm::{HsmDevice, HsmResponse, VsInput};
pub use hsm_hal::HsmMailboxHal;
pub use parser::write_command;
