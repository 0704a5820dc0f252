// Licensed under the Apache-2.0 license

//! Software model of the HSM co-processor behind the mailbox.

pub mod config;
pub mod hsm;
pub mod slots;

pub use config::EmulatorConfig;
pub use hsm::{EmulatedHsm, Phase, FIRMWARE_IMAGE_HEADER};
pub use slots::{SlotStore, VirtualSlot, MAX_SLOT_DATA_WORDS, SLOT_COUNT};
