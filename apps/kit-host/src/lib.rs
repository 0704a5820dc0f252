// Licensed under the Apache-2.0 license

//! Host driver for the Kit Protocol HSM bridge.

pub mod config;
pub mod host;

pub use config::HostConfig;
pub use host::{boot_hsm, KitHost};
