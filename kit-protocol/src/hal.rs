// Licensed under the Apache-2.0 license

//! Kit hardware abstraction layer
//!
//! Each bus the kit can talk over (I2C, SWI, SPI or the HSM mailbox) is a
//! [`KitHal`] backend. A [`HalRegistry`] holds the backends compiled into the
//! firmware, runs device discovery across them and routes traffic to the
//! one currently selected.

use core::fmt;

use crate::config::MAX_DISCOVER_DEVICES;
use arrayvec::ArrayVec;
use hsm_mbox_common::KitStatus;
use log::{info, warn};

/// Backends a registry can hold: one per [`InterfaceId`].
pub const MAX_HAL_BACKENDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceId {
    I2c,
    Swi,
    Spi,
    HsmMailbox,
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterfaceId::I2c => "I2C",
            InterfaceId::Swi => "SWI",
            InterfaceId::Spi => "SPI",
            InterfaceId::HsmMailbox => "HSM_MB",
        })
    }
}

/// Board header a device sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtHeader {
    Ext1,
    Ext2,
    Ext3,
    MikroBus,
    HsmMailbox,
}

impl fmt::Display for ExtHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtHeader::Ext1 => "EXT1",
            ExtHeader::Ext2 => "EXT2",
            ExtHeader::Ext3 => "EXT3",
            ExtHeader::MikroBus => "MICROBUS",
            ExtHeader::HsmMailbox => "HSM_MB",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Unknown,
    Hsm,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceType::Unknown => "UNKNOWN",
            DeviceType::Hsm => "HSM",
        })
    }
}

/// A device found during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub address: u32,
    pub bus_type: InterfaceId,
    pub header: ExtHeader,
    pub device_type: DeviceType,
    /// The device completes commands synchronously and must not be polled.
    pub no_poll: bool,
}

pub type DeviceList = ArrayVec<DeviceInfo, MAX_DISCOVER_DEVICES>;

/// Status and byte count of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub status: KitStatus,
    pub len: usize,
}

impl Reply {
    pub fn status_only(status: KitStatus) -> Self {
        Self { status, len: 0 }
    }
}

/// Trait for a kit bus backend
pub trait KitHal {
    fn interface(&self) -> InterfaceId;

    fn init(&mut self);

    fn deinit(&mut self);

    /// Append the devices present on this bus. Stops quietly when `devices` is full.
    fn discover(&mut self, devices: &mut DeviceList);

    fn wake(&mut self, address: u32) -> KitStatus;

    fn idle(&mut self, address: u32) -> KitStatus;

    fn sleep(&mut self, address: u32) -> KitStatus;

    /// Send `command` and write the device's reply into `response`.
    fn talk(&mut self, address: u32, command: &[u8], response: &mut [u8]) -> Reply;

    fn send(&mut self, address: u32, data: &[u8]) -> KitStatus;

    fn receive(&mut self, address: u32, buffer: &mut [u8]) -> Reply;
}

/// The set of backends available to the kit.
pub struct HalRegistry<'a> {
    backends: ArrayVec<&'a mut dyn KitHal, MAX_HAL_BACKENDS>,
    devices: DeviceList,
    selected: Option<usize>,
}

impl Default for HalRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> HalRegistry<'a> {
    pub fn new() -> Self {
        Self {
            backends: ArrayVec::new(),
            devices: DeviceList::new(),
            selected: None,
        }
    }

    /// Add a backend. Each interface may be registered once.
    pub fn register(&mut self, hal: &'a mut dyn KitHal) -> Result<(), KitStatus> {
        if self.position(hal.interface()).is_some() {
            return Err(KitStatus::InvalidParam);
        }
        self.backends
            .try_push(hal)
            .map_err(|_| KitStatus::BufferTooSmall)
    }

    fn position(&self, interface: InterfaceId) -> Option<usize> {
        self.backends
            .iter()
            .position(|hal| hal.interface() == interface)
    }

    /// Initialize every backend in registration order and collect their
    /// devices. Returns the bus of the first device found.
    pub fn discover_all(&mut self) -> Option<InterfaceId> {
        self.devices.clear();
        for hal in self.backends.iter_mut() {
            hal.init();
            hal.discover(&mut self.devices);
        }

        info!("Total Device Count={}", self.devices.len());
        for (index, device) in self.devices.iter().enumerate() {
            match (device.device_type, device.bus_type) {
                (DeviceType::Unknown, _) => info!("DEVICE {} UNKNOWN", index),
                (_, InterfaceId::I2c) => {
                    info!("I2C {}-{:02X}", device.device_type, device.address)
                }
                (_, bus) => info!("{} {}-{}", bus, device.device_type, device.header),
            }
        }

        self.devices.first().map(|device| device.bus_type)
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Make `interface` the active backend, shutting down the previous one.
    pub fn select(&mut self, interface: InterfaceId) -> Result<(), KitStatus> {
        let index = self.position(interface).ok_or_else(|| {
            warn!("Interface {} not available", interface);
            KitStatus::InvalidParam
        })?;
        if let Some(previous) = self.selected.take() {
            self.backends[previous].deinit();
        }
        self.backends[index].init();
        self.selected = Some(index);
        info!("Selected interface {}", interface);
        Ok(())
    }

    pub fn selected_interface(&self) -> Option<InterfaceId> {
        self.selected.map(|index| self.backends[index].interface())
    }

    pub fn selected(&mut self) -> Option<&mut (dyn KitHal + 'a)> {
        let index = self.selected?;
        Some(&mut *self.backends[index])
    }

    /// Talk to `address` over the selected backend.
    pub fn talk(&mut self, address: u32, command: &[u8], response: &mut [u8]) -> Reply {
        match self.selected() {
            Some(hal) => hal.talk(address, command, response),
            None => {
                warn!("No interface selected");
                Reply::status_only(KitStatus::CommFail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBus {
        interface: InterfaceId,
        device_count: usize,
        events: Vec<&'static str>,
    }

    impl FakeBus {
        fn new(interface: InterfaceId, device_count: usize) -> Self {
            Self {
                interface,
                device_count,
                events: Vec::new(),
            }
        }
    }

    impl KitHal for FakeBus {
        fn interface(&self) -> InterfaceId {
            self.interface
        }

        fn init(&mut self) {
            self.events.push("init");
        }

        fn deinit(&mut self) {
            self.events.push("deinit");
        }

        fn discover(&mut self, devices: &mut DeviceList) {
            for address in 0..self.device_count as u32 {
                let device = DeviceInfo {
                    address: 0x60 + address,
                    bus_type: self.interface,
                    header: ExtHeader::Ext1,
                    device_type: DeviceType::Unknown,
                    no_poll: false,
                };
                if devices.try_push(device).is_err() {
                    return;
                }
            }
        }

        fn wake(&mut self, _: u32) -> KitStatus {
            KitStatus::Success
        }

        fn idle(&mut self, _: u32) -> KitStatus {
            KitStatus::Success
        }

        fn sleep(&mut self, _: u32) -> KitStatus {
            KitStatus::Success
        }

        fn talk(&mut self, _: u32, command: &[u8], response: &mut [u8]) -> Reply {
            self.events.push("talk");
            response[..command.len()].copy_from_slice(command);
            Reply {
                status: KitStatus::Success,
                len: command.len(),
            }
        }

        fn send(&mut self, _: u32, _: &[u8]) -> KitStatus {
            KitStatus::CommandNotSupported
        }

        fn receive(&mut self, _: u32, _: &mut [u8]) -> Reply {
            Reply::status_only(KitStatus::CommandNotSupported)
        }
    }

    #[test]
    fn test_discover_collects_in_order() {
        let mut i2c = FakeBus::new(InterfaceId::I2c, 2);
        let mut spi = FakeBus::new(InterfaceId::Spi, 1);
        let mut registry = HalRegistry::new();
        registry.register(&mut i2c).unwrap();
        registry.register(&mut spi).unwrap();

        assert_eq!(registry.discover_all(), Some(InterfaceId::I2c));
        let buses: Vec<_> = registry.devices().iter().map(|d| d.bus_type).collect();
        assert_eq!(
            buses,
            vec![InterfaceId::I2c, InterfaceId::I2c, InterfaceId::Spi]
        );
        drop(registry);
        assert_eq!(i2c.events, vec!["init"]);
        assert_eq!(spi.events, vec!["init"]);
    }

    #[test]
    fn test_discover_caps_device_list() {
        let mut i2c = FakeBus::new(InterfaceId::I2c, MAX_DISCOVER_DEVICES + 3);
        let mut registry = HalRegistry::new();
        registry.register(&mut i2c).unwrap();
        registry.discover_all();
        assert_eq!(registry.devices().len(), MAX_DISCOVER_DEVICES);
    }

    #[test]
    fn test_discover_nothing() {
        let mut registry = HalRegistry::new();
        assert_eq!(registry.discover_all(), None);
    }

    #[test]
    fn test_duplicate_interface_rejected() {
        let mut first = FakeBus::new(InterfaceId::Swi, 0);
        let mut second = FakeBus::new(InterfaceId::Swi, 0);
        let mut registry = HalRegistry::new();
        registry.register(&mut first).unwrap();
        assert_eq!(
            registry.register(&mut second),
            Err(KitStatus::InvalidParam)
        );
    }

    #[test]
    fn test_select_deinits_previous() {
        let mut i2c = FakeBus::new(InterfaceId::I2c, 0);
        let mut hsm = FakeBus::new(InterfaceId::HsmMailbox, 0);
        let mut registry = HalRegistry::new();
        registry.register(&mut i2c).unwrap();
        registry.register(&mut hsm).unwrap();

        let mut response = [0u8; 8];
        assert_eq!(
            registry.talk(0, b"ping", &mut response).status,
            KitStatus::CommFail
        );

        registry.select(InterfaceId::I2c).unwrap();
        registry.select(InterfaceId::HsmMailbox).unwrap();
        assert_eq!(
            registry.select(InterfaceId::Spi),
            Err(KitStatus::InvalidParam)
        );
        assert_eq!(
            registry.selected_interface(),
            Some(InterfaceId::HsmMailbox)
        );

        let reply = registry.talk(0, b"ping", &mut response);
        assert_eq!(reply.status, KitStatus::Success);
        assert_eq!(&response[..reply.len], b"ping");

        drop(registry);
        assert_eq!(i2c.events, vec!["init", "deinit"]);
        assert_eq!(hsm.events, vec!["init", "talk"]);
    }
}
