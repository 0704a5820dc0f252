// Licensed under the Apache-2.0 license

mod test_hal_registry;
mod test_hsm_boot;
mod test_vsm_cmds;

#[cfg(test)]
pub(crate) mod test {
    use emulator_hsm::{EmulatedHsm, EmulatorConfig};
    use kit_host::boot_hsm;
    use kit_protocol::{HsmMailboxHal, KitConfig};
    use log::LevelFilter;
    use simple_logger::SimpleLogger;

    pub const BOOT_POLLS: u32 = 64;

    pub fn init_logging() {
        let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
    }

    pub fn new_hal(
        emulator: EmulatorConfig,
        kit: KitConfig,
    ) -> Box<HsmMailboxHal<EmulatedHsm>> {
        init_logging();
        Box::new(HsmMailboxHal::new(EmulatedHsm::new(emulator), kit))
    }

    /// Non-secure HSM that has finished booting.
    pub fn booted_hal(kit: KitConfig) -> Box<HsmMailboxHal<EmulatedHsm>> {
        let mut hal = new_hal(
            EmulatorConfig::default().with_boot_latency_polls(1),
            kit.with_secure_boot(false),
        );
        boot_hsm(&mut hal, BOOT_POLLS).unwrap();
        hal
    }

    pub fn le_words(bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}
