// Licensed under the Apache-2.0 license

use serde::Deserialize;

/// Behavior of the emulated HSM.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorConfig {
    /// Hold the HSM in boot until the firmware load command arrives.
    pub secure_boot: bool,
    /// Whether host flash holds an HSM firmware image.
    pub firmware_present: bool,
    /// Status reads reported busy before each boot stage completes.
    pub boot_latency_polls: u32,
    pub self_test_passes: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            secure_boot: false,
            firmware_present: true,
            boot_latency_polls: 3,
            self_test_passes: true,
        }
    }
}

impl EmulatorConfig {
    pub fn with_secure_boot(mut self, secure_boot: bool) -> Self {
        self.secure_boot = secure_boot;
        self
    }

    pub fn with_firmware_present(mut self, present: bool) -> Self {
        self.firmware_present = present;
        self
    }

    pub fn with_boot_latency_polls(mut self, polls: u32) -> Self {
        self.boot_latency_polls = polls;
        self
    }

    pub fn with_self_test_passes(mut self, passes: bool) -> Self {
        self.self_test_passes = passes;
        self
    }
}
