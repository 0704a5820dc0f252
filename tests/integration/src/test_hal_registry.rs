// Licensed under the Apache-2.0 license

//! Host sessions over the backend registry, including HID framing of
//! messages longer than one report.

#[cfg(test)]
pub mod test {
    use crate::test::{booted_hal, le_words};
    use hsm_mbox_common::{CommandGroup, KitStatus, VsmCommand};
    use kit_host::KitHost;
    use kit_protocol::hal::DeviceList;
    use kit_protocol::{
        write_command, CommandHeader, HalRegistry, InterfaceId, KitConfig, KitHal, Reply,
    };

    /// I2C backend with nothing attached.
    #[derive(Default)]
    struct EmptyI2c {
        inits: u32,
        deinits: u32,
    }

    impl KitHal for EmptyI2c {
        fn interface(&self) -> InterfaceId {
            InterfaceId::I2c
        }

        fn init(&mut self) {
            self.inits += 1;
        }

        fn deinit(&mut self) {
            self.deinits += 1;
        }

        fn discover(&mut self, _devices: &mut DeviceList) {}

        fn wake(&mut self, _address: u32) -> KitStatus {
            KitStatus::CommFail
        }

        fn idle(&mut self, _address: u32) -> KitStatus {
            KitStatus::CommFail
        }

        fn sleep(&mut self, _address: u32) -> KitStatus {
            KitStatus::CommFail
        }

        fn talk(&mut self, _address: u32, _command: &[u8], _response: &mut [u8]) -> Reply {
            Reply::status_only(KitStatus::CommFail)
        }

        fn send(&mut self, _address: u32, _data: &[u8]) -> KitStatus {
            KitStatus::CommFail
        }

        fn receive(&mut self, _address: u32, _buffer: &mut [u8]) -> Reply {
            Reply::status_only(KitStatus::CommFail)
        }
    }

    #[test]
    fn test_host_selects_hsm_mailbox() {
        let mut i2c = EmptyI2c::default();
        let mut hal = booted_hal(KitConfig::new());
        {
            let mut registry = HalRegistry::new();
            registry.register(&mut i2c).unwrap();
            registry.register(&mut *hal).unwrap();
            let mut host = KitHost::new(registry, b'\n').unwrap();
            let expected = format!("F4 09000080{}", "0".repeat(40));
            assert_eq!(host.process_line("g[56]c[03]s[10]").unwrap(), expected);
        }
        assert_eq!(i2c.inits, 1);
        assert_eq!(i2c.deinits, 0);
    }

    #[test]
    fn test_long_message_spans_reports() {
        let mut hal = booted_hal(KitConfig::new());
        let mut registry = HalRegistry::new();
        registry.register(&mut *hal).unwrap();
        let mut host = KitHost::new(registry, b';').unwrap();

        let header = CommandHeader {
            group: CommandGroup::Vsm,
            command: VsmCommand::InputData.into(),
            slot_number: 0x20,
            data_word_count: 64,
        };
        let data: Vec<u8> = (0..=255u8).collect();
        let mut line = String::new();
        write_command(&mut line, &header, &data).unwrap();
        assert!(line.len() > 8 * 63);

        assert_eq!(host.process_line(&line).unwrap(), "00 00000000");

        let reply = host.transact(b"g[56]c[01]s[20]").unwrap();
        assert_eq!(reply.status, KitStatus::Success);
        let response = host.response(&reply);
        assert_eq!(le_words(&response[..8]), [0, (16 + 256) as u32]);
        assert_eq!(&response[24..], data.as_slice());
    }
}
