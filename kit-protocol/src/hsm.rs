// Licensed under the Apache-2.0 license

//! HSM mailbox command primitive
//!
//! The co-processor is opaque: every mailbox command is one synchronous call
//! that returns when the HSM has written its response. Implementations drive
//! the real mailbox registers on hardware, or a software model on the host.

use hsm_mbox_common::{CmdResultCode, HsmStatus, VsMetaData};

/// Result words carried back in a mailbox response.
pub const MAX_RESULT_WORDS: usize = 4;

/// Words of firmware image header inspected before loading.
pub const FIRMWARE_HEADER_WORDS: usize = 4;

/// Value of an erased flash word.
pub const ERASED_FLASH_WORD: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsmResponse {
    pub result_code: CmdResultCode,
    pub num_result_words: usize,
    pub result_words: [u32; MAX_RESULT_WORDS],
}

impl HsmResponse {
    pub fn new(result_code: CmdResultCode) -> Self {
        Self {
            result_code,
            num_result_words: 0,
            result_words: [0; MAX_RESULT_WORDS],
        }
    }

    pub fn with_words(result_code: CmdResultCode, words: &[u32]) -> Self {
        let mut rsp = Self::new(result_code);
        let len = core::cmp::min(words.len(), MAX_RESULT_WORDS);
        rsp.result_words[..len].copy_from_slice(&words[..len]);
        rsp.num_result_words = len;
        rsp
    }

    pub fn result_words(&self) -> &[u32] {
        &self.result_words[..self.num_result_words]
    }
}

/// Unencrypted VSM_INPUT_DATA request.
#[derive(Debug, Clone, Copy)]
pub struct VsInput<'a> {
    pub meta: VsMetaData,
    pub data: &'a [u32],
}

/// Trait for the HSM mailbox
pub trait HsmDevice {
    /// Fresh read of the HSM_STATUS register.
    fn status_register(&self) -> u32;

    fn status(&self) -> HsmStatus {
        HsmStatus::decode(self.status_register())
    }

    /// First words of the firmware image header held in host flash.
    fn firmware_header(&self) -> [u32; FIRMWARE_HEADER_WORDS];

    /// CMD_BOOT_LOAD_FIRMWARE
    fn boot_load_firmware(&mut self) -> HsmResponse;

    /// CMD_BOOT_SELF_TEST
    fn boot_self_test(&mut self) -> HsmResponse;

    /// Write `input` to `slot`.
    fn vsm_input_data(&mut self, slot: u8, input: &VsInput<'_>) -> HsmResponse;

    /// Read up to `requested_words` words of `slot` into `output`.
    /// On success result word 0 holds the number of words written.
    fn vsm_output_data(
        &mut self,
        slot: u8,
        requested_words: usize,
        output: &mut [u32],
    ) -> HsmResponse;

    fn vsm_delete_slot(&mut self, slot: u8) -> HsmResponse;

    /// Fill `meta` for `slot`. When the response carries exactly one result
    /// word it is the slot size in bytes.
    fn vsm_get_slot_info(&mut self, slot: u8, meta: &mut VsMetaData) -> HsmResponse;
}

impl<T: HsmDevice + ?Sized> HsmDevice for &mut T {
    fn status_register(&self) -> u32 {
        (**self).status_register()
    }

    fn firmware_header(&self) -> [u32; FIRMWARE_HEADER_WORDS] {
        (**self).firmware_header()
    }

    fn boot_load_firmware(&mut self) -> HsmResponse {
        (**self).boot_load_firmware()
    }

    fn boot_self_test(&mut self) -> HsmResponse {
        (**self).boot_self_test()
    }

    fn vsm_input_data(&mut self, slot: u8, input: &VsInput<'_>) -> HsmResponse {
        (**self).vsm_input_data(slot, input)
    }

    fn vsm_output_data(
        &mut self,
        slot: u8,
        requested_words: usize,
        output: &mut [u32],
    ) -> HsmResponse {
        (**self).vsm_output_data(slot, requested_words, output)
    }

    fn vsm_delete_slot(&mut self, slot: u8) -> HsmResponse {
        (**self).vsm_delete_slot(slot)
    }

    fn vsm_get_slot_info(&mut self, slot: u8, meta: &mut VsMetaData) -> HsmResponse {
        (**self).vsm_get_slot_info(slot, meta)
    }
}
