// Licensed under the Apache-2.0 license

//! Virtual slot store

use hsm_mbox_common::{
    is_reserved_slot, CmdResultCode, VsMetaData, VsSlotType, BYTES_PER_WORD, VSS_META_WORDS,
};
use kit_protocol::config::MAX_DATA_WORDS;

pub const SLOT_COUNT: usize = 256;

/// Largest payload a slot accepts, so that metadata and payload fit one
/// output transfer.
pub const MAX_SLOT_DATA_WORDS: usize = MAX_DATA_WORDS - VSS_META_WORDS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualSlot {
    pub meta: VsMetaData,
    pub data: Vec<u32>,
}

impl VirtualSlot {
    pub fn size_bytes(&self) -> u32 {
        (self.data.len() * BYTES_PER_WORD) as u32
    }

    /// Words returned by an output transfer: metadata then payload.
    pub fn output_words(&self) -> usize {
        VSS_META_WORDS + self.data.len()
    }
}

pub struct SlotStore {
    slots: Vec<Option<VirtualSlot>>,
}

impl Default for SlotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotStore {
    pub fn new() -> Self {
        Self {
            slots: vec![None; SLOT_COUNT],
        }
    }

    fn usable(slot: u8) -> Result<usize, CmdResultCode> {
        if is_reserved_slot(slot) {
            Err(CmdResultCode::E_INVPARAM)
        } else {
            Ok(slot as usize)
        }
    }

    pub fn get(&self, slot: u8) -> Result<&VirtualSlot, CmdResultCode> {
        let index = Self::usable(slot)?;
        self.slots[index].as_ref().ok_or(CmdResultCode::E_VSEMPTY)
    }

    pub fn write(&mut self, slot: u8, meta: VsMetaData, data: &[u32]) -> Result<(), CmdResultCode> {
        let index = Self::usable(slot)?;
        if self.slots[index].is_some() {
            return Err(CmdResultCode::E_VSOCCUPIED);
        }
        if !meta.vs_header.valid() {
            return Err(CmdResultCode::E_VSINVALID);
        }
        if data.is_empty() || data.len() > MAX_SLOT_DATA_WORDS {
            return Err(CmdResultCode::E_INVINPUT);
        }
        if meta.vs_header.slot_type() == VsSlotType::Raw
            && meta.data_specific as usize != data.len() * BYTES_PER_WORD
        {
            return Err(CmdResultCode::E_INVINPUT);
        }

        self.slots[index] = Some(VirtualSlot {
            meta,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Copy metadata and payload into `output`. Returns the number of words written.
    pub fn read(
        &self,
        slot: u8,
        requested_words: usize,
        output: &mut [u32],
    ) -> Result<usize, CmdResultCode> {
        let stored = self.get(slot)?;
        let words = stored.output_words();
        if requested_words < words || output.len() < words {
            return Err(CmdResultCode::E_OUTPUTTOOSMALL);
        }

        output[..VSS_META_WORDS].copy_from_slice(&stored.meta.to_words());
        output[VSS_META_WORDS..words].copy_from_slice(&stored.data);
        Ok(words)
    }

    pub fn delete(&mut self, slot: u8) -> Result<(), CmdResultCode> {
        let index = Self::usable(slot)?;
        self.slots[index]
            .take()
            .map(|_| ())
            .ok_or(CmdResultCode::E_VSEMPTY)
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
