// Licensed under the Apache-2.0 license

//! Virtual Slot Management (VSM) command ids and slot metadata.

use bitfield::bitfield;
use num_enum::{FromPrimitive, IntoPrimitive};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const BYTES_PER_WORD: usize = 4;

/// Number of 32-bit words in a slot metadata block.
pub const VSS_META_WORDS: usize = 4;

/// Slot 0 and slot 255 are reserved by the HSM.
pub const RESERVED_SLOTS: [u8; 2] = [0, 255];

pub fn is_reserved_slot(slot: u8) -> bool {
    RESERVED_SLOTS.contains(&slot)
}

/// Mailbox command group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum CommandGroup {
    Boot = 0x42,
    Vsm = 0x56,
    #[num_enum(default)]
    Invalid = 0xFF,
}

/// Commands within [`CommandGroup::Vsm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum VsmCommand {
    InputData = 0x00,
    OutputData = 0x01,
    DeleteSlot = 0x02,
    GetSlotInfo = 0x03,
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl VsmCommand {
    /// Sentinel used when no command token was given.
    pub const INVALID: u8 = 0xFF;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum VsSlotType {
    Raw = 0,
    SymKey = 1,
    AsymKey = 2,
    Hash = 3,
    HashIv = 4,
    #[num_enum(catch_all)]
    Other(u8),
}

impl From<VsSlotType> for u8 {
    fn from(value: VsSlotType) -> Self {
        match value {
            VsSlotType::Raw => 0,
            VsSlotType::SymKey => 1,
            VsSlotType::AsymKey => 2,
            VsSlotType::Hash => 3,
            VsSlotType::HashIv => 4,
            VsSlotType::Other(tag) => tag,
        }
    }
}

bitfield! {
    /// First word of the slot metadata block.
    /// Bits 7:0   - slot type
    /// Bits 15:8  - key type (slot type specific)
    /// Bits 30:16 - reserved
    /// Bit  31    - valid
    #[repr(C)]
    #[derive(Copy, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, PartialEq, Eq, Default)]
    pub struct VsHeader(u32);
    impl Debug;
    pub u8, slot_type_tag, set_slot_type_tag: 7, 0;
    pub u8, key_type, set_key_type: 15, 8;
    pub valid, set_valid: 31;
}

impl VsHeader {
    pub fn new(slot_type: VsSlotType) -> Self {
        let mut header = VsHeader(0);
        header.set_slot_type_tag(slot_type.into());
        header.set_valid(true);
        header
    }

    pub fn slot_type(&self) -> VsSlotType {
        VsSlotType::from_primitive(self.slot_type_tag())
    }
}

/// Slot metadata block as exchanged with the HSM.
///
/// For raw slots `data_specific` holds the stored payload length in bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct VsMetaData {
    pub vs_header: VsHeader,
    pub valid_before: u32,
    pub valid_after: u32,
    pub data_specific: u32,
}

impl VsMetaData {
    /// Metadata for a raw slot holding `length` bytes and valid at all times.
    pub fn raw(length: u32) -> Self {
        Self {
            vs_header: VsHeader::new(VsSlotType::Raw),
            valid_before: 0x0000_0000,
            valid_after: 0xFFFF_FFFF,
            data_specific: length,
        }
    }

    pub fn to_words(&self) -> [u32; VSS_META_WORDS] {
        [
            self.vs_header.0,
            self.valid_before,
            self.valid_after,
            self.data_specific,
        ]
    }

    pub fn from_words(words: &[u32; VSS_META_WORDS]) -> Self {
        Self {
            vs_header: VsHeader(words[0]),
            valid_before: words[1],
            valid_after: words[2],
            data_specific: words[3],
        }
    }
}
