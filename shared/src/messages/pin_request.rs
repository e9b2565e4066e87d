use std::collections::BTreeSet;

use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    identifier::CellId,
    types::{AttrId, ReqId, SchemaId},
};

/// Behavior flags of a pin context
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PinFlags(u32);

impl PinFlags {
    pub const NONE: PinFlags = PinFlags(0);
    /// Attribute ids in this context use the host's native numbering
    pub const USE_NATIVE_SYMBOLS: PinFlags = PinFlags(1 << 0);
    /// Close the request as soon as it reaches `Synced`
    pub const CLOSE_ON_SYNC: PinFlags = PinFlags(1 << 1);
    /// Writes are accepted but never mirrored back to the client
    pub const NO_SYNC: PinFlags = PinFlags(1 << 2);

    const KNOWN: u32 = 0b111;

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Unknown bits are dropped
    pub fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::KNOWN)
    }

    pub fn contains(&self, other: PinFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: PinFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for PinFlags {
    type Output = PinFlags;

    fn bitor(self, rhs: PinFlags) -> PinFlags {
        PinFlags(self.0 | rhs.0)
    }
}

/// What a pin request points at
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinTarget {
    Url(String),
    Cell(CellId),
}

/// Reference used by selectors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemRef {
    Attr(AttrId),
    Schema(SchemaId),
}

/// Explicit include/exclude sets. An empty include set admits everything
/// that is not excluded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemSelector {
    pub include: BTreeSet<ItemRef>,
    pub exclude: BTreeSet<ItemRef>,
}

impl ItemSelector {
    pub fn include(mut self, item: ItemRef) -> Self {
        self.include.insert(item);
        self
    }

    pub fn exclude(mut self, item: ItemRef) -> Self {
        self.exclude.insert(item);
        self
    }

    pub fn admits(&self, item: ItemRef) -> bool {
        if self.exclude.contains(&item) {
            return false;
        }
        self.include.is_empty() || self.include.contains(&item)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinRequest {
    pub parent_req: Option<ReqId>,
    pub target: PinTarget,
    pub attr_selector: Option<ItemSelector>,
    pub child_selector: Option<ItemSelector>,
    pub flags: PinFlags,
}

impl PinRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self::new(PinTarget::Url(url.into()))
    }

    pub fn cell(cell_id: CellId) -> Self {
        Self::new(PinTarget::Cell(cell_id))
    }

    fn new(target: PinTarget) -> Self {
        Self {
            parent_req: None,
            target,
            attr_selector: None,
            child_selector: None,
            flags: PinFlags::NONE,
        }
    }

    pub fn with_flags(mut self, flags: PinFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_parent(mut self, parent_req: ReqId) -> Self {
        self.parent_req = Some(parent_req);
        self
    }

    pub fn with_attr_selector(mut self, selector: ItemSelector) -> Self {
        self.attr_selector = Some(selector);
        self
    }

    pub fn with_child_selector(mut self, selector: ItemSelector) -> Self {
        self.child_selector = Some(selector);
        self
    }
}

// Serde

impl Serde for PinTarget {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        match self {
            PinTarget::Url(url) => {
                0u8.ser(writer);
                url.ser(writer);
            }
            PinTarget::Cell(cell_id) => {
                1u8.ser(writer);
                cell_id.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(PinTarget::Url(String::de(reader)?)),
            1 => Ok(PinTarget::Cell(CellId::de(reader)?)),
            tag => Err(SerdeErr::InvalidTag {
                kind: "PinTarget",
                tag: tag as u64,
            }),
        }
    }
}

impl Serde for ItemRef {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        match self {
            ItemRef::Attr(attr_id) => {
                0u8.ser(writer);
                attr_id.ser(writer);
            }
            ItemRef::Schema(schema_id) => {
                1u8.ser(writer);
                UnsignedVariableInteger::new(*schema_id as u64).ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(ItemRef::Attr(AttrId::de(reader)?)),
            1 => {
                let value = UnsignedVariableInteger::de(reader)?.get();
                let schema_id =
                    SchemaId::try_from(value).map_err(|_| SerdeErr::VariableIntegerOverflow)?;
                Ok(ItemRef::Schema(schema_id))
            }
            tag => Err(SerdeErr::InvalidTag {
                kind: "ItemRef",
                tag: tag as u64,
            }),
        }
    }
}

impl Serde for ItemSelector {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        let include: Vec<ItemRef> = self.include.iter().copied().collect();
        let exclude: Vec<ItemRef> = self.exclude.iter().copied().collect();
        include.ser(writer);
        exclude.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            include: Vec::<ItemRef>::de(reader)?.into_iter().collect(),
            exclude: Vec::<ItemRef>::de(reader)?.into_iter().collect(),
        })
    }
}

impl Serde for PinRequest {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.parent_req
            .map(UnsignedVariableInteger::new)
            .ser(writer);
        self.target.ser(writer);
        self.attr_selector.ser(writer);
        self.child_selector.ser(writer);
        self.flags.bits().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            parent_req: Option::<UnsignedVariableInteger>::de(reader)?.map(|id| id.get()),
            target: PinTarget::de(reader)?,
            attr_selector: Option::<ItemSelector>::de(reader)?,
            child_selector: Option::<ItemSelector>::de(reader)?,
            flags: PinFlags::from_bits_truncate(u32::de(reader)?),
        })
    }
}
