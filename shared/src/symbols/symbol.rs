use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::types::SymbolId;

/// An interned name bound to a compact integer id for the life of a session
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
}

impl Symbol {
    pub fn new(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Serde for Symbol {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::new(self.id as u64).ser(writer);
        self.name.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let id = UnsignedVariableInteger::de(reader)?.get();
        let id = SymbolId::try_from(id).map_err(|_| SerdeErr::VariableIntegerOverflow)?;
        let name = String::de(reader)?;
        Ok(Self { id, name })
    }
}
