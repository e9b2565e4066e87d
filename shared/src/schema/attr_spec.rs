use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    symbols::BuiltinSymbol,
    types::{AttrId, SchemaId, SymbolId},
};

/// How the series index of an attribute is interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeriesSpec {
    /// Single-valued attribute, series index is always 0
    None,
    /// Plain integer index
    Literal,
    /// 48.16 fixed-point UTC time
    TimeIndex,
    /// Index values name symbols from the session table
    NameRef(SymbolId),
}

impl SeriesSpec {
    pub fn is_time(&self) -> bool {
        matches!(self, SeriesSpec::TimeIndex)
    }
}

/// One addressable attribute within a schema
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrSpec {
    pub attr_id: AttrId,
    pub elem_type: SymbolId,
    pub series_spec: SeriesSpec,
    pub attr_name: String,
}

impl AttrSpec {
    pub fn new(
        attr_id: AttrId,
        elem_type: SymbolId,
        series_spec: SeriesSpec,
        attr_name: impl Into<String>,
    ) -> Self {
        Self {
            attr_id,
            elem_type,
            series_spec,
            attr_name: attr_name.into(),
        }
    }

    /// The builtin element type, when the attribute uses one
    pub fn builtin_elem(&self) -> Option<BuiltinSymbol> {
        BuiltinSymbol::from_id(self.elem_type).filter(BuiltinSymbol::is_elem_type)
    }
}

/// An ordered set of attributes a cell conforms to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrSchema {
    pub schema_id: SchemaId,
    pub cell_data_model: String,
    pub attrs: Vec<AttrSpec>,
}

impl AttrSchema {
    pub fn new(schema_id: SchemaId, cell_data_model: impl Into<String>) -> Self {
        Self {
            schema_id,
            cell_data_model: cell_data_model.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, attr: AttrSpec) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn attr(&self, attr_id: AttrId) -> Option<&AttrSpec> {
        self.attrs.iter().find(|attr| attr.attr_id == attr_id)
    }
}

impl Serde for SeriesSpec {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        match self {
            SeriesSpec::None => 0u8.ser(writer),
            SeriesSpec::Literal => 1u8.ser(writer),
            SeriesSpec::TimeIndex => 2u8.ser(writer),
            SeriesSpec::NameRef(symbol) => {
                3u8.ser(writer);
                UnsignedVariableInteger::new(*symbol as u64).ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(SeriesSpec::None),
            1 => Ok(SeriesSpec::Literal),
            2 => Ok(SeriesSpec::TimeIndex),
            3 => Ok(SeriesSpec::NameRef(de_symbol_id(reader)?)),
            tag => Err(SerdeErr::InvalidTag {
                kind: "SeriesSpec",
                tag: tag as u64,
            }),
        }
    }
}

impl Serde for AttrSpec {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.attr_id.ser(writer);
        UnsignedVariableInteger::new(self.elem_type as u64).ser(writer);
        self.series_spec.ser(writer);
        self.attr_name.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            attr_id: AttrId::de(reader)?,
            elem_type: de_symbol_id(reader)?,
            series_spec: SeriesSpec::de(reader)?,
            attr_name: String::de(reader)?,
        })
    }
}

impl Serde for AttrSchema {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::new(self.schema_id as u64).ser(writer);
        self.cell_data_model.ser(writer);
        self.attrs.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            schema_id: de_symbol_id(reader)?,
            cell_data_model: String::de(reader)?,
            attrs: Vec::<AttrSpec>::de(reader)?,
        })
    }
}

fn de_symbol_id(reader: &mut ByteReader) -> Result<u32, SerdeErr> {
    let value = UnsignedVariableInteger::de(reader)?.get();
    u32::try_from(value).map_err(|_| SerdeErr::VariableIntegerOverflow)
}
