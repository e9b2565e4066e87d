use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr, SignedVariableInteger};

use crate::{
    identifier::{CellId, Tid},
    symbols::BuiltinSymbol,
};

/// Wire tag describing which variant an attribute value carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Nil,
    Int,
    Float,
    Bool,
    Text,
    Bytes,
    Tid,
    Cell,
}

impl ValueType {
    pub fn to_wire(&self) -> i32 {
        match self {
            ValueType::Nil => 0,
            ValueType::Int => 1,
            ValueType::Float => 2,
            ValueType::Bool => 3,
            ValueType::Text => 4,
            ValueType::Bytes => 5,
            ValueType::Tid => 6,
            ValueType::Cell => 7,
        }
    }

    pub fn from_wire(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(ValueType::Nil),
            1 => Some(ValueType::Int),
            2 => Some(ValueType::Float),
            3 => Some(ValueType::Bool),
            4 => Some(ValueType::Text),
            5 => Some(ValueType::Bytes),
            6 => Some(ValueType::Tid),
            7 => Some(ValueType::Cell),
            _ => None,
        }
    }

    /// Value type a builtin element type requires
    pub fn for_builtin(builtin: BuiltinSymbol) -> Option<Self> {
        match builtin {
            BuiltinSymbol::Int => Some(ValueType::Int),
            BuiltinSymbol::Float => Some(ValueType::Float),
            BuiltinSymbol::Bool => Some(ValueType::Bool),
            BuiltinSymbol::Text => Some(ValueType::Text),
            BuiltinSymbol::Bytes => Some(ValueType::Bytes),
            BuiltinSymbol::Tid => Some(ValueType::Tid),
            BuiltinSymbol::CellId => Some(ValueType::Cell),
            _ => None,
        }
    }
}

/// A typed attribute value. Integers travel inline, everything else as a
/// byte buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Nil,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Tid(Tid),
    Cell(CellId),
}

impl AttrValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            AttrValue::Nil => ValueType::Nil,
            AttrValue::Int(_) => ValueType::Int,
            AttrValue::Float(_) => ValueType::Float,
            AttrValue::Bool(_) => ValueType::Bool,
            AttrValue::Text(_) => ValueType::Text,
            AttrValue::Bytes(_) => ValueType::Bytes,
            AttrValue::Tid(_) => ValueType::Tid,
            AttrValue::Cell(_) => ValueType::Cell,
        }
    }

    /// Nil clears a value and is accepted for any element type
    pub fn conforms_to(&self, builtin: BuiltinSymbol) -> bool {
        match (self, ValueType::for_builtin(builtin)) {
            (AttrValue::Nil, _) | (_, None) => true,
            (value, Some(expected)) => value.value_type() == expected,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(value: Vec<u8>) -> Self {
        AttrValue::Bytes(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl Serde for AttrValue {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.value_type().to_wire().ser(writer);
        match self {
            AttrValue::Nil => {}
            AttrValue::Int(value) => SignedVariableInteger::new(*value).ser(writer),
            AttrValue::Float(value) => value.ser(writer),
            AttrValue::Bool(value) => value.ser(writer),
            AttrValue::Text(value) => value.ser(writer),
            AttrValue::Bytes(value) => value.ser(writer),
            AttrValue::Tid(value) => value.ser(writer),
            AttrValue::Cell(value) => value.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let tag = i32::de(reader)?;
        let value_type = ValueType::from_wire(tag).ok_or(SerdeErr::InvalidTag {
            kind: "ValueType",
            tag: tag as u64,
        })?;
        Ok(match value_type {
            ValueType::Nil => AttrValue::Nil,
            ValueType::Int => AttrValue::Int(SignedVariableInteger::de(reader)?.get()),
            ValueType::Float => AttrValue::Float(f64::de(reader)?),
            ValueType::Bool => AttrValue::Bool(bool::de(reader)?),
            ValueType::Text => AttrValue::Text(String::de(reader)?),
            ValueType::Bytes => AttrValue::Bytes(Vec::<u8>::de(reader)?),
            ValueType::Tid => AttrValue::Tid(Tid::de(reader)?),
            ValueType::Cell => AttrValue::Cell(CellId::de(reader)?),
        })
    }
}
