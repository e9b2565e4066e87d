use cellsync_serde::{ByteReader, ByteWrite, ByteWriter, Serde, UnsignedVariableInteger};

use super::{
    err_code::ReqError,
    error::MsgCodecError,
    msg::{AttrPush, CellDecl, Msg, MsgBatch, MsgFlags, MsgOp},
    pin_request::PinRequest,
    value::AttrValue,
    SeriesIndex,
};
use crate::{
    identifier::{CellId, Tid},
    schema::AttrSchema,
    symbols::Symbol,
    types::{AttrId, SchemaId},
};

// A message is `op code | req id | flags | body length | body`. Bodies are
// length-prefixed so a decoder can verify each one was consumed exactly.

pub fn encode_msg(msg: &Msg, writer: &mut dyn ByteWrite) {
    msg.op.code().ser(writer);
    UnsignedVariableInteger::new(msg.req_id).ser(writer);
    msg.flags.wire_bits().ser(writer);

    let mut body = ByteWriter::new();
    write_body(&msg.op, &mut body);
    UnsignedVariableInteger::new(body.len() as u64).ser(writer);
    writer.write_bytes(body.as_slice());
}

pub fn decode_msg(reader: &mut ByteReader) -> Result<Msg, MsgCodecError> {
    let code = u8::de(reader)?;
    let req_id = UnsignedVariableInteger::de(reader)?.get();
    let flags = MsgFlags::from_bits(MsgFlags::from_bits(u32::de(reader)?).wire_bits());

    let body_len = UnsignedVariableInteger::de(reader)?.get();
    if body_len > reader.remaining() as u64 {
        return Err(cellsync_serde::SerdeErr::LengthOutOfBounds {
            length: body_len,
            remaining: reader.remaining(),
        }
        .into());
    }
    let body = reader.read_bytes(body_len as usize)?;
    let mut body_reader = ByteReader::new(body);
    let op = read_body(code, &mut body_reader)?;
    if !body_reader.is_empty() {
        return Err(MsgCodecError::TrailingBytes {
            op: op.name(),
            remaining: body_reader.remaining(),
        });
    }
    Ok(Msg { req_id, flags, op })
}

pub fn encode_batch(msgs: &[Msg]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    UnsignedVariableInteger::new(msgs.len() as u64).ser(&mut writer);
    for msg in msgs {
        encode_msg(msg, &mut writer);
    }
    writer.to_bytes()
}

pub fn decode_batch(bytes: &[u8]) -> Result<MsgBatch, MsgCodecError> {
    let mut reader = ByteReader::new(bytes);
    let count = UnsignedVariableInteger::de(&mut reader)?.get();
    // a message takes at least 7 bytes, so the payload bounds the count
    let mut batch = Vec::with_capacity((count as usize).min(reader.remaining() / 7 + 1));
    for _ in 0..count {
        batch.push(decode_msg(&mut reader)?);
    }
    if !reader.is_empty() {
        return Err(MsgCodecError::TrailingBatchBytes {
            remaining: reader.remaining(),
        });
    }
    Ok(batch)
}

fn write_body(op: &MsgOp, writer: &mut dyn ByteWrite) {
    match op {
        MsgOp::Login {
            user_uid,
            device_uid,
        } => {
            user_uid.ser(writer);
            device_uid.ser(writer);
        }
        MsgOp::LoginChallenge { hash } => hash.ser(writer),
        MsgOp::LoginResponse { hash_resp } => hash_resp.ser(writer),
        MsgOp::LoginAccepted => {}
        MsgOp::RegisterDefs { symbols, schemas } => {
            symbols.ser(writer);
            schemas.ser(writer);
        }
        MsgOp::PinCell(request) => request.ser(writer),
        MsgOp::UpsertCell(decl) | MsgOp::InsertChildCell(decl) => write_decl(decl, writer),
        MsgOp::PushAttr(push) => {
            push.cell_id.ser(writer);
            push.attr_id.ser(writer);
            push.series_index.ser(writer);
            push.value.ser(writer);
        }
        MsgOp::Commit { cell, tid } => {
            cell.ser(writer);
            tid.ser(writer);
        }
        MsgOp::RemoveCell { cell_id } => cell_id.ser(writer),
        MsgOp::CloseReq { error } => error.ser(writer),
        MsgOp::Reject { error } => error.ser(writer),
    }
}

fn read_body(code: u8, reader: &mut ByteReader) -> Result<MsgOp, MsgCodecError> {
    let op = match code {
        1 => MsgOp::Login {
            user_uid: String::de(reader)?,
            device_uid: String::de(reader)?,
        },
        2 => MsgOp::LoginChallenge {
            hash: Vec::<u8>::de(reader)?,
        },
        3 => MsgOp::LoginResponse {
            hash_resp: Vec::<u8>::de(reader)?,
        },
        4 => MsgOp::LoginAccepted,
        10 => MsgOp::RegisterDefs {
            symbols: Vec::<Symbol>::de(reader)?,
            schemas: Vec::<AttrSchema>::de(reader)?,
        },
        11 => MsgOp::PinCell(PinRequest::de(reader)?),
        20 => MsgOp::UpsertCell(read_decl(reader)?),
        21 => MsgOp::InsertChildCell(read_decl(reader)?),
        22 => MsgOp::PushAttr(AttrPush {
            cell_id: CellId::de(reader)?,
            attr_id: AttrId::de(reader)?,
            series_index: SeriesIndex::de(reader)?,
            value: AttrValue::de(reader)?,
        }),
        23 => MsgOp::Commit {
            cell: Option::<CellId>::de(reader)?,
            tid: Option::<Tid>::de(reader)?,
        },
        24 => MsgOp::RemoveCell {
            cell_id: CellId::de(reader)?,
        },
        30 => MsgOp::CloseReq {
            error: Option::<ReqError>::de(reader)?,
        },
        31 => MsgOp::Reject {
            error: ReqError::de(reader)?,
        },
        code => return Err(MsgCodecError::UnknownOpcode { code }),
    };
    Ok(op)
}

fn write_decl(decl: &CellDecl, writer: &mut dyn ByteWrite) {
    decl.cell_id.ser(writer);
    UnsignedVariableInteger::new(decl.schema_id as u64).ser(writer);
    decl.parent.ser(writer);
    decl.label.ser(writer);
}

fn read_decl(reader: &mut ByteReader) -> Result<CellDecl, MsgCodecError> {
    let cell_id = CellId::de(reader)?;
    let schema_id = UnsignedVariableInteger::de(reader)?.get();
    let schema_id = SchemaId::try_from(schema_id)
        .map_err(|_| cellsync_serde::SerdeErr::VariableIntegerOverflow)?;
    Ok(CellDecl {
        cell_id,
        schema_id,
        parent: Option::<CellId>::de(reader)?,
        label: Option::<String>::de(reader)?,
    })
}
