use std::fmt;

use cellsync_serde::{ByteReader, ByteWrite, Serde, SerdeErr};
use thiserror::Error;

/// Protocol-level error classification carried by `CloseReq` and `Reject`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrCode {
    Unnamed,

    // connection / session
    NotConnected,
    ShuttingDown,
    SessionExpired,
    Timeout,
    ProtocolNotRecognized,

    // auth
    AuthFailed,
    LoginFailed,
    InsufficientPermissions,

    // request validity
    InvalidReq,
    InvalidUri,
    BadValue,
    ReqNotFound,

    // schema / definition
    TypeNotFound,
    TypeNotRegistered,
    BadSchema,
    DefNotFound,
    DuplicateSymbol,
    ViolatesAppendOnly,

    // data / commit
    NothingToCommit,
    CommitFailed,
    DataFailure,
    MalformedTx,

    // domain lookup
    CellNotFound,
    AppNotFound,
    PlanetNotFound,
    PlanetFailure,
    PinFailed,
}

impl ErrCode {
    pub fn to_wire(&self) -> u16 {
        match self {
            ErrCode::Unnamed => 0,
            ErrCode::NotConnected => 1,
            ErrCode::ShuttingDown => 2,
            ErrCode::SessionExpired => 3,
            ErrCode::Timeout => 4,
            ErrCode::ProtocolNotRecognized => 5,
            ErrCode::AuthFailed => 10,
            ErrCode::LoginFailed => 11,
            ErrCode::InsufficientPermissions => 12,
            ErrCode::InvalidReq => 20,
            ErrCode::InvalidUri => 21,
            ErrCode::BadValue => 22,
            ErrCode::ReqNotFound => 23,
            ErrCode::TypeNotFound => 30,
            ErrCode::TypeNotRegistered => 31,
            ErrCode::BadSchema => 32,
            ErrCode::DefNotFound => 33,
            ErrCode::DuplicateSymbol => 34,
            ErrCode::ViolatesAppendOnly => 35,
            ErrCode::NothingToCommit => 40,
            ErrCode::CommitFailed => 41,
            ErrCode::DataFailure => 42,
            ErrCode::MalformedTx => 43,
            ErrCode::CellNotFound => 50,
            ErrCode::AppNotFound => 51,
            ErrCode::PlanetNotFound => 52,
            ErrCode::PlanetFailure => 53,
            ErrCode::PinFailed => 54,
        }
    }

    pub fn from_wire(value: u16) -> Option<Self> {
        let code = match value {
            0 => ErrCode::Unnamed,
            1 => ErrCode::NotConnected,
            2 => ErrCode::ShuttingDown,
            3 => ErrCode::SessionExpired,
            4 => ErrCode::Timeout,
            5 => ErrCode::ProtocolNotRecognized,
            10 => ErrCode::AuthFailed,
            11 => ErrCode::LoginFailed,
            12 => ErrCode::InsufficientPermissions,
            20 => ErrCode::InvalidReq,
            21 => ErrCode::InvalidUri,
            22 => ErrCode::BadValue,
            23 => ErrCode::ReqNotFound,
            30 => ErrCode::TypeNotFound,
            31 => ErrCode::TypeNotRegistered,
            32 => ErrCode::BadSchema,
            33 => ErrCode::DefNotFound,
            34 => ErrCode::DuplicateSymbol,
            35 => ErrCode::ViolatesAppendOnly,
            40 => ErrCode::NothingToCommit,
            41 => ErrCode::CommitFailed,
            42 => ErrCode::DataFailure,
            43 => ErrCode::MalformedTx,
            50 => ErrCode::CellNotFound,
            51 => ErrCode::AppNotFound,
            52 => ErrCode::PlanetNotFound,
            53 => ErrCode::PlanetFailure,
            54 => ErrCode::PinFailed,
            _ => return None,
        };
        Some(code)
    }

    /// Codes that end the whole session rather than a single request
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            ErrCode::ShuttingDown
                | ErrCode::SessionExpired
                | ErrCode::MalformedTx
                | ErrCode::ProtocolNotRecognized
                | ErrCode::AuthFailed
                | ErrCode::LoginFailed
        )
    }

    /// Codes worth retrying after a backoff
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrCode::Timeout
                | ErrCode::ShuttingDown
                | ErrCode::NotConnected
                | ErrCode::SessionExpired
        )
    }

    pub fn default_level(&self) -> ErrLevel {
        if self.is_session_fatal() {
            ErrLevel::Fatal
        } else if self.is_transient() {
            ErrLevel::Warning
        } else {
            ErrLevel::Error
        }
    }
}

impl fmt::Display for ErrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrLevel {
    Info,
    Warning,
    Error,
    Fatal,
}

impl ErrLevel {
    fn to_wire(self) -> u8 {
        match self {
            ErrLevel::Info => 0,
            ErrLevel::Warning => 1,
            ErrLevel::Error => 2,
            ErrLevel::Fatal => 3,
        }
    }

    fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(ErrLevel::Info),
            1 => Some(ErrLevel::Warning),
            2 => Some(ErrLevel::Error),
            3 => Some(ErrLevel::Fatal),
            _ => None,
        }
    }
}

/// Error value attached to close/cancel signaling for one request
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{code} ({level:?}): {msg}")]
pub struct ReqError {
    pub code: ErrCode,
    pub level: ErrLevel,
    pub msg: String,
}

impl ReqError {
    pub fn new(code: ErrCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            level: code.default_level(),
            msg: msg.into(),
        }
    }

    pub fn with_level(mut self, level: ErrLevel) -> Self {
        self.level = level;
        self
    }
}

impl Serde for ErrCode {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.to_wire().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let value = u16::de(reader)?;
        ErrCode::from_wire(value).ok_or(SerdeErr::InvalidTag {
            kind: "ErrCode",
            tag: value as u64,
        })
    }
}

impl Serde for ReqError {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.code.ser(writer);
        self.level.to_wire().ser(writer);
        self.msg.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let code = ErrCode::de(reader)?;
        let level_tag = u8::de(reader)?;
        let level = ErrLevel::from_wire(level_tag).ok_or(SerdeErr::InvalidTag {
            kind: "ErrLevel",
            tag: level_tag as u64,
        })?;
        let msg = String::de(reader)?;
        Ok(Self { code, level, msg })
    }
}
