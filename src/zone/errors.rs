use serde::{Serialize, Serializer};
use std::fmt;

/// Errors raised while reading a per-domain record dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// Line could not be split into type and value
    MalformedRecord(String),
    /// `ttl=` present but not a usable number
    InvalidTTL(String),
    /// Header line with a missing or non-numeric field
    InvalidHeader(String),
    /// A record value that is not an IPv4 address
    InvalidAddress(String),
    /// IO error
    IoError(String),
    /// Input file too large
    FileTooLarge,
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord(line) => write!(f, "Malformed record line: {}", line),
            Self::InvalidTTL(ttl) => write!(f, "Invalid TTL value: {}", ttl),
            Self::InvalidHeader(msg) => write!(f, "Invalid header: {}", msg),
            Self::InvalidAddress(addr) => write!(f, "Invalid IPv4 address: {}", addr),
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
            Self::FileTooLarge => write!(f, "Zone input exceeds maximum size"),
        }
    }
}

impl std::error::Error for ZoneError {}

impl Serialize for ZoneError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A non-fatal problem found on one input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// 1-based line number in the input file
    pub line: usize,
    pub error: ZoneError,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

pub type Result<T> = std::result::Result<T, ZoneError>;
