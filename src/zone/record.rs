use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Resource record type as written in the dump.
///
/// Unknown mnemonics are kept verbatim in `Other` so new record kinds pass
/// through the generator unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    AAAA,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    SRV,
    CAA,
    DNAME,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::NS => "NS",
            RecordType::CNAME => "CNAME",
            RecordType::SOA => "SOA",
            RecordType::PTR => "PTR",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::SRV => "SRV",
            RecordType::CAA => "CAA",
            RecordType::DNAME => "DNAME",
            RecordType::Other(s) => s,
        }
    }

    /// Whether the whole rdata is a single domain name
    pub fn is_name_valued(&self) -> bool {
        matches!(
            self,
            RecordType::NS | RecordType::CNAME | RecordType::PTR | RecordType::DNAME
        )
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rtype = match s.trim().to_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::AAAA,
            "NS" => RecordType::NS,
            "CNAME" => RecordType::CNAME,
            "SOA" => RecordType::SOA,
            "PTR" => RecordType::PTR,
            "MX" => RecordType::MX,
            "TXT" => RecordType::TXT,
            "SRV" => RecordType::SRV,
            "CAA" => RecordType::CAA,
            "DNAME" => RecordType::DNAME,
            _ => RecordType::Other(s.trim().to_string()),
        };
        Ok(rtype)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single parsed record line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Owning name from the enclosing child section (None = zone apex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Record type (A, CNAME, MX, ...)
    #[serde(rename = "type")]
    pub rtype: RecordType,
    /// Record data in text form, parameters removed
    pub value: String,
    /// Time to live in seconds
    pub ttl: u32,
    /// Remaining `key=value` parameters (serial, refresh, ...)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Record {
    /// Create a new apex record without parameters
    pub fn new(rtype: RecordType, value: impl Into<String>, ttl: u32) -> Self {
        Self {
            owner: None,
            rtype,
            value: value.into(),
            ttl,
            params: BTreeMap::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Numeric parameter, ignoring values that do not parse
    pub fn param_u32(&self, key: &str) -> Option<u32> {
        self.param(key).and_then(|v| v.parse().ok())
    }
}
