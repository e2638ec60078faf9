use super::{ParseWarning, Record, RecordType};
use serde::Serialize;

/// Header line of a section: `Name=<owner>,Records=N,Children=M`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionHeader {
    /// Owner name, empty for the zone apex
    pub name: String,
    pub records: u32,
    pub children: u32,
}

/// One domain's parsed input.
///
/// `records` keeps input order, which is emission order for the forward
/// zone. The declared counts come from the first header and are advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneDescription {
    /// Zone name as listed in the zone list
    pub name: String,
    pub declared_record_count: u32,
    pub declared_child_count: u32,
    pub records: Vec<Record>,
    /// Child section headers after the first header
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SectionHeader>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

impl ZoneDescription {
    /// Create an empty description with zero declared counts
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ..Default::default()
        }
    }

    /// Zone origin without the trailing dot.
    ///
    /// Single-label zone names are placed under `internal_domain`.
    pub fn origin(&self, internal_domain: &str) -> String {
        let name = self.name.trim_end_matches('.');
        if name.contains('.') {
            name.to_string()
        } else {
            format!("{}.{}", name, internal_domain.trim_end_matches('.'))
        }
    }

    /// Absolute owner name of a record in this zone
    pub fn owner_fqdn(&self, record: &Record, origin: &str) -> String {
        qualify(record.owner.as_deref().unwrap_or("@"), origin)
    }

    /// Records of one type, in input order
    pub fn records_of_type<'a>(
        &'a self,
        rtype: &'a RecordType,
    ) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| &r.rtype == rtype)
    }

    /// Whether the header's advisory record count matches what was parsed
    pub fn counts_match(&self) -> bool {
        self.declared_record_count as usize == self.records.len()
    }

    /// Get zone statistics
    pub fn stats(&self) -> ZoneStats {
        let mut stats = ZoneStats::default();

        for record in &self.records {
            stats.total_records += 1;
            match record.rtype {
                RecordType::A => stats.a_records += 1,
                RecordType::AAAA => stats.aaaa_records += 1,
                RecordType::NS => stats.ns_records += 1,
                RecordType::CNAME => stats.cname_records += 1,
                RecordType::MX => stats.mx_records += 1,
                RecordType::TXT => stats.txt_records += 1,
                RecordType::SOA => stats.soa_records += 1,
                _ => stats.other_records += 1,
            }
        }

        stats
    }
}

/// Zone statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ZoneStats {
    pub total_records: usize,
    pub a_records: usize,
    pub aaaa_records: usize,
    pub ns_records: usize,
    pub cname_records: usize,
    pub mx_records: usize,
    pub txt_records: usize,
    pub soa_records: usize,
    pub other_records: usize,
}

/// Turn a name from the dump into an absolute name with a trailing dot.
///
/// `@` and the empty name are the origin. Names already ending in `.` are
/// left alone, and so are names at or below the origin. Everything else
/// is relative to the origin, dotted or not.
pub fn qualify(name: &str, origin: &str) -> String {
    let name = name.trim();
    let origin = origin.trim_end_matches('.');

    if name.is_empty() || name == "@" {
        format!("{}.", origin)
    } else if name.ends_with('.') {
        name.to_string()
    } else if is_at_or_below(name, origin) {
        format!("{}.", name)
    } else {
        format!("{}.{}.", name, origin)
    }
}

fn is_at_or_below(name: &str, origin: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let origin = origin.to_ascii_lowercase();
    name == origin || name.ends_with(&format!(".{}", origin))
}
