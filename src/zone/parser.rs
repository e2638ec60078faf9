use super::{
    ParseWarning, Record, RecordType, Result, SectionHeader, ZoneDescription, ZoneError, constants,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Classification of one input line, checked in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace only
    Blank,
    /// Starts with `;`, `#` or `//`
    Comment,
    /// `Name=...,Records=N,Children=M`
    Header,
    /// Anything else, expected to be `TYPE:VALUE ttl=N)`
    Record,
}

pub fn classify_line(line: &str) -> LineKind {
    let line = line.trim();
    if line.is_empty() {
        LineKind::Blank
    } else if line.starts_with(';') || line.starts_with('#') || line.starts_with("//") {
        LineKind::Comment
    } else if line
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("name="))
    {
        LineKind::Header
    } else {
        LineKind::Record
    }
}

/// Parser for the per-domain record dumps.
///
/// Problems on individual lines never abort a parse. They are collected
/// as warnings and end up on the returned description.
pub struct ZoneParser {
    /// TTL used when a record has no usable `ttl=`
    default_ttl: u32,
    /// Zone being parsed, for log context
    zone_name: String,
    /// Line number for warnings
    line_number: usize,
    warnings: Vec<ParseWarning>,
}

impl ZoneParser {
    /// Create a new parser with the given fallback TTL
    pub fn new(default_ttl: u32) -> Self {
        Self {
            default_ttl,
            zone_name: String::new(),
            line_number: 0,
            warnings: Vec::new(),
        }
    }

    /// Parse a per-domain input file from path
    pub fn parse_file<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<ZoneDescription> {
        let contents =
            fs::read_to_string(path.as_ref()).map_err(|e| ZoneError::IoError(e.to_string()))?;

        if contents.len() > constants::MAX_ZONE_FILE_SIZE {
            return Err(ZoneError::FileTooLarge);
        }

        Ok(self.parse(name, &contents))
    }

    /// Parse the full text of one domain's input
    pub fn parse(&mut self, name: &str, contents: &str) -> ZoneDescription {
        self.line_number = 0;
        self.warnings.clear();
        self.zone_name = name.to_string();

        let mut zone = ZoneDescription::new(name);
        let mut owner: Option<String> = None;
        let mut at_start = true;

        for line in contents.lines() {
            self.line_number += 1;
            let line = line.trim();

            match classify_line(line) {
                LineKind::Blank => continue,
                LineKind::Comment => {
                    trace!("{}:{}: comment", name, self.line_number);
                    continue;
                }
                LineKind::Header => {
                    let header = self.parse_header(line);
                    if at_start {
                        zone.declared_record_count = header.records;
                        zone.declared_child_count = header.children;
                    } else if !header.name.is_empty() {
                        zone.children.push(header.clone());
                    }
                    trace!("{}:{}: section {:?}", name, self.line_number, header.name);
                    owner = (!header.name.is_empty()).then_some(header.name);
                }
                LineKind::Record => {
                    if at_start {
                        debug!("{}: no header line, declared counts default to 0", name);
                    }
                    match self.parse_record(line) {
                        Ok(record) => zone.records.push(match &owner {
                            Some(name) => record.with_owner(name.as_str()),
                            None => record,
                        }),
                        Err(e) => self.warn(e),
                    }
                }
            }
            at_start = false;
        }

        if !zone.counts_match() {
            debug!(
                "{}: header declares {} records, parsed {}",
                name,
                zone.declared_record_count,
                zone.records.len()
            );
        }
        if zone.declared_child_count as usize != zone.children.len() {
            debug!(
                "{}: header declares {} children, found {}",
                name,
                zone.declared_child_count,
                zone.children.len()
            );
        }

        zone.warnings = std::mem::take(&mut self.warnings);

        debug!(
            "Parsed zone {} with {} records ({} warnings)",
            zone.name,
            zone.records.len(),
            zone.warnings.len()
        );

        zone
    }

    /// Parse one record line.
    ///
    /// Two shapes are accepted: `TYPE:VALUE ttl=N)` and the Samba dump form
    /// `TYPE: VALUE (flags=f0, serial=110, ttl=900)`. The metadata group
    /// goes to `params`. Outside it only `ttl=` is taken from the value, and
    /// on SOA lines the SOA fields as well, so the value is otherwise kept
    /// exactly as written.
    ///
    /// A missing or unusable `ttl=` falls back to the default TTL; an
    /// unusable one is also recorded as a warning.
    pub fn parse_record(&mut self, line: &str) -> Result<Record> {
        let line = line.trim();
        let (rtype, details) = line
            .split_once(':')
            .ok_or_else(|| ZoneError::MalformedRecord(line.to_string()))?;

        let rtype = rtype.trim();
        if rtype.is_empty() || rtype.contains(char::is_whitespace) {
            return Err(ZoneError::MalformedRecord(line.to_string()));
        }
        let Ok(rtype) = rtype.parse::<RecordType>();
        let is_soa = rtype == RecordType::SOA;

        let (body, metadata) = split_metadata(details.trim());

        let mut params = BTreeMap::new();
        let mut ttl_field = None;
        for token in metadata.into_iter().flat_map(metadata_tokens) {
            if let Some((key, value)) = split_param(token) {
                if key.eq_ignore_ascii_case("ttl") {
                    ttl_field = Some(value);
                } else {
                    params.insert(key.to_lowercase(), value.to_string());
                }
            }
        }

        // A quoted value runs to its closing quote and may contain '='
        let (mut value_parts, rest) = match body.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => (vec![&body[..end + 2]], &body[end + 2..]),
                None => (vec![body], ""),
            },
            None => (Vec::new(), body),
        };

        for token in rest.split_whitespace() {
            match split_param(token) {
                Some((key, value)) if key.eq_ignore_ascii_case("ttl") => ttl_field = Some(value),
                Some((key, value)) if is_soa && is_soa_field(key) => {
                    params.insert(key.to_lowercase(), value.to_string());
                }
                _ => value_parts.push(token),
            }
        }

        let mut value = value_parts.join(" ").trim_end_matches(',').to_string();
        if value.is_empty() && is_soa {
            // Samba prints the SOA as fields only
            value = params.get("ns").cloned().unwrap_or_default();
        }
        if value.is_empty() {
            return Err(ZoneError::MalformedRecord(line.to_string()));
        }

        let ttl = match ttl_field {
            None => self.default_ttl,
            Some(field) => match parse_ttl(field) {
                Ok(ttl) => ttl,
                Err(e) => {
                    self.warn(e);
                    self.default_ttl
                }
            },
        };

        Ok(Record {
            owner: None,
            rtype,
            value,
            ttl,
            params,
        })
    }

    /// Parse a header line by `,` and `=` decomposition
    fn parse_header(&mut self, line: &str) -> SectionHeader {
        let mut header = SectionHeader::default();

        for field in line.split(',') {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            let Some((key, value)) = field.split_once('=') else {
                self.warn(ZoneError::InvalidHeader(format!("field without '=': {}", field)));
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "name" => header.name = value.to_string(),
                "records" => header.records = self.header_count("Records", value),
                "children" => header.children = self.header_count("Children", value),
                other => debug!("Ignoring unknown header field: {}", other),
            }
        }

        header
    }

    fn header_count(&mut self, field: &str, value: &str) -> u32 {
        match value.parse() {
            Ok(count) => count,
            Err(_) => {
                self.warn(ZoneError::InvalidHeader(format!("{}={}", field, value)));
                0
            }
        }
    }

    fn warn(&mut self, error: ZoneError) {
        warn!("{}:{}: {}", self.zone_name, self.line_number, error);
        self.warnings.push(ParseWarning {
            line: self.line_number,
            error,
        });
    }
}

impl Default for ZoneParser {
    fn default() -> Self {
        Self::new(constants::DEFAULT_TTL)
    }
}

/// Keys an SOA line carries besides its value
const SOA_FIELDS: &[&str] = &[
    "serial", "refresh", "retry", "expire", "minttl", "minimum", "ns", "email",
];

fn is_soa_field(key: &str) -> bool {
    SOA_FIELDS.iter().any(|field| key.eq_ignore_ascii_case(field))
}

/// Split off a trailing `(key=value, ...)` metadata group.
///
/// Without one, an unmatched trailing `)` is decorative and dropped.
fn split_metadata(details: &str) -> (&str, Option<&str>) {
    let Some(inner) = details.strip_suffix(')') else {
        return (details, None);
    };

    if let Some(open) = inner.rfind('(') {
        let (head, group) = (&inner[..open], &inner[open + 1..]);
        let outside_quotes = head.matches('"').count() % 2 == 0;
        let mut tokens = metadata_tokens(group).peekable();
        if outside_quotes
            && tokens.peek().is_some()
            && tokens.all(|token| split_param(token).is_some())
        {
            return (head.trim_end(), Some(group));
        }
    }

    if inner.matches('(').count() > inner.matches(')').count() {
        // The `)` closes something inside the value
        (details, None)
    } else {
        (inner.trim_end(), None)
    }
}

fn metadata_tokens(group: &str) -> impl Iterator<Item = &str> {
    group
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

/// Split a `key=value` token; anything else is part of the record value
fn split_param(token: &str) -> Option<(&str, &str)> {
    let token = token.trim_end_matches(',');
    let (key, value) = token.split_once('=')?;
    let value = value.trim_end_matches(')');

    if key.is_empty()
        || value.is_empty()
        || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    Some((key, value))
}

/// Parse TTL value (supports suffixes like 1h, 30m, etc.)
fn parse_ttl(s: &str) -> Result<u32> {
    let s = s.to_lowercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('d') {
        (n, 86400)
    } else if let Some(n) = s.strip_suffix('w') {
        (n, 604800)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| ZoneError::InvalidTTL(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("300").unwrap(), 300);
        assert_eq!(parse_ttl("5m").unwrap(), 300);
        assert_eq!(parse_ttl("1h").unwrap(), 3600);
        assert_eq!(parse_ttl("1d").unwrap(), 86400);
        assert_eq!(parse_ttl("1w").unwrap(), 604800);
        assert!(parse_ttl("abc").is_err());
        assert!(parse_ttl("-5").is_err());
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("   "), LineKind::Blank);
        assert_eq!(classify_line("; dumped by dig"), LineKind::Comment);
        assert_eq!(classify_line("# note"), LineKind::Comment);
        assert_eq!(classify_line("// note"), LineKind::Comment);
        assert_eq!(classify_line("Name=,Records=2,Children=0"), LineKind::Header);
        assert_eq!(classify_line("name=www,records=1"), LineKind::Header);
        assert_eq!(classify_line("A:10.0.1.5 ttl=3600)"), LineKind::Record);
    }

    #[test]
    fn test_record_line() {
        let mut parser = ZoneParser::new(3600);
        let record = parser.parse_record("A:10.0.1.5 ttl=300)").unwrap();

        assert_eq!(record.rtype, RecordType::A);
        assert_eq!(record.value, "10.0.1.5");
        assert_eq!(record.ttl, 300);
        assert!(record.params.is_empty());
    }

    #[test]
    fn test_record_line_with_surrounding_whitespace() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record("  CNAME : web.app.example.com   ttl=60 )  ")
            .unwrap();

        assert_eq!(record.rtype, RecordType::CNAME);
        assert_eq!(record.value, "web.app.example.com");
        assert_eq!(record.ttl, 60);
    }

    #[test]
    fn test_missing_ttl_uses_default() {
        let mut parser = ZoneParser::new(1800);
        let record = parser.parse_record("NS:ns1.example.com").unwrap();

        assert_eq!(record.ttl, 1800);
        assert!(parser.warnings.is_empty());
    }

    #[test]
    fn test_malformed_ttl_degrades() {
        let mut parser = ZoneParser::new(3600);
        let record = parser.parse_record("A:10.0.1.5 ttl=forever)").unwrap();

        assert_eq!(record.ttl, 3600);
        assert_eq!(parser.warnings.len(), 1);
        assert!(matches!(parser.warnings[0].error, ZoneError::InvalidTTL(_)));
    }

    #[test]
    fn test_soa_params() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record(
                "SOA:ns1.example.com serial=7 refresh=7200 retry=600 expire=86400 minttl=300 ttl=3600)",
            )
            .unwrap();

        assert_eq!(record.rtype, RecordType::SOA);
        assert_eq!(record.value, "ns1.example.com");
        assert_eq!(record.param("serial"), Some("7"));
        assert_eq!(record.param_u32("refresh"), Some(7200));
        assert_eq!(record.param_u32("minttl"), Some(300));
        assert!(record.param("ttl").is_none());
    }

    #[test]
    fn test_quoted_value_keeps_equals() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record(r#"TXT:"v=spf1 include:_spf.example.com ~all" ttl=300)"#)
            .unwrap();

        assert_eq!(record.value, r#""v=spf1 include:_spf.example.com ~all""#);
        assert_eq!(record.ttl, 300);
        assert!(record.params.is_empty());
    }

    #[test]
    fn test_multi_token_value() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record("MX:10 mail.example.com ttl=3600)")
            .unwrap();

        assert_eq!(record.rtype, RecordType::MX);
        assert_eq!(record.value, "10 mail.example.com");
    }

    #[test]
    fn test_unknown_type_verbatim() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record("HTTPS:1 . alpn=h2 ttl=300)")
            .unwrap();

        assert_eq!(record.rtype, RecordType::Other("HTTPS".to_string()));
        assert_eq!(record.value, "1 . alpn=h2");
        assert!(record.params.is_empty());
    }

    #[test]
    fn test_unquoted_txt_keeps_equals() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record("TXT:v=spf1 include:_spf.example.com ~all ttl=300)")
            .unwrap();

        assert_eq!(record.value, "v=spf1 include:_spf.example.com ~all");
        assert_eq!(record.ttl, 300);
        assert!(record.params.is_empty());
    }

    #[test]
    fn test_samba_metadata_group() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record("A: 10.99.0.1 (flags=f0, serial=110, ttl=900)")
            .unwrap();

        assert_eq!(record.rtype, RecordType::A);
        assert_eq!(record.value, "10.99.0.1");
        assert_eq!(record.ttl, 900);
        assert_eq!(record.param("flags"), Some("f0"));
        assert_eq!(record.param("serial"), Some("110"));
        assert!(parser.warnings.is_empty());
    }

    #[test]
    fn test_samba_soa_fields() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record(
                "SOA: serial=110, refresh=900, retry=600, expire=86400, minttl=3600, \
                 ns=dc1.samba.example.com., email=hostmaster.samba.example.com. \
                 (flags=f0, serial=110, ttl=3600)",
            )
            .unwrap();

        assert_eq!(record.rtype, RecordType::SOA);
        assert_eq!(record.value, "dc1.samba.example.com.");
        assert_eq!(record.ttl, 3600);
        assert_eq!(record.param_u32("refresh"), Some(900));
        assert_eq!(record.param_u32("minttl"), Some(3600));
        assert_eq!(record.param("email"), Some("hostmaster.samba.example.com."));
    }

    #[test]
    fn test_parenthesised_value_is_not_metadata() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record(r#"TXT:"office (2nd floor)" ttl=60)"#)
            .unwrap();
        assert_eq!(record.value, r#""office (2nd floor)""#);
        assert_eq!(record.ttl, 60);

        let record = parser.parse_record("TXT:see (appendix) ttl=60)").unwrap();
        assert_eq!(record.value, "see (appendix)");

        let record = parser.parse_record("SRV: dc1.samba.example.com (389, 0, 100)").unwrap();
        assert_eq!(record.value, "dc1.samba.example.com (389, 0, 100)");
    }

    #[test]
    fn test_extra_tokens_stay_in_value() {
        let mut parser = ZoneParser::new(3600);
        let record = parser
            .parse_record("SOA:ns1.example.com weight=5 refresh=7200 ttl=3600)")
            .unwrap();
        assert_eq!(record.value, "ns1.example.com weight=5");
        assert_eq!(record.param_u32("refresh"), Some(7200));

        let record = parser.parse_record("CNAME:web refresh=7200)").unwrap();
        assert_eq!(record.value, "web refresh=7200");
        assert!(record.params.is_empty());
    }

    #[test]
    fn test_malformed_lines() {
        let mut parser = ZoneParser::new(3600);

        assert!(matches!(
            parser.parse_record("garbage without separator"),
            Err(ZoneError::MalformedRecord(_))
        ));
        assert!(matches!(
            parser.parse_record(":10.0.0.1 ttl=5)"),
            Err(ZoneError::MalformedRecord(_))
        ));
        assert!(matches!(
            parser.parse_record("A: ttl=300)"),
            Err(ZoneError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_parse_zone_with_header() {
        let contents = "\
Name=,Records=2,Children=0
A:10.0.1.5 ttl=3600)
CNAME:web.app.example.com ttl=3600)
";
        let mut parser = ZoneParser::new(3600);
        let zone = parser.parse("app.example.com", contents);

        assert_eq!(zone.name, "app.example.com");
        assert_eq!(zone.declared_record_count, 2);
        assert_eq!(zone.declared_child_count, 0);
        assert_eq!(zone.records.len(), 2);
        assert_eq!(zone.records[0].rtype, RecordType::A);
        assert_eq!(zone.records[1].rtype, RecordType::CNAME);
        assert!(zone.warnings.is_empty());
    }

    #[test]
    fn test_parse_zone_without_header() {
        let contents = "\n\nSOA:ns1.example.com ttl=3600)\nNS:ns1.example.com ttl=3600)\n";
        let mut parser = ZoneParser::new(3600);
        let zone = parser.parse("example.com", contents);

        assert_eq!(zone.declared_record_count, 0);
        assert_eq!(zone.declared_child_count, 0);
        assert_eq!(zone.records.len(), 2);
        assert_eq!(zone.records[0].rtype, RecordType::SOA);
        assert_eq!(zone.records[1].rtype, RecordType::NS);
    }

    #[test]
    fn test_malformed_header_defaults() {
        let contents = "Name=,Records=many,Children=1\nA:10.0.0.1)\n";
        let mut parser = ZoneParser::new(3600);
        let zone = parser.parse("example.com", contents);

        assert_eq!(zone.declared_record_count, 0);
        assert_eq!(zone.declared_child_count, 1);
        assert_eq!(zone.records.len(), 1);
        assert_eq!(zone.warnings.len(), 1);
        assert_eq!(zone.warnings[0].line, 1);
        assert!(matches!(
            zone.warnings[0].error,
            ZoneError::InvalidHeader(_)
        ));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let contents = "\
Name=,Records=3,Children=0
A:10.0.1.5 ttl=3600)
this line is noise
A:10.0.1.6 ttl=3600)
";
        let mut parser = ZoneParser::new(3600);
        let zone = parser.parse("app.example.com", contents);

        assert_eq!(zone.records.len(), 2);
        assert_eq!(zone.records[1].value, "10.0.1.6");
        assert_eq!(zone.warnings.len(), 1);
        assert_eq!(zone.warnings[0].line, 3);
    }

    #[test]
    fn test_child_sections_set_owner() {
        let contents = "\
Name=,Records=2,Children=1
SOA:ns1.example.com ttl=3600)
NS:ns1.example.com ttl=3600)
Name=www,Records=1,Children=0
A:10.0.1.7 ttl=600)
";
        let mut parser = ZoneParser::new(3600);
        let zone = parser.parse("app.example.com", contents);

        assert_eq!(zone.declared_record_count, 2);
        assert_eq!(zone.declared_child_count, 1);
        assert_eq!(zone.children.len(), 1);
        assert_eq!(zone.children[0].name, "www");
        assert_eq!(zone.records.len(), 3);
        assert_eq!(zone.records[0].owner, None);
        assert_eq!(zone.records[2].owner.as_deref(), Some("www"));
    }

    #[test]
    fn test_parser_reuse_resets_state() {
        let mut parser = ZoneParser::new(3600);
        let first = parser.parse("a.example.com", "bogus\n");
        let second = parser.parse("b.example.com", "A:10.0.0.1)\n");

        assert_eq!(first.warnings.len(), 1);
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn test_parse_file_missing() {
        let mut parser = ZoneParser::default();
        let result = parser.parse_file("x.example.com", "/nonexistent/x.example.com.txt");
        assert!(matches!(result, Err(ZoneError::IoError(_))));
    }
}
