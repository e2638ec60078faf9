use super::{SoaTimers, timestamp, write_soa_header};
use crate::config::GeneratorConfig;
use crate::zone::{Record, RecordType, ZoneDescription, qualify};
use chrono::NaiveDateTime;
use tracing::debug;

/// A rendered forward zone file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardZone {
    /// Zone origin without trailing dot
    pub zone_name: String,
    /// File name inside the forward zone directory
    pub file_name: String,
    pub text: String,
}

/// Render the forward zone file for one zone.
///
/// The body holds one line per input record, in input order. Input SOA
/// records feed `$TTL` and the SOA timers and appear as comments at their
/// position; the emitted SOA is always synthesized from the configuration.
pub fn render_forward_zone(
    zone: &ZoneDescription,
    config: &GeneratorConfig,
    generated_at: &NaiveDateTime,
) -> ForwardZone {
    let origin = zone.origin(&config.internal_domain);
    let source_soa = zone.records_of_type(&RecordType::SOA).next();
    let ttl = source_soa.map_or(config.default_ttl, |soa| soa.ttl);
    let timers = source_soa.map(soa_timers).unwrap_or_default();

    let mut out = String::new();
    out.push_str(&format!("; Forward zone {}\n", origin));
    out.push_str(&format!(
        "; Generated by zonegen at {}\n",
        timestamp(generated_at)
    ));
    out.push_str(";\n");
    out.push_str(&format!("$ORIGIN {}.\n", origin));
    write_soa_header(&mut out, config, ttl, generated_at, &timers);

    if is_within(&origin, &config.top_level_domain) {
        out.push_str(&format!(
            "{}\tIN\tA\t{}\n\n",
            config.name_server_fqdn(),
            config.host_ipv4.trim()
        ));
    }

    for record in &zone.records {
        out.push_str(&render_record(zone, record, &origin));
        out.push('\n');
    }

    debug!(
        "Rendered forward zone {} ({} records)",
        origin,
        zone.records.len()
    );

    ForwardZone {
        file_name: format!("db.{}", origin),
        zone_name: origin,
        text: out,
    }
}

/// One resource record line: `OWNER TTL IN TYPE RDATA`
pub fn render_record(zone: &ZoneDescription, record: &Record, origin: &str) -> String {
    let line = format!(
        "{}\t{}\tIN\t{}\t{}",
        zone.owner_fqdn(record, origin),
        record.ttl,
        record.rtype,
        render_rdata(record, origin)
    );

    if record.rtype == RecordType::SOA {
        format!("; {}", line)
    } else {
        line
    }
}

/// Record data with domain names qualified against the origin
pub fn render_rdata(record: &Record, origin: &str) -> String {
    let value = record.value.trim();
    match &record.rtype {
        rtype if rtype.is_name_valued() => qualify(value, origin),
        RecordType::MX | RecordType::SRV => render_target_fields(&record.rtype, value, origin),
        RecordType::TXT => quote_txt(value),
        _ => value.to_string(),
    }
}

/// MX and SRV data, either in zone-file order or as Samba prints it:
/// `exchange (preference)` and `target (port, priority, weight)`.
fn render_target_fields(rtype: &RecordType, value: &str, origin: &str) -> String {
    if let Some((target, fields)) = samba_fields(value) {
        let target = qualify(target, origin);
        match (rtype, fields.as_slice()) {
            (RecordType::MX, [preference]) => return format!("{} {}", preference, target),
            (RecordType::SRV, [port, priority, weight]) => {
                return format!("{} {} {} {}", priority, weight, port, target);
            }
            _ => {}
        }
    }
    qualify_last_field(value, origin)
}

fn samba_fields(value: &str) -> Option<(&str, Vec<&str>)> {
    let (target, fields) = value.strip_suffix(')')?.rsplit_once('(')?;
    let fields: Vec<&str> = fields.split(',').map(str::trim).collect();
    fields
        .iter()
        .all(|field| field.parse::<u16>().is_ok())
        .then_some((target.trim(), fields))
}

fn qualify_last_field(value: &str, origin: &str) -> String {
    match value.rsplit_once(char::is_whitespace) {
        Some((head, target)) => format!("{} {}", head.trim_end(), qualify(target, origin)),
        None => qualify(value, origin),
    }
}

fn quote_txt(value: &str) -> String {
    if value.starts_with('"') {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn soa_timers(soa: &Record) -> SoaTimers {
    let defaults = SoaTimers::default();
    SoaTimers {
        refresh: soa.param_u32("refresh").unwrap_or(defaults.refresh),
        retry: soa.param_u32("retry").unwrap_or(defaults.retry),
        expire: soa.param_u32("expire").unwrap_or(defaults.expire),
        minimum: soa
            .param_u32("minttl")
            .or_else(|| soa.param_u32("minimum"))
            .unwrap_or(defaults.minimum),
    }
}

fn is_within(name: &str, domain: &str) -> bool {
    let name = name.trim_end_matches('.').to_lowercase();
    let domain = domain.trim_end_matches('.').to_lowercase();
    name == domain || name.ends_with(&format!(".{}", domain))
}
