//! BIND9 text output: forward zones, reverse zones and `named.conf.local`.

pub mod forward;
pub mod named_conf;
pub mod reverse;

pub use forward::{ForwardZone, render_forward_zone};
pub use named_conf::{ConfigEntry, ZoneKind, render_named_conf};
pub use reverse::{
    ExcludedRecord, PtrConflict, PtrEntry, ReverseIndex, ReverseZone, SubnetGroup,
    render_reverse_zone,
};

use crate::config::GeneratorConfig;
use crate::zone::{ZoneDescription, date_serial};
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

/// SOA timer values in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoaTimers {
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl Default for SoaTimers {
    fn default() -> Self {
        Self {
            refresh: 604800,
            retry: 86400,
            expire: 2419200,
            minimum: 86400,
        }
    }
}

/// Everything one run produces, before anything touches the disk
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    pub forward: Vec<ForwardZone>,
    pub reverse: Vec<ReverseZone>,
    pub named_conf: String,
    pub conflicts: Vec<PtrConflict>,
    pub excluded: Vec<ExcludedRecord>,
}

/// Run the generation stages in order: forward zones, subnet grouping,
/// reverse zones, then the aggregate configuration.
pub fn generate(
    zones: &[ZoneDescription],
    config: &GeneratorConfig,
    generated_at: &NaiveDateTime,
) -> GeneratedOutput {
    let forward: Vec<ForwardZone> = zones
        .iter()
        .map(|zone| render_forward_zone(zone, config, generated_at))
        .collect();

    let index = ReverseIndex::build(zones, &config.internal_domain);
    let conflicts = index.conflicts();

    let reverse: Vec<ReverseZone> = index
        .groups()
        .iter()
        .map(|group| render_reverse_zone(group, config, generated_at))
        .collect();

    let entries: Vec<ConfigEntry> = forward
        .iter()
        .map(|zone| ConfigEntry::forward(&zone.zone_name, &zone.file_name, &config.bind_dir))
        .chain(
            reverse
                .iter()
                .map(|zone| ConfigEntry::reverse(&zone.zone_name, &zone.file_name, &config.bind_dir)),
        )
        .collect();
    let named_conf = render_named_conf(&entries, generated_at);

    info!(
        "Generated {} forward and {} reverse zones",
        forward.len(),
        reverse.len()
    );
    for conflict in &conflicts {
        warn!("Conflicting PTR targets for {}", conflict);
    }
    debug!("{} A records excluded from reverse zones", index.excluded().len());
    if let Ok(addr) = config.name_server_addr() {
        let [a, b, c, _] = addr.octets();
        if index.get([a, b, c]).is_none() {
            debug!("No reverse zone for {}, name server PTR not emitted", addr);
        }
    }

    GeneratedOutput {
        forward,
        reverse,
        named_conf,
        conflicts,
        excluded: index.excluded().to_vec(),
    }
}

/// `$TTL`, the SOA block and the configured NS record
fn write_soa_header(
    out: &mut String,
    config: &GeneratorConfig,
    ttl: u32,
    generated_at: &NaiveDateTime,
    timers: &SoaTimers,
) {
    let serial = date_serial(&generated_at.date(), config.serial_sequence);
    let ns = config.name_server_fqdn();

    out.push_str(&format!("$TTL {}\n", ttl));
    out.push_str(&format!(
        "@\tIN\tSOA\t{} {} (\n",
        ns,
        config.hostmaster_fqdn()
    ));
    out.push_str(&format!("\t{}\t; Serial\n", serial));
    out.push_str(&format!("\t{}\t; Refresh\n", timers.refresh));
    out.push_str(&format!("\t{}\t; Retry\n", timers.retry));
    out.push_str(&format!("\t{}\t; Expire\n", timers.expire));
    out.push_str(&format!("\t{}\t; Minimum TTL\n", timers.minimum));
    out.push_str(")\n\n");
    out.push_str(&format!("@\tIN\tNS\t{}\n\n", ns));
}

fn timestamp(generated_at: &NaiveDateTime) -> String {
    generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
}
