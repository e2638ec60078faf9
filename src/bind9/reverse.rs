use super::{SoaTimers, timestamp, write_soa_header};
use crate::config::GeneratorConfig;
use crate::zone::{RecordType, ZoneDescription, ZoneError};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// One address-to-name mapping inside a /24
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtrEntry {
    /// Last octet of the address
    pub host: u8,
    /// Absolute target name
    pub target: String,
    /// Zone the A record came from
    pub zone: String,
}

/// All PTR entries of one /24, in order of first appearance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroup {
    /// First three octets
    pub subnet: [u8; 3],
    pub entries: Vec<PtrEntry>,
}

impl SubnetGroup {
    /// Dotted prefix, e.g. `10.0.1`
    pub fn prefix(&self) -> String {
        let [a, b, c] = self.subnet;
        format!("{}.{}.{}", a, b, c)
    }

    /// e.g. `1.0.10.in-addr.arpa`
    pub fn zone_name(&self) -> String {
        let [a, b, c] = self.subnet;
        format!("{}.{}.{}.in-addr.arpa", c, b, a)
    }

    /// e.g. `db.10.0.1.arpa`
    pub fn file_name(&self) -> String {
        format!("db.{}.arpa", self.prefix())
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let [a, b, c, _] = addr.octets();
        self.subnet == [a, b, c]
    }
}

/// An A record left out of reverse zones because its value is not IPv4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedRecord {
    pub zone: String,
    pub value: String,
}

/// One address mapped to more than one distinct name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtrConflict {
    pub address: Ipv4Addr,
    /// Distinct targets in order of first appearance
    pub targets: Vec<String>,
}

impl fmt::Display for PtrConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.address, self.targets.join(", "))
    }
}

/// Subnet grouping of every A record across all zones.
///
/// Groups and entries keep scan order (zone order, then record order).
/// Repeated addresses are kept as separate entries.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    groups: Vec<SubnetGroup>,
    positions: HashMap<[u8; 3], usize>,
    excluded: Vec<ExcludedRecord>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the A records of all zones
    pub fn build(zones: &[ZoneDescription], internal_domain: &str) -> Self {
        let mut index = Self::new();

        for zone in zones {
            let origin = zone.origin(internal_domain);
            for record in zone.records_of_type(&RecordType::A) {
                match record.value.trim().parse::<Ipv4Addr>() {
                    Ok(addr) => index.insert(addr, zone.owner_fqdn(record, &origin), &zone.name),
                    Err(_) => {
                        warn!(
                            "{}: {}, left out of reverse zones",
                            zone.name,
                            ZoneError::InvalidAddress(record.value.clone())
                        );
                        index.excluded.push(ExcludedRecord {
                            zone: zone.name.clone(),
                            value: record.value.clone(),
                        });
                    }
                }
            }
        }

        debug!(
            "Grouped A records into {} subnets ({} excluded)",
            index.groups.len(),
            index.excluded.len()
        );

        index
    }

    pub fn insert(&mut self, addr: Ipv4Addr, target: String, zone: &str) {
        let [a, b, c, host] = addr.octets();
        let subnet = [a, b, c];

        let position = match self.positions.get(&subnet) {
            Some(&position) => position,
            None => {
                self.groups.push(SubnetGroup {
                    subnet,
                    entries: Vec::new(),
                });
                self.positions.insert(subnet, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        self.groups[position].entries.push(PtrEntry {
            host,
            target,
            zone: zone.to_string(),
        });
    }

    pub fn groups(&self) -> &[SubnetGroup] {
        &self.groups
    }

    pub fn get(&self, subnet: [u8; 3]) -> Option<&SubnetGroup> {
        self.positions.get(&subnet).map(|&i| &self.groups[i])
    }

    pub fn excluded(&self) -> &[ExcludedRecord] {
        &self.excluded
    }

    /// Addresses whose entries point at more than one name
    pub fn conflicts(&self) -> Vec<PtrConflict> {
        let mut conflicts = Vec::new();

        for group in &self.groups {
            let mut by_host: Vec<(u8, Vec<&str>)> = Vec::new();
            for entry in &group.entries {
                match by_host.iter_mut().find(|(host, _)| *host == entry.host) {
                    Some((_, targets)) => {
                        if !targets.contains(&entry.target.as_str()) {
                            targets.push(entry.target.as_str());
                        }
                    }
                    None => by_host.push((entry.host, vec![entry.target.as_str()])),
                }
            }

            let [a, b, c] = group.subnet;
            conflicts.extend(
                by_host
                    .into_iter()
                    .filter(|(_, targets)| targets.len() > 1)
                    .map(|(host, targets)| PtrConflict {
                        address: Ipv4Addr::new(a, b, c, host),
                        targets: targets.into_iter().map(String::from).collect(),
                    }),
            );
        }

        conflicts
    }
}

/// A rendered reverse zone file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseZone {
    /// `c.b.a.in-addr.arpa`
    pub zone_name: String,
    /// File name inside the reverse zone directory
    pub file_name: String,
    pub text: String,
}

pub fn render_reverse_zone(
    group: &SubnetGroup,
    config: &GeneratorConfig,
    generated_at: &NaiveDateTime,
) -> ReverseZone {
    let zone_name = group.zone_name();

    let mut out = String::new();
    out.push_str(&format!(
        "; Reverse zone {} ({}.0/24)\n",
        zone_name,
        group.prefix()
    ));
    out.push_str(&format!(
        "; Generated by zonegen at {}\n",
        timestamp(generated_at)
    ));
    out.push_str(";\n");
    out.push_str(&format!("$ORIGIN {}.\n", zone_name));
    write_soa_header(
        &mut out,
        config,
        config.reverse_ttl,
        generated_at,
        &SoaTimers::default(),
    );

    for entry in &group.entries {
        out.push_str(&format!("{}\tIN\tPTR\t{}\n", entry.host, entry.target));
    }

    if let Some(addr) = config
        .name_server_addr()
        .ok()
        .filter(|addr| group.contains(*addr))
    {
        out.push_str(&format!(
            "{}\tIN\tPTR\t{}\n",
            addr.octets()[3],
            config.name_server_fqdn()
        ));
    }

    ReverseZone {
        file_name: group.file_name(),
        zone_name,
        text: out,
    }
}
