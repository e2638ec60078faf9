use super::timestamp;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Forward,
    Reverse,
}

impl ZoneKind {
    /// Output directory for this kind of zone file
    pub fn dir(&self) -> &'static str {
        match self {
            ZoneKind::Forward => "forward_zone",
            ZoneKind::Reverse => "reverse_zone",
        }
    }
}

/// One `zone` stanza of the aggregate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub zone_name: String,
    /// Path of the zone file as the DNS server sees it
    pub file_path: String,
    pub kind: ZoneKind,
}

impl ConfigEntry {
    pub fn new(zone_name: &str, file_name: &str, bind_dir: &str, kind: ZoneKind) -> Self {
        Self {
            zone_name: zone_name.to_string(),
            file_path: format!("{}/{}/{}", bind_dir.trim_end_matches('/'), kind.dir(), file_name),
            kind,
        }
    }

    pub fn forward(zone_name: &str, file_name: &str, bind_dir: &str) -> Self {
        Self::new(zone_name, file_name, bind_dir, ZoneKind::Forward)
    }

    pub fn reverse(zone_name: &str, file_name: &str, bind_dir: &str) -> Self {
        Self::new(zone_name, file_name, bind_dir, ZoneKind::Reverse)
    }
}

/// Render `named.conf.local`, forward zones before reverse zones
pub fn render_named_conf(entries: &[ConfigEntry], generated_at: &NaiveDateTime) -> String {
    let mut ordered: Vec<&ConfigEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.kind);

    let mut out = String::new();
    out.push_str("// BIND configuration file\n");
    out.push_str(&format!(
        "// Generated by zonegen at {}\n\n",
        timestamp(generated_at)
    ));

    for entry in ordered {
        out.push_str(&format!("zone \"{}\" in {{\n", entry.zone_name));
        out.push_str("    type master;\n");
        out.push_str(&format!("    file \"{}\";\n", entry.file_path));
        out.push_str("};\n\n");
    }

    out
}
