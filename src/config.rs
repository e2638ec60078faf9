use crate::error::ConfigError;
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

/// Naming parameters and paths for one generation run.
///
/// Every generator takes this explicitly, so a run is a pure function of
/// its inputs and this struct.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// File listing one zone name per line
    pub zone_list: PathBuf,

    /// Directory holding the per-domain `<zone>.txt` record dumps
    pub input_dir: PathBuf,

    /// Root directory for all generated output
    pub output_dir: PathBuf,

    /// Zones under this domain get a glue A record for the name server
    pub top_level_domain: String,

    /// Domain used to qualify single-label zone names
    pub internal_domain: String,

    /// Authoritative name server host (SOA MNAME and NS target)
    pub name_server: String,

    /// Hostmaster contact in zone-file form (SOA RNAME)
    pub hostmaster: String,

    /// IPv4 address of the authoritative name server
    pub host_ipv4: String,

    /// Fallback TTL for records without a usable `ttl=`
    pub default_ttl: u32,

    /// `$TTL` of generated reverse zones
    pub reverse_ttl: u32,

    /// Running counter appended to the date in `YYYYMMDDnn` serials
    pub serial_sequence: u8,

    /// Directory prefix the DNS server sees for generated files
    pub bind_dir: String,

    /// Whether to write the per-zone debug JSON documents
    pub write_json: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            zone_list: PathBuf::from("zone.txt"),
            input_dir: PathBuf::from("zone_query"),
            output_dir: PathBuf::from("."),
            top_level_domain: "example.com".to_string(),
            internal_domain: "internal.example.com".to_string(),
            name_server: "mstbind.example.com".to_string(),
            hostmaster: "hostmaster.example.com.".to_string(),
            host_ipv4: "192.168.0.1".to_string(),
            default_ttl: crate::zone::constants::DEFAULT_TTL,
            reverse_ttl: 86400,
            serial_sequence: 1,
            bind_dir: "/etc/bind".to_string(),
            write_json: true,
        }
    }
}

impl GeneratorConfig {
    /// Load overrides from a TOML file on top of the defaults
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.name_server_addr()?;

        for (field, value) in [
            ("top_level_domain", &self.top_level_domain),
            ("internal_domain", &self.internal_domain),
            ("name_server", &self.name_server),
            ("hostmaster", &self.hostmaster),
        ] {
            let trimmed = value.trim().trim_end_matches('.');
            if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidDomain {
                    field,
                    value: value.clone(),
                });
            }
        }

        if self.serial_sequence > 99 {
            return Err(ConfigError::InvalidSerialSequence(self.serial_sequence));
        }

        Ok(())
    }

    /// The name server address as a parsed IPv4 address
    pub fn name_server_addr(&self) -> Result<Ipv4Addr, ConfigError> {
        self.host_ipv4
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidIpv4(self.host_ipv4.clone()))
    }

    /// Name server as an absolute name (`mstbind.example.com.`)
    pub fn name_server_fqdn(&self) -> String {
        absolute(&self.name_server)
    }

    /// Hostmaster contact as an absolute name
    pub fn hostmaster_fqdn(&self) -> String {
        absolute(&self.hostmaster)
    }

    /// Path of the per-domain input file for a zone
    pub fn input_path(&self, zone: &str) -> PathBuf {
        self.input_dir.join(format!("{}.txt", zone))
    }
}

fn absolute(name: &str) -> String {
    let name = name.trim();
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_host_ipv4() {
        // A trailing dot is not an address
        let config = GeneratorConfig {
            host_ipv4: "192.168.0.0.".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidIpv4("192.168.0.0.".to_string()))
        );
    }

    #[test]
    fn test_invalid_serial_sequence() {
        let config = GeneratorConfig {
            serial_sequence: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_name_server() {
        let config = GeneratorConfig {
            name_server: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDomain {
                field: "name_server",
                ..
            })
        ));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
name_server = "ns1.corp.test"
host_ipv4 = "10.9.8.7"
serial_sequence = 5
"#,
        )
        .unwrap();

        assert_eq!(config.name_server, "ns1.corp.test");
        assert_eq!(config.host_ipv4, "10.9.8.7");
        assert_eq!(config.serial_sequence, 5);
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.bind_dir, "/etc/bind");
    }

    #[test]
    fn test_toml_unparseable() {
        let result = GeneratorConfig::from_toml_str("default_ttl = \"soon\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_fqdn_helpers() {
        let config = GeneratorConfig::default();
        assert_eq!(config.name_server_fqdn(), "mstbind.example.com.");
        assert_eq!(config.hostmaster_fqdn(), "hostmaster.example.com.");
        assert_eq!(
            config.input_path("app.example.com"),
            PathBuf::from("zone_query/app.example.com.txt")
        );
    }
}
