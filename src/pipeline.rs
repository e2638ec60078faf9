use crate::bind9::{self, GeneratedOutput, PtrConflict, ZoneKind};
use crate::config::GeneratorConfig;
use crate::error::{ConfigError, GenerateError, Result};
use crate::zone::{ZoneDescription, ZoneParser};
use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Name of the aggregate configuration file
pub const NAMED_CONF_FILE: &str = "named.conf.local";

/// Directory for the per-zone debug JSON documents
pub const JSON_DIR: &str = "json";

/// Outcome of one batch run
#[derive(Debug, Default)]
pub struct RunReport {
    pub zones_listed: usize,
    pub zones_parsed: usize,
    /// Listed zones whose input could not be read
    pub zones_skipped: Vec<String>,
    pub parse_warnings: usize,
    pub files_written: Vec<PathBuf>,
    pub write_failures: Vec<(PathBuf, String)>,
    pub ptr_conflicts: Vec<PtrConflict>,
    pub excluded_addresses: usize,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.zones_skipped.is_empty() && self.write_failures.is_empty()
    }
}

/// Batch driver: parse every listed zone, then generate and write all
/// outputs.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Read the zone list: one name per line, blank and `#` lines ignored
    pub fn read_zone_list(&self) -> Result<Vec<String>> {
        let path = &self.config.zone_list;
        let contents =
            fs::read_to_string(path).map_err(|e| GenerateError::io(path.clone(), e))?;
        Ok(parse_zone_list(&contents))
    }

    /// Run against the configured zone list with the current local time.
    ///
    /// Only an unreadable zone list is fatal.
    pub fn run(&self) -> Result<RunReport> {
        let zones = self.read_zone_list()?;
        info!(
            "Loaded {} zones from {}",
            zones.len(),
            self.config.zone_list.display()
        );
        Ok(self.run_with(&zones, &Local::now().naive_local()))
    }

    /// Run for an explicit zone list and generation time
    pub fn run_with(&self, zone_names: &[String], generated_at: &NaiveDateTime) -> RunReport {
        let mut report = RunReport {
            zones_listed: zone_names.len(),
            ..Default::default()
        };

        let zones = self.parse_zones(zone_names, &mut report);
        let output = bind9::generate(&zones, &self.config, generated_at);
        self.write_all(&zones, &output, &mut report);

        report.ptr_conflicts = output.conflicts;
        report.excluded_addresses = output.excluded.len();

        info!(
            "Run complete: {} zones parsed, {} skipped, {} files written, {} write failures",
            report.zones_parsed,
            report.zones_skipped.len(),
            report.files_written.len(),
            report.write_failures.len()
        );

        report
    }

    fn parse_zones(&self, zone_names: &[String], report: &mut RunReport) -> Vec<ZoneDescription> {
        let mut parser = ZoneParser::new(self.config.default_ttl);
        let mut zones = Vec::with_capacity(zone_names.len());

        for name in zone_names {
            let path = self.config.input_path(name);
            if !path.is_file() {
                warn!("No input for zone {} at {}, skipping", name, path.display());
                report.zones_skipped.push(name.clone());
                continue;
            }

            match parser.parse_file(name, &path) {
                Ok(zone) => {
                    let stats = zone.stats();
                    debug!(
                        "{}: {} records ({} A, {} CNAME, {} NS)",
                        name,
                        stats.total_records,
                        stats.a_records,
                        stats.cname_records,
                        stats.ns_records
                    );
                    report.parse_warnings += zone.warnings.len();
                    report.zones_parsed += 1;
                    zones.push(zone);
                }
                Err(e) => {
                    warn!("Failed to read {}: {}, skipping zone {}", path.display(), e, name);
                    report.zones_skipped.push(name.clone());
                }
            }
        }

        zones
    }

    fn write_all(&self, zones: &[ZoneDescription], output: &GeneratedOutput, report: &mut RunReport) {
        let root = &self.config.output_dir;

        if self.config.write_json {
            for zone in zones {
                let path = root.join(JSON_DIR).join(format!("{}.json", zone.name));
                match serde_json::to_string_pretty(zone) {
                    Ok(json) => write_output(&path, &json, report),
                    Err(e) => record_failure(&path, &GenerateError::Json(e), report),
                }
            }
        }

        for zone in &output.forward {
            let path = root.join(ZoneKind::Forward.dir()).join(&zone.file_name);
            write_output(&path, &zone.text, report);
        }

        for zone in &output.reverse {
            let path = root.join(ZoneKind::Reverse.dir()).join(&zone.file_name);
            write_output(&path, &zone.text, report);
        }

        write_output(&root.join(NAMED_CONF_FILE), &output.named_conf, report);
    }
}

/// Trimmed zone names in first-appearance order; blank lines, `#`
/// comments and repeated names are skipped.
pub fn parse_zone_list(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut zones = Vec::new();

    for name in contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
    {
        if seen.insert(name.to_ascii_lowercase()) {
            zones.push(name.to_string());
        } else {
            warn!("Zone {} listed more than once, ignoring repeat", name);
        }
    }

    zones
}

/// Write one output file, creating its directory; failures are recorded
/// and do not stop the run.
fn write_output(path: &Path, contents: &str, report: &mut RunReport) {
    match write_file(path, contents) {
        Ok(()) => {
            debug!("Wrote {}", path.display());
            report.files_written.push(path.to_path_buf());
        }
        Err(e) => record_failure(path, &e, report),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| GenerateError::io(path, e))
}

fn record_failure(path: &Path, e: &GenerateError, report: &mut RunReport) {
    error!("Failed to write {}: {}", path.display(), e);
    report
        .write_failures
        .push((path.to_path_buf(), e.to_string()));
}
