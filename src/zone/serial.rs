use chrono::Datelike;

/// SOA serial in `YYYYMMDDnn` form.
///
/// Two runs on the same day with the same `sequence` produce the same
/// serial, and the server treats the second as unchanged. Bump the
/// sequence in the configuration to publish a same-day edit.
pub fn date_serial<D: Datelike>(date: &D, sequence: u8) -> u32 {
    date.year() as u32 * 1_000_000 + date.month() * 10_000 + date.day() * 100 + sequence as u32
}
