pub mod errors;
pub mod parser;
pub mod record;
pub mod serial;
#[allow(clippy::module_inception)]
pub mod zone;

pub use errors::{ParseWarning, Result, ZoneError};
pub use parser::{LineKind, ZoneParser, classify_line};
pub use record::{Record, RecordType};
pub use serial::date_serial;
pub use zone::{SectionHeader, ZoneDescription, ZoneStats, qualify};

/// Zone constants
pub mod constants {
    /// Default TTL if not specified (1 hour)
    pub const DEFAULT_TTL: u32 = 3600;

    /// Maximum per-domain input file size (10MB)
    pub const MAX_ZONE_FILE_SIZE: usize = 10 * 1024 * 1024;
}
