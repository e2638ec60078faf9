pub mod bind9;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod zone;

pub use config::GeneratorConfig;
pub use pipeline::{Generator, RunReport};
pub use zone::{Record, RecordType, ZoneDescription, ZoneParser};
