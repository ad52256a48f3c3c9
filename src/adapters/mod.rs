// Adapters - External system implementations

pub mod clock;
pub mod exec_libav;
pub mod fs_local;
pub mod metadata_hachoir;
pub mod probe_libav;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use clock::{FixedClock, SystemClock};
pub use exec_libav::EncodingSettings;
pub use fs_local::FsLocalAdapter;
pub use metadata_hachoir::HachoirMetadataAdapter;
pub use probe_libav::{ContainerMetadataAdapter, LibavMediaPort, NoCreationTime};
pub use toml_config::{AppConfig, TomlConfigAdapter};
pub use tracing_log::TracingLogAdapter;
