mod config;
mod error;

pub use config::AppConfigExt;
pub use error::ConfigError;

// Re-export the shared config types so downstream crates only need
// fray-core.
pub use fray_types::{
    AppConfig, CopyHotkeyConfig, ExportTemplateConfig, HotkeySettings, MeterSettings,
    SortDirection, SortField, WindowConfig,
};
