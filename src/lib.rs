pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, LocalStorage};

pub use adapters::{DisabledRenderer, OpenBabelRenderer, SqliteSource};
pub use app::pipelines::SitePipeline;
pub use config::toml_config::SiteConfig;
pub use core::{etl::EtlEngine, Pipeline};
pub use utils::error::{Result, SiteError};
