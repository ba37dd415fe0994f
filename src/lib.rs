pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use app::pipelines::CoOccurrencePipeline;
pub use core::{
    aggregator::{aggregate, PairAggregator},
    etl::EtlEngine,
    ranking::{find_sharing, rank_participants},
};
pub use domain::model::{CountResult, Document, UnorderedPair};
pub use utils::error::{EtlError, Result};
