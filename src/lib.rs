pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::GatewayConfig;

pub use crate::adapters::{HttpTransport, LocalStorage};
pub use crate::core::{
    engine::{GatewayEngine, RunSummary},
    export::Exporter,
    gateway::Gateway,
    listing::ListingFetcher,
};
pub use crate::domain::model::{
    HttpMethod, LimitPolicy, OutputRecord, RequestDescriptor, ResolvedRoute, ResponseShape,
    WorkItem,
};
pub use crate::domain::ports::{Storage, Transport};
pub use crate::utils::error::{GatewayError, Result};
