#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod fetcher;
pub mod handle;
pub mod manager;
pub mod provider;
pub mod refresher;
pub mod store;
pub mod types;

pub use config::{DbConfig, DbConfigBuilder};
pub use error::VulnDbError;
pub use fetcher::{DbFetcher, DirectoryFetcher, FetchOutcome, ListingFetcher, fetcher_for_url};
pub use handle::{DatabaseHandle, DbStatus, Providers};
pub use manager::DatabaseManager;
pub use provider::{ExclusionProvider, MetadataProvider, StoreProvider, VulnerabilityProvider};
pub use refresher::{Refresher, RefresherState};
pub use store::{
    DbMetadata, ExclusionRule, SCHEMA_VERSION, VersionRange, VulnMetadata, VulnRecord, VulnStore,
};
pub use types::Ecosystem;
