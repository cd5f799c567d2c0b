#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScannerError`)
//! - [`config`]: Scanner configuration (`ScannerConfig`, builder)
//! - [`types`]: Domain types (`Package`, `Distro`, `ScanContext`, `SbomFormat`)
//! - [`decoder`]: SBOM decoders (`SbomDecoder` trait, CycloneDX, SPDX, purl)
//! - [`matcher`]: Vulnerability matching (`Matcher` trait, `VulnMatcher`, `MatchSet`)
//! - [`retry`]: Bounded flat-backoff retry loop (`RetryPolicy`, `RetryOutcome`)
//! - [`executor`]: Scan executor (`ScanExecutor`)
//! - [`result`]: Scan result (`ScanResult`, `SeverityCounts`)
//! - [`presenter`]: Result document encoding (`JsonPresenter`)
//! - [`service`]: Service facade (`ScanService`)

pub mod config;
pub mod decoder;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod presenter;
pub mod result;
pub mod retry;
pub mod service;
pub mod types;

// --- Public API Re-exports ---

// Service facade
pub use service::ScanService;

// Configuration
pub use config::{ScannerConfig, ScannerConfigBuilder};

// Error
pub use error::ScannerError;

// Types
pub use types::{Distro, Package, SbomFormat, ScanContext};

// Decoder
pub use decoder::{AutoDecoder, DecodedSbom, SbomDecoder};

// Matching
pub use matcher::{IgnoredMatch, Match, MatchError, MatchSet, Matcher, VulnMatcher};

// Execution
pub use executor::ScanExecutor;
pub use result::{ScanResult, SeverityCounts};
pub use retry::{Attempt, RetryOutcome, RetryPolicy};

// Presenter
pub use presenter::{JsonPresenter, ResultDocument};
