#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, DatabaseError, ScanError, ScanwardError};

// 설정
pub use config::ScanwardConfig;

// 헬스 상태
pub use pipeline::{BoxFuture, HealthStatus};

// 도메인 타입
pub use types::Severity;
