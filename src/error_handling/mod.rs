//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions (initialization, scan input, URL rejection, transport)
//! - Failure categorization and the retry schedule
//! - Processing statistics tracking (failures and informational events)

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{
    categorize_status, categorize_transport_error, get_retry_strategy, is_retryable_status,
    is_retryable_transport, update_error_stats,
};
pub use stats::ProcessingStats;
pub use types::{ErrorType, InfoType, InitializationError, ScanError, TransportError, UrlRejection};
