//! # relic-testing - Test support for relic records
//!
//! - **MemoryAdapter**: in-memory `PersistenceAdapter` that records every
//!   call and can be told to fail
//! - **HookRecorder**: lifecycle hooks that log their invocation order
//! - **Fixtures**: a comic-book registry and matching JSON records

pub mod fixtures;
pub mod hooks;
pub mod memory;

pub use hooks::{HookCall, HookRecorder};
pub use memory::{AdapterCall, MemoryAdapter};

use std::sync::Once;

use relic_record::{init_logging, LoggingConfig, RecordError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        fixtures, init_test_logging, AdapterCall, HookCall, HookRecorder, MemoryAdapter,
        TestError, TestResult,
    };

    pub use relic_record::*;
    pub use serde_json::{json, Value as JsonValue};
}

// Error handling
#[derive(thiserror::Error, Debug)]
pub enum TestError {
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Test setup error: {0}")]
    Setup(String),
}

pub type TestResult<T> = Result<T, TestError>;

static LOGGING: Once = Once::new();

/// Install the test logging preset once per process
pub fn init_test_logging() {
    LOGGING.call_once(|| init_logging(LoggingConfig::test()));
}
