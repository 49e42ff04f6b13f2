#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`PageGuardError`)
//! - [`config`]: Guard configuration (`PageGuardConfig`, `ClassifierConfig`, builder)
//! - [`platform`]: Remote platform API abstraction (`PlatformClient` trait, `HttpPlatformClient`)
//! - [`source`]: Monitored page source (`PageSource` trait, `ConfigPageSource`)
//! - [`content`]: Content generation capability (`ContentGenerator` trait, `ApiContentGenerator`)
//! - [`health`]: Health evaluation (`HealthEvaluator`, `SnapshotStore`)
//! - [`classifier`]: Issue detection (`IssueClassifier`)
//! - [`queue`]: Remediation queue (`RemediationQueue`)
//! - [`strategy`]: Fix strategies (`FixStrategy` trait, `StrategyRegistry`)
//! - [`executor`]: Fix state machine (`FixExecutor`)
//! - [`guard`]: Main controller (`PageGuard`, `PageGuardBuilder`)
//!
//! # Architecture
//!
//! ```text
//! timer tick --> PageGuard cycle
//!                    |
//!               fetch_metrics / evaluate / classify per page (bounded pool)
//!                    |
//!               RemediationQueue.merge()
//!                    |
//!               FixExecutor --> StrategyRegistry[issue_type].apply()
//!                    |
//!               GuardEvent --mpsc--> downstream
//! ```

pub mod classifier;
pub mod config;
pub mod content;
pub mod error;
pub mod executor;
pub mod guard;
pub mod health;
pub mod platform;
pub mod queue;
pub mod source;
pub mod strategy;

// --- Public API Re-exports ---

// Guard (main controller)
pub use guard::{GuardStatus, PageGuard, PageGuardBuilder};

// Configuration
pub use config::{ClassifierConfig, GuardConfigUpdate, PageGuardConfig};

// Error
pub use error::PageGuardError;

// Platform API
pub use platform::{HttpPlatformClient, PlatformClient};

// Page source
pub use source::{ConfigPageSource, PageSource};

// Content generation
pub use content::{ApiContentGenerator, ContentGenerator, ContentPurpose, ContentRequest, GeneratedContent};

// Health evaluation
pub use health::{HealthEvaluator, SnapshotStore};

// Classifier
pub use classifier::IssueClassifier;

// Queue
pub use queue::RemediationQueue;

// Strategies
pub use strategy::{FixStrategy, StrategyRegistry, StrategyReport};

// Executor
pub use executor::FixExecutor;
