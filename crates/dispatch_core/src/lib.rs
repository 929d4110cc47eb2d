//! Ride-to-chair matching engine for a periodically triggered dispatch service.
//!
//! A pass reads pending rides and free chairs under lock-and-skip semantics,
//! drops chairs still busy with an earlier ride, lets a [`MatchingStrategy`]
//! pair them up and writes the assignments in the same transaction.

pub mod assigner;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod matching;
pub mod model;
pub mod pricing;
pub mod reader;
pub mod spatial;
pub mod store;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::{CommitPolicy, DispatchConfig};
pub use engine::{MatchingEngine, PassOutcome, PassReport};
pub use error::{DispatchError, StoreError};
pub use matching::{MatchingStrategy, StrategyKind};
pub use store::{DispatchStore, DispatchTx, InMemoryStore};
