//! HTTP response comparison between two implementations of the same API
//!
//! Replays a declarative list of endpoint requests against a reference
//! server (the pre-migration implementation, treated as the correctness
//! baseline) and a candidate server (its migrated replacement), and
//! reports status-code, body, and selected-header mismatches.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      ┌─────────────────┐
//! │  Reference      │      │  Candidate      │
//! │  (pre-migration)│      │  (migrated)     │
//! └────────┬────────┘      └────────┬────────┘
//!          │                        │
//!          └──────────┬─────────────┘
//!                     │
//!              ┌──────▼──────┐
//!              │  Comparator │
//!              └─────────────┘
//! ```

pub mod client;
pub mod compare;
pub mod config;
pub mod error;
pub mod harness;

pub use compare::{ComparisonResult, DiffKind, Difference};
pub use config::{load_endpoints, EndpointSpec};
pub use error::{CompareError, CompareResult};
pub use harness::{Comparator, Report};
