//! Domain types, confidence classification, request guards, and configuration
//! shared by every document-intelligence crate.

pub mod confidence;
pub mod config;
pub mod error;
pub mod flight;
pub mod types;

pub use confidence::{classify, ConfidenceBadge, ConfidenceTier, GuardrailStatus};
pub use config::DocIntelConfig;
pub use error::{DocIntelError, Result};
pub use flight::{FlightPermit, RequestState, SingleFlight};
pub use types::*;
