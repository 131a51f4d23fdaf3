//! # Popcap Core
//!
//! The domain layer of the popup admission service.
//! Holds the campaign and visitor model, the counter store port, and the
//! frequency-capping engine that decides whether a popup may be shown.

pub mod domain;
pub mod error;
pub mod frequency;
pub mod ports;

pub use error::DomainError;
pub use frequency::{FrequencyCapper, FrequencyConfig};
