//! # Popcap Shared
//!
//! Wire types shared between the admission service and the storefront bundle.
//! Kept free of domain dependencies so it can be compiled for WASM.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
