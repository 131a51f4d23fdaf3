//! Domain entities - the values the admission engine reasons about.

mod admission;
mod campaign;
mod policy;
mod visitor;

pub use admission::{AdmissionResult, DenyReason, DisplayCounts};
pub use campaign::{Campaign, ScopeKey};
pub use policy::FrequencyPolicy;
pub use visitor::{VisitorContext, VisitorId};
