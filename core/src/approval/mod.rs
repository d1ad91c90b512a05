//! Approval lifecycle and run records.

mod service;
mod store;
mod types;

pub use service::ApprovalService;
pub use store::{ApprovalStore, InMemoryApprovalStore, StatusTransition};
pub use types::{Approval, ApprovalStatus, Run};
