//! Core of the operator gateway: sandbox policy, command execution and the
//! approval state machine that sits between them.

pub mod api;
pub mod approval;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod memory;
pub mod policy;
