//! Pluggable collaborators for the operator gateway: the Ollama-backed
//! intent classifier and the factory that wires default services.

pub mod factory;
pub mod llm;
pub mod router;
pub mod services;
