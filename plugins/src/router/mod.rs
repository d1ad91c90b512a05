mod llm;
mod prompt;

pub use llm::{parse_classification, LlmIntentRouter};
