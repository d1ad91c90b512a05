mod ollama;

pub use ollama::{ModelDetection, OllamaClient, OllamaMessage};
