mod pipeline;

pub use pipeline::{AnthropicCompletion, CompletionService, LlmExtractionEngine};
