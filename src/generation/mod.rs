//! Prompt construction for the critique generation call

pub mod prompt;

pub use prompt::PromptBuilder;
