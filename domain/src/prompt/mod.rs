//! Prompt construction for the synthesis step.

pub mod template;

pub use template::PromptTemplate;
