//! Prompt construction for labeling runs.

pub mod template;

pub use template::LabelPromptTemplate;
