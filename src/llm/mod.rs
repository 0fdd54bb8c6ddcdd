//! Chat-completions inference with tool calling.

pub mod inference;

pub use inference::{ChatModel, InferenceClient, InferenceSettings};
