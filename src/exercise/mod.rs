//! Study material produced by the language model.
//!
//! [`Generator`] owns a [`TextModel`](crate::llm::TextModel) and exposes one
//! operation per exercise type. Every reply is parsed into a typed value and
//! checked before it is handed back.

pub mod generator;
pub mod prompts;
pub mod types;

use thiserror::Error;

use crate::llm::ModelError;

pub use generator::{Generator, READING_QUIZ_QUESTIONS};
pub use types::{MindMapNode, QuizAnswer, QuizKind, QuizQuestion, UsageVerdict, VocabularyEntry};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("{0} is empty")]
    EmptyInput(&'static str),

    #[error("got {words} words but {sentences} sentences")]
    LengthMismatch { words: usize, sentences: usize },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{what} does not match the expected shape: {source}")]
    Shape {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("{what} is invalid: {reason}")]
    Invalid { what: &'static str, reason: String },
}
