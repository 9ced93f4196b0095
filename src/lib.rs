pub mod cloze;
pub mod commands;
pub mod config;
pub mod digest;
pub mod exercise;
pub mod grading;
pub mod hangman;
pub mod llm;
pub mod news;
pub mod palette;
pub mod service;
pub mod store;
pub mod utils;
