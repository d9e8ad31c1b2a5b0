pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod processing;
pub mod summarize;
pub mod transcription;
