//! Infrastructure layer - parsers, provider clients and session services

pub mod ingestion;
pub mod llm;
pub mod logging;
pub mod platform;
pub mod services;
