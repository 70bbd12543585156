pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod id;
pub mod ingestion;
pub mod transcription;
