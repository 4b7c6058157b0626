pub mod auth;
pub mod build_info;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod envelope;
pub mod ingest;
pub mod logging;
pub mod riot_client;
pub mod server;
pub mod state;
pub mod stats;
pub mod store;
pub mod tags;
