pub mod account;
pub mod accounting;
pub mod cli;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod error;
pub mod interactive;
