// ABOUTME: Library module for migratedb
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod connect;
pub mod engine;
pub mod error;
pub mod migration;
pub mod utils;
