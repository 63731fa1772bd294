// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports the migrate and validate entry points

pub mod migrate;
pub mod validate;

pub use migrate::migrate;
pub use validate::validate;
