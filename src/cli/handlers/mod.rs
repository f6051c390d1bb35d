//! Command handlers, kept apart from parsing and dispatch.

pub mod migrate;
pub mod serve;

pub use migrate::MigrateCommandHandler;
pub use serve::ServeCommandHandler;
