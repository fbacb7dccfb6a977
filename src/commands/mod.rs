// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports the sync and status commands

pub mod status;
pub mod sync;

pub use status::StatusOptions;
pub use sync::SyncOptions;
