// ABOUTME: Sync module for one-way MySQL to SQLite replication
// ABOUTME: Schema reconciliation, row-count change detection, and transactional upserts

pub mod driver;
pub mod reconciler;
pub mod state;
pub mod table;
pub mod writer;

pub use driver::{SyncDriver, SyncReport, SyncStage, TableReport, TableStatus};
pub use reconciler::{ReconcileResult, Reconciler};
pub use state::{SyncState, TableSyncRecord};
pub use table::{sync_table, TableSyncOutcome};
pub use writer::{ApplyStats, ChangeWriter};
