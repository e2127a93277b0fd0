//! Incident Module
//!
//! ## Structure
//! - `types.rs` - `IncidentClass` (closed set + penalty table), `IncidentRecord`
//! - `ledger.rs` - append-only session ledger
//! - `export.rs` - CSV / JSON export for the audit dashboard

pub mod types;
pub mod ledger;
pub mod export;

pub use types::{IncidentClass, IncidentRecord};
pub use ledger::IncidentLedger;
pub use export::{export_incidents, ExportFormat};
