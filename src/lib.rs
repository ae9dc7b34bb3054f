//! # tabsync
//!
//! Row-level table diffing and synchronization. Two row-sets are correlated
//! into a delimited diff stream, the stream is compiled into batched
//! parameterized SQL grouped by update shape, and the batches are applied to a
//! destination store.

pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod data;
pub mod differ;
pub mod error;
pub mod model;
pub mod output;
pub mod patch;
pub mod progress;
pub mod sql;
pub mod sync;

pub use codec::{Delimiter, DiffCodec};
pub use config::EngineConfig;
pub use data::DuckDbStore;
pub use differ::{DiffStats, TableDiffer};
pub use error::{Result, TabsyncError};
pub use model::{Column, DiffRow, Header, Key, RowSet, RowTag};
pub use patch::{ApplyReport, PatchApplier, StoreExecutor};
pub use sql::{DiffToSqlCompiler, StatementGroup, StatementKind};
pub use sync::{RowSource, SourceRef, SyncOrchestrator, SyncReport};
