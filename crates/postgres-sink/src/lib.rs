//! PostgreSQL sink for debezium-apply.
//!
//! Takes decoded Debezium change events and reproduces them on a target
//! PostgreSQL database:
//!
//! - [`statement`] - operation-specific SQL construction with positional
//!   parameters
//! - [`value`] - binding schema-less JSON values to server-declared
//!   parameter types
//! - [`apply`] - dispatch on the operation code and execution through the
//!   [`apply::Execute`] capability
//! - [`sync`] - the apply loop: one message at a time, in arrival order,
//!   until shutdown
//!
//! Each message is processed independently; the only shared state is the
//! database connection. A message that fails is logged and skipped, never
//! retried here.

pub mod apply;
pub mod error;
pub mod statement;
pub mod sync;
pub mod testing;
pub mod value;

pub use apply::{apply_change, apply_message, Execute};
pub use error::{ApplyError, Result};
pub use statement::{build_delete, build_insert, build_update, quote_ident, Statement};
pub use sync::{run_apply_loop, ApplyStats};
pub use value::PgJson;
