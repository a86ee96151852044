//! Standalone messenger view over the widget runtime.
//!
//! Run with: `cargo run --bin chatframe-messenger`
//!
//! Environment:
//! - `CHATFRAME_API_URL`: widget API base URL (default `http://127.0.0.1:8080`)
//! - `CHATFRAME_TENANT`: tenant key (default `default`)
//! - `CHATFRAME_DATA_PATH`: `SQLite` path for durable identity (in-memory if unset)
//! - `CHATFRAME_HTML`: set to `1` to print agent messages as rendered HTML

use std::process::ExitCode;

fn main() -> ExitCode {
    chatframe::start_messenger::run()
}
