//! Pure data types for runpipe — exit statuses, pipeline events, reports.
//!
//! This crate is a leaf dependency with no async runtime and no I/O. It exists
//! so that consumers can render or store pipeline outcomes without pulling in
//! the process machinery of runpipe-kernel.

pub mod event;
pub mod report;
pub mod status;

// Flat re-exports for convenience
pub use event::*;
pub use report::*;
pub use status::*;
