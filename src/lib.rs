//! Core library for the equipstate-tools command line application.
//!
//! The library converts hierarchical equipment-state definitions between
//! their nested markup form and a flat tabular form, and validates the
//! tabular form before it is turned back into markup. The modules are
//! structured to keep responsibilities narrow and composable: IO adapters
//! live under [`io`], the node tree in [`model`], the tabular form in
//! [`table`], the two codec directions in [`flatten`] and [`reconstruct`],
//! the integrity rules in [`validate`], and the file-to-file orchestration
//! under [`sync`].

pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod reconstruct;
pub mod sync;
pub mod table;
pub mod validate;

pub use error::{Result, ToolError};
