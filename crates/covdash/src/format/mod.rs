//! Row/table formatters.
//!
//! Each formatter maps fetched entities into display-ready rows. They are
//! pure and never fail: malformed input degrades to fewer rows or placeholder
//! cells, and formatting the same input twice gives the same rows.

pub mod branch;
pub mod commits;
pub mod comparison;
pub mod flags;
pub mod paged;
pub mod pulls;
pub mod usage;
pub mod users;

pub use comparison::{Cell, UploadGlyph};
pub use paged::PagedCollection;
