//! Nothing marker, dotted paths, and fail-soft deep lookup.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod path;
pub mod types;

pub use error::{NestkitError, NestkitResult};
pub use path::{deep_get, deep_get_or_else, step, Path, DELIMITER};
pub use types::{is_nothing, Lookup, Node};
