//! Configuration options for the library
//!
//! There is no process-global state; all behavior switches are threaded
//! through [`ParseOptions`] and [`WriteOptions`] explicitly.

mod parse_options;
mod write_options;

pub use parse_options::{ParseOptions, ParsingMode};
pub use write_options::WriteOptions;
