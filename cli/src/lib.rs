//! SeoLens CLI library: input reading, one-shot analysis and terminal display.
//!
//! Used by the `seolens` binary. [`run_once`] drives a single submission through a
//! [`FormController`](seolens::FormController) so the same local bounds apply as in the server.

pub mod display;
pub mod run;

pub use display::{format_operations, format_view};
pub use run::{read_content, run_once, RunError};
