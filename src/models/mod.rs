//! Display models for CLI output
//!
//! Converts cache and API types into table rows and field views.

pub mod display;

pub use display::{ReferenceDisplay, RunDisplay};
