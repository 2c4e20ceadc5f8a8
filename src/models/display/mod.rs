//! Display model implementations for table and JSON output

mod reference;
mod run;
mod value;

pub use reference::ReferenceDisplay;
pub use run::RunDisplay;
pub use value::{cache_stats_fields, priced_value_fields, upstream_value_fields};
