//! Option sets, typed option schema and the single-change delta engine.

pub mod delta;
pub mod schema;
pub mod set;

pub use delta::{OptionChange, OptionDelta, overlay, resolve};
pub use schema::{AsrOptions, OptionGroup, OutputOptions, PipelineOptions, VadOptions, option_group};
pub use set::{OptionSet, encode_component, is_truthy, parse_value, value_label, values_equal};
