mod order;

pub use order::{compare_versions, parse_components, sort_descending};
