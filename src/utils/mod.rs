//! Utility functions

pub mod endpoint;
pub mod ids;
pub mod text;

pub use endpoint::cri_endpoint;
pub use ids::IdGenerator;
pub use text::{find_prefixed_line, parse_prefixed_value};
