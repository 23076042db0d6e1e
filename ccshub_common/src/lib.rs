mod helpers;
mod secret;

pub use helpers::{parse_boolean_flag, substring_pattern};
pub use secret::Secret;
