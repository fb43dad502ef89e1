//! CLI command implementations

pub mod bind;
pub mod inspect;
pub mod json_output;
pub mod locate;
pub mod rig;
pub mod topology;
pub mod validate;

mod reporting;
