pub mod common;
pub mod policy;
