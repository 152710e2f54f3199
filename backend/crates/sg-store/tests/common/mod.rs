#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;
pub mod test_store;

pub use fixtures::*;
pub use log_capture::*;
pub use test_store::*;
