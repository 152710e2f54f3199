#![allow(dead_code)]

pub mod fixtures;
pub mod test_doubles;

pub use fixtures::*;
pub use test_doubles::*;
