//! Test helpers shared by the unit tests
//!
//! Temporary ledgers that mine at difficulty 1 and hand-built chains with
//! chosen timestamps for exercising the difficulty controller.

pub mod test_utils;

pub use test_utils::*;
