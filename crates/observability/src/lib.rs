//! Process-wide log setup shared by binaries and integration tests.

pub mod subscriber;

pub use subscriber::{LogFormat, init, init_with};
