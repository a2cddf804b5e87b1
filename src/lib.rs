// LogRetrieval - lib.rs
//
// Library entry point. The binary in `main.rs` is a thin shell over these
// modules; integration tests drive them directly.

pub mod api;
pub mod app;
pub mod core;
pub mod platform;
pub mod util;
