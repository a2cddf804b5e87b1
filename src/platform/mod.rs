// LogRetrieval - platform/mod.rs
//
// Platform abstraction layer: config directory resolution and config.toml
// loading.
// Dependencies: app (engine settings), directories, toml.
// Must NOT depend on: api.

pub mod config;
