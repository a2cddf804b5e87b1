// LogRetrieval - core/mod.rs
//
// Core logic layer: data model, line filtering, path containment, and the
// backward line reader.
// Dependencies: standard library, regex, serde.
// Must NOT depend on: app, api, platform.

pub mod filter;
pub mod model;
pub mod path;
pub mod reverse;
