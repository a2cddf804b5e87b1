// LogRetrieval - app/mod.rs
//
// Application layer: the retrieval engine that ties path containment, the
// backward reader and filtering together over a real filesystem.
// Dependencies: core layer.
// Must NOT depend on: api, platform specifics.

pub mod engine;
