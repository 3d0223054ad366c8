//! Lambda Envelope Workspace - end-to-end tests for envelope unwrapping and
//! validation.
//!
//! This is a virtual package that provides workspace-level integration tests.
//! The actual functionality is provided by the workspace member crates:
//!
//! - `lambda-envelope`: envelope strategies, schemas and the validation pipeline
//! - `lambda-envelope-tower`: Tower layer running the pipeline in front of a handler
