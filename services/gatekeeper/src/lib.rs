//! Gatekeeper service library crate.
//!
//! # Purpose
//! Exposes the permission engine (authority, hierarchy resolver, membership
//! workflow), the HTTP API surface, configuration, and storage implementations
//! for use by the binary and tests.
//!
//! # Notes
//! Module boundaries follow the data flow: `engine` evaluates, `store`
//! persists, `api` translates HTTP, and `model` is the shared vocabulary.
pub mod api;
pub mod app;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod store;
