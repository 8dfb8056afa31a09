//! HTTP API surface.
pub mod bootstrap;
pub mod error;
pub mod extract;
pub mod groups;
pub mod openapi;
pub mod permissions;
pub mod system;
pub mod types;
