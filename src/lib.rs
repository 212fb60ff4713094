//! Foliant wiki content engine.
//!
//! Turns stored raw wiki markup into sanitized, link-resolved HTML and keeps
//! a set of namespaced caches coherent with every content mutation. The crate
//! is transport-agnostic: web framework, authentication, persistence and view
//! rendering live behind the trait boundaries in [`application::repos`].
//!
//! Layering follows the usual split:
//!
//! - [`domain`] — entities and derived projections (pages, versions, views)
//! - [`application`] — the markup transform pipeline and the engine facade
//! - [`cache`] — key namespaces, stores, and the mutation coordinator
//! - [`config`] — typed settings with file/env layering
//! - [`infra`] — telemetry bootstrap

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
