//! Last-updated lookup pipeline
//!
//! Resolves when a plugin was last updated in the registry, keeps the answer
//! for a bounded time, and classifies it as stale or fresh.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Store    │◀────│  Resolver   │
//! │  (fetch)    │     │ (TTL cache) │     │ (pipeline)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │ Registries  │                         │  Staleness  │
//! │ (wordpress) │                         │ (evaluator) │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: `LookupStore` trait, cache keys and the SQLite store
//! - [`memory`]: process-local store
//! - [`clock`]: injectable wall clock
//! - [`registry`]: Registry trait for fetching last-updated dates
//! - [`registries`]: Concrete registry implementations
//! - [`resolver`]: cache-through lookup and staleness resolution
//! - [`staleness`]: date parsing and the two-year rule
//! - [`error`]: Error types for cache and registry operations
//! - [`types`]: Lookup outcome types

pub mod cache;
pub mod clock;
pub mod error;
pub mod memory;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod staleness;
pub mod types;
