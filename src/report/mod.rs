//! Presentation of resolved plugins
//!
//! Each surface takes the [`Resolution`](crate::freshness::resolver::Resolution)
//! list produced by the resolver and only decides how to render it.
//!
//! - [`annotation`]: short per-plugin label
//! - [`table`]: plain-text table of resolved plugins
//! - [`health`]: aggregate pass/critical check

pub mod annotation;
pub mod health;
pub mod table;
