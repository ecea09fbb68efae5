//! NixOS GUI mock backend core library — transport-agnostic domain logic.
//!
//! `nixgui-core` holds everything the mock server knows about its "system"
//! without touching HTTP: who may log in, which packages exist, what the
//! simulated machine looks like, and how many requests a client may send.
//! The web crate (`nixgui-web`) wires these pieces into axum handlers.
//!
//! # Modules
//!
//! - [`rate_limit`] — Sliding-window request counter keyed by client address.
//! - [`users`] — [`User`] and the [`UserStore`] trait, plus the built-in demo credentials.
//! - [`catalog`] — [`PackageRecord`], the [`PackageCatalog`] trait and package search.
//! - [`fixtures`] — Canned services, configuration text and system stats.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod catalog;
pub mod error;
pub mod fixtures;
pub mod rate_limit;
pub mod users;

pub use catalog::{search_packages, PackageCatalog, PackageRecord, StaticCatalog, MIN_QUERY_LEN};
pub use error::{CoreError, CoreResult};
pub use fixtures::{Service, SystemStats, ValidationReport};
pub use rate_limit::SlidingWindowLimiter;
pub use users::{DemoUserStore, User, UserStore};
