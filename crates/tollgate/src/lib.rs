//! Tollgate request authentication: umbrella crate.
//!
//! This crate re-exports all Tollgate components for convenience.
//! Use feature flags to enable specific functionality.

#![doc = include_str!("../README.md")]

pub use tollgate_core as core;

#[cfg(feature = "jwt")]
pub use tollgate_jwt as jwt;

#[cfg(feature = "http")]
pub use tollgate_http as http;
