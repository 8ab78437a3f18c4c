//! Coza storefront library.
//!
//! The binary in `main.rs` wires these modules into a server; keeping them in
//! a library lets handler tests drive the router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
