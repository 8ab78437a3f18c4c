//! Coza Admin library.
//!
//! The admin panel as a library so the CLI and tests can reuse its
//! repositories and password hashing.
//!
//! # Security
//!
//! This crate writes the product catalog and user roles. Bind it to a
//! private interface; only users with the admin role can sign in.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
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
