//! Stridewell Storefront library.
//!
//! This crate provides the public shopping API as a library, so the binary
//! and the tests build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
