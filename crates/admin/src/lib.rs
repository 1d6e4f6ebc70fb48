//! Stridewell Admin library.
//!
//! This crate provides the back-office API as a library, so the binary, the
//! CLI, and the tests share one implementation.
//!
//! # Security
//!
//! This crate writes products, changes user roles, and deletes payments.
//! Every route except login requires a signed-in admin, re-checked against
//! the database on each request.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
