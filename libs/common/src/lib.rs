//! Common library for the Stockroom application
//!
//! This crate provides shared functionality used across the workspace,
//! including database connectivity and error handling.

pub mod database;
pub mod error;
