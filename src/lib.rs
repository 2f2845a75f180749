//! Template Museum — a deliberately vulnerable educational web application.
//!
//! Demonstrates Server-Side Template Injection (SSTI) inside a restricted
//! templating sandbox: the display name a visitor registers with is spliced
//! into the preview page's template source and evaluated, while the sandbox
//! exposes only two whitelisted helpers and blocks attribute traversal into
//! internal object graphs.
//!
//! Everything here is simulated. No shell commands run, no real secrets
//! leak; each user gets a per-account practice flag at registration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Password hashing, flag generation, and session management.
pub mod auth;
/// Configuration loading and validation.
pub mod config;
/// SQLite credential store for user records.
pub mod db;
/// Structured logging setup.
pub mod logging;
/// Restricted template sandbox: helper whitelist and attribute policy.
pub mod sandbox;
/// Simulated shell transcripts shown on the educational page.
pub mod shells;
/// HTTP routes and page markup.
pub mod web;
