//! Domains module containing business logic organized by bounded contexts.
//!
//! The server currently has a single domain, `tools`, which turns the
//! endpoint catalog into callable MCP tools.

pub mod tools;
