//! Endpoint and override declarations.
//!
//! Each file declares the endpoints of one resource domain and the
//! overrides that give some of them richer schemas:
//! - `mail`: messages, folders, sending mail
//! - `calendar`: events, calendar views
//! - `files`: drives and drive items
//! - `users`: the signed-in user, directory users and Teams (work-scoped)
//!
//! Adding an endpoint only requires declaring it here; the binder turns
//! every surviving descriptor into a tool.

pub mod calendar;
pub mod common;
pub mod files;
pub mod mail;
pub mod users;

use super::catalog::EndpointDescriptor;
use super::overrides::OverrideRegistry;

/// Every endpoint declared by the server, in catalog order.
pub fn all_endpoints() -> Vec<EndpointDescriptor> {
    let mut endpoints = Vec::new();
    endpoints.extend(users::endpoints());
    endpoints.extend(mail::endpoints());
    endpoints.extend(calendar::endpoints());
    endpoints.extend(files::endpoints());
    endpoints
}

/// Register every override declared by the server.
pub fn register_overrides(registry: &mut OverrideRegistry) {
    mail::register_overrides(registry);
    calendar::register_overrides(registry);
    files::register_overrides(registry);
    users::register_overrides(registry);
}
