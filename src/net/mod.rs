//! Networking: the authenticated REST client and its stages.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` owns the transport, `auth` attaches credentials before sending,
//! `guard` tears the session down on 401, `config` holds connection
//! parameters, and `types` defines the error surface.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod types;
