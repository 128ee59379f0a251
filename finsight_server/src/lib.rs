//! # FinSight backend server
//! This crate hosts the HTTP backend for FinSight. It is responsible for:
//! Verifying Sign in with Apple identity assertions against the provider's published keys.
//! Minting and verifying the session tokens that authorize all subsequent requests.
//! Brokering bank-account linking through the aggregator API (see the `plaid_tools` crate).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/config`: The non-secret aggregator configuration summary.
//! * `/auth/apple`: Sign-in with an identity assertion; returns a session token.
//! * `/api/check_token`: Session introspection.
//! * `/api/banking/link-token`: Request a link token for the client-side linking UI.
//! * `/api/banking/set-access-token`: Exchange a public token and store the linked account.

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;

pub mod data_objects;
pub mod identity;
pub mod routes;
pub mod server;
pub mod store;

#[cfg(test)]
mod endpoint_tests;
