//! Router Module Index
//!
//! Splits the routes by the guard that protects them. The guards themselves are attached in
//! `create_router`, so a route cannot end up in a module without its guard.

/// Routes reachable by anyone, signed in or not.
pub mod public;

/// Routes for USER actors, behind `require_user`.
pub mod authenticated;

/// Routes for ADMIN actors, behind `require_admin`.
pub mod admin;
