//! Domain services used by HTTP routes and the bot worker.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business rules and persistence so route handlers
//! stay focused on request decoding and auth plumbing.

pub mod admin;
pub mod bot;
pub mod quiz;
