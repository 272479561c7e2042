//! QuoteNest server library.
//!
//! Email/password accounts and the per-user document store that
//! `qn` and other clients sync saved quotes into.

pub mod server;
