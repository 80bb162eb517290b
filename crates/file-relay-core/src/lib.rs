#![deny(missing_docs)]
//! File relay core library.
//!
//! Upload sessions, link storage, link resolution and event dispatch,
//! independent of the chat transport that feeds them.

/// Configuration management.
pub mod config;
/// Inbound event routing.
pub mod dispatch;
/// Shared file, session and link types.
pub mod model;
/// Link resolution and media replay.
pub mod resolver;
/// Upload sessions and their controller.
pub mod session;
/// Storage layer for link records (MongoDB, R2, in-memory).
pub mod storage;
/// Outbound media transport contract.
pub mod transport;

#[cfg(test)]
pub mod testing;
