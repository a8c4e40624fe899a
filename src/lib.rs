//! Discord outbound delivery adapter.
//!
//! One channel of a multi-channel message-routing host. Given a logical send
//! request (text, media, or poll), the adapter picks a transport (a
//! per-channel identity-branded webhook, or the shared bot API), splits
//! oversized text into ordered chunks, and returns a normalized delivery
//! receipt.
//!
//! See `DESIGN.md` for the path-selection rules and partial-failure contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod bot_api;
pub mod chunk;
pub mod config;
pub mod identity;
pub mod logging;
pub mod media;
pub mod outbound;
pub mod webhook;
