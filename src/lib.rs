//! # Valet (Parking Slot Allocation)
//!
//! `valet` manages a fixed-size pool of parking slots behind a small HTTP API.
//! Authenticated clients park a vehicle (the lowest free slot is assigned),
//! inspect a slot by index, and unpark a vehicle by its license plate.
//!
//! ## Slot Store
//!
//! The [`lot::SlotStore`] is the only shared mutable state. A single
//! reader/writer lock guards the whole table, so allocation is an atomic
//! scan-and-claim and two concurrent parks can never land on the same slot.
//! Inspections share the read half and never observe a partial update.
//!
//! ## Access Control
//!
//! - **Login:** `POST /login` trades a username/password (bcrypt-verified) for a
//!   short-lived HS256 bearer token.
//! - **Rate limits:** login and lot routes are limited per client IP; lot routes are also
//!   limited per authenticated user.
//!
//! Both run as middleware in front of the handlers and never touch the store.
//!
//! State lives in memory only; a restart empties the lot.

pub mod api;
pub mod auth;
pub mod cli;
pub mod lot;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
