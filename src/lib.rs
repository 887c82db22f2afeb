//! # Varco (Gate Dispatch Service)
//!
//! `varco` forwards one opaque caller value at a time to a rotating pool of
//! remote **gate** endpoints and reports back the message each gate returns.
//!
//! ## Dispatch pipeline
//!
//! Every dispatch walks the same fixed pipeline:
//!
//! 1. Pick one gate from the pool, uniformly at random.
//! 2. `POST` a fixed-shape JSON payload carrying the value to
//!    `https://{gate}/runserver/`.
//! 3. Pace: wait a fixed delay after the submission attempt completes,
//!    whether it succeeded or not.
//! 4. Scan the raw response body for the substring between `"message":"`
//!    and the next `"`; a miss yields no message rather than an error.
//!
//! The pool is built once at startup from `VARCO_GATE_LIST`
//! (comma-separated hostnames) and never mutated afterwards; when the list
//! is absent or empty a single built-in fallback gate is used.
//!
//! ## HTTP surface
//!
//! - `POST /gate/{gate_number}`: urlencoded form with one `value` field,
//!   answered with a `{value} => {message}` text line. The numeric path
//!   parameter is accepted for compatibility but does not influence gate
//!   selection.
//! - `GET /health`: service metadata for probes.

pub mod api;
pub mod cli;
pub mod gate;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
