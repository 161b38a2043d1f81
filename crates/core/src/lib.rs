//! HTTP API surface for the BloomNet kernel.
//!
//! Request parsing and status mapping only; all fleet semantics live in
//! `bloomnet-fleet`.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod handlers;
mod router;
mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::ApiContext;
