// SPDX-License-Identifier: GPL-3.0-or-later

//! MusicBrainz recording search used as the text-based fallback for release years.
//!
//! Every request is followed by a one-second pause, which keeps the client within
//! the MusicBrainz limit of one request per second per client.

pub mod client;
pub mod error;
pub mod models;
pub mod rate_limiter;

pub use client::{MusicBrainzClient, MusicBrainzExchange};
pub use error::{MusicBrainzError, Result};
pub use models::{years_from_search, Recording, RecordingSearchResponse, ReleaseRef, SearchQuery};
