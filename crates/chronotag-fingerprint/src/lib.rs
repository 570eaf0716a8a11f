// SPDX-License-Identifier: GPL-3.0-or-later

//! Acoustic fingerprinting and AcoustID lookup for release-year resolution.
//!
//! This crate provides functionality for:
//! - Running the Chromaprint `fpcalc` tool to fingerprint audio files
//! - Looking fingerprints up on AcoustID with release metadata
//! - Extracting release-year candidates from the best AcoustID match

pub mod acoustid;
pub mod error;
pub mod fingerprint;
pub mod fpcalc;

pub use acoustid::{
    candidates_from_lookup, AcoustidClient, AcoustidExchange, LookupResponse, LookupResult,
};
pub use error::{FingerprintError, Result};
pub use fingerprint::FingerprintSample;
pub use fpcalc::Fpcalc;
