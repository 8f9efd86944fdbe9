#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stop dataset definitions and HTTP fetching.
//!
//! Each city the report covers is described by a TOML file embedded at
//! compile time (see [`registry`]). [`download::download_file`] retrieves
//! one archive verbatim onto local disk; decoding it is the unpack step's
//! job.

pub mod download;
pub mod progress;
pub mod registry;
pub mod source_def;

pub use download::{FetchError, download_file};
