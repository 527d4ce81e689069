//! Persistent sync state.
//!
//! The only state kept between runs is the marker: the id of the newest item
//! seen by the most recent fresh walk, stored as plain text.

pub mod error;
pub mod marker;

pub use error::MarkerError;
pub use marker::{MarkerStore, SyncMarker};
