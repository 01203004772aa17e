//! SEC EDGAR access and the network-backed resolution strategies.
//!
//! This module provides:
//! - [`Fetch`], the HTTP seam, with the `reqwest`-backed [`EdgarClient`] and
//!   the in-memory [`MemoryFetcher`]
//! - filing index parsing and primary-document selection ([`index`])
//! - the listing-service fallback ([`listing`])

pub mod client;
pub mod index;
pub mod listing;
pub mod memory;

// Re-export main types
pub use client::{ACCEPT_HTML, ACCEPT_JSON, EdgarClient, Fetch};
pub use index::{IndexEntry, IndexStrategy, SelectionRule, parse_index, select_entry};
pub use listing::{ListingEntry, ListingStrategy, select_listing_entry};
pub use memory::MemoryFetcher;
