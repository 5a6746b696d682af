//! Core traits for meshdns
//!
//! This module defines the abstract interfaces that all collaborators implement.
//!
//! - [`RosterSource`]: Read the mesh peer roster
//! - [`ZoneProvider`]: List and mutate address records in a DNS zone

pub mod roster_source;
pub mod zone_provider;

pub use roster_source::RosterSource;
pub use zone_provider::ZoneProvider;
