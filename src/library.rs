//! Library index: the catalog boundary and the in-memory snapshot of it.
//!
//! The catalog itself is an external collaborator reached through the
//! [`Catalog`] trait. `DirCatalog` implements it over a local music folder;
//! the poller re-fetches on a fixed interval and on demand.

mod catalog;
mod index;
mod model;
mod poller;

pub use catalog::*;
pub use index::Library;
pub use model::*;
pub use poller::{CatalogPoller, spawn_poller};

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod tests;
