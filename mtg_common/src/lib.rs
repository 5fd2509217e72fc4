//! Shared MTG types used across the workspace.
//!
//! Holds the Scryfall wire format, card identifiers and print finishes so the
//! importer and any other tool agree on one representation.

pub mod error;
pub mod finish;
pub mod identifiers;
pub mod scryfall;

pub use error::{CatalogError, CatalogResult};
pub use finish::Finish;
pub use identifiers::{CardIdentifier, FallbackId, LookupKey};
pub use scryfall::{
    CollectionRequest, CollectionResponse, ScryfallCard, ScryfallError, ScryfallPrices,
    MAX_COLLECTION_IDENTIFIERS,
};
