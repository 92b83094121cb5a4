//! Remote model catalog.
//!
//! [`HubClient`] talks to the registry. The resolver depends only on the
//! [`CatalogSource`] trait so tests and hosts can substitute their own source.

mod client;
mod types;
mod wire;

pub use client::HubClient;
pub use types::{sort_by_priority, ArtifactFile, CatalogEntry};
pub use wire::{decode_entries, decode_files, excerpt};

use async_trait::async_trait;

/// A source of catalog listings.
///
/// Both operations report "nothing" as an empty list; failures are handled
/// inside the implementation.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Entries whose identifier starts with `namespace/`, in source order.
    async fn list_entries(&self, namespace: &str) -> Vec<CatalogEntry>;

    /// Artifacts of `entry_id`, best quantization first.
    async fn list_files(&self, entry_id: &str) -> Vec<ArtifactFile>;
}
