//! Provider-side publication table.
//!
//! Maps a canonical URL onto its publication record: the provider descriptor
//! (with the listener's *resolved* binding written back) and whether the
//! service is currently announced to discovery. Registration is last writer
//! wins; there is no duplicate-detection error. The registry sequences the
//! listener/announce side effects — this table only holds state.

use dashmap::DashMap;

use crate::descriptor::{ProviderDescriptor, ServerBinding};

struct Publication {
    descriptor: ProviderDescriptor,
    published: bool,
}

/// Canonical-URL-keyed store of provider publications.
#[derive(Default)]
pub struct PublicationRegistry {
    entries: DashMap<String, Publication>,
}

impl PublicationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` under its (already canonical) URL, replacing any
    /// prior record for that URL.
    pub fn register(&self, descriptor: ProviderDescriptor) {
        let url = descriptor.url.clone();
        tracing::debug!(url = %url, interface = %descriptor.interface, "registering provider");
        self.entries.insert(
            url,
            Publication {
                descriptor,
                published: false,
            },
        );
    }

    /// Persist the transport's resolved binding onto the record, so later
    /// lookups observe the actual listener configuration.
    pub fn set_resolved_binding(&self, url: &str, binding: ServerBinding) -> bool {
        match self.entries.get_mut(url) {
            Some(mut entry) => {
                entry.descriptor.server = binding;
                true
            }
            None => false,
        }
    }

    /// Flip the announced-to-discovery marker.
    pub fn mark_published(&self, url: &str, published: bool) -> bool {
        match self.entries.get_mut(url) {
            Some(mut entry) => {
                entry.published = published;
                true
            }
            None => false,
        }
    }

    /// Delete the record. Returns the removed descriptor, if any.
    pub fn remove(&self, url: &str) -> Option<ProviderDescriptor> {
        self.entries.remove(url).map(|(_, entry)| entry.descriptor)
    }

    /// Pure lookup of the stored descriptor.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<ProviderDescriptor> {
        self.entries.get(url).map(|entry| entry.descriptor.clone())
    }

    /// Whether the URL is currently announced to discovery.
    #[must_use]
    pub fn is_published(&self, url: &str) -> Option<bool> {
        self.entries.get(url).map(|entry| entry.published)
    }

    /// Snapshot of every registered canonical URL, for the bulk operations.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
