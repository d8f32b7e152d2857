//! Snapshot of the resource kinds served by the API.

use std::sync::Arc;

use arc_swap::ArcSwap;
use kube::discovery::Discovery;

/// One served resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
}

impl ResourceKind {
    /// `group/version` (or just `version` for the core group).
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Latest discovery result, swapped atomically on each refresh.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    kinds: ArcSwap<Vec<ResourceKind>>,
}

impl ResourceCatalog {
    pub fn snapshot(&self) -> Arc<Vec<ResourceKind>> {
        self.kinds.load_full()
    }

    pub fn len(&self) -> usize {
        self.kinds.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace(&self, kinds: Vec<ResourceKind>) {
        self.kinds.store(Arc::new(kinds));
    }

    /// Replace the catalog with the preferred versions of a discovery run.
    pub fn update_from(&self, discovery: &Discovery) -> usize {
        let kinds: Vec<ResourceKind> = discovery
            .groups()
            .flat_map(|group| group.recommended_resources())
            .map(|(resource, _caps)| ResourceKind {
                group: resource.group,
                version: resource.version,
                kind: resource.kind,
                plural: resource.plural,
            })
            .collect();
        let count = kinds.len();
        self.replace(kinds);
        count
    }
}
