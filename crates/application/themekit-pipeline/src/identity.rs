use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use themekit_core::path_utils::ThemePath;
use themekit_core::SitePage;

/// Maps page names to remote page ids.
///
/// A page path only carries the page name, so updates and deletes resolve the id here.
/// Handlers record ids after a successful create/update and forget them after a delete.
#[derive(Debug, Default)]
pub struct PageIdentityStore {
    ids: RwLock<HashMap<String, String>>,
}

impl PageIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages(pages: &[SitePage]) -> Self {
        let store = Self::new();
        store.seed(pages);
        store
    }

    /// Replace the contents with the given listing.
    pub fn seed(&self, pages: &[SitePage]) {
        let mut ids = self.ids.write().unwrap_or_else(PoisonError::into_inner);
        ids.clear();
        ids.extend(pages.iter().map(|p| (p.name.clone(), p.id.clone())));
    }

    pub fn id_for_name(&self, name: &str) -> Option<String> {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Resolve a page path (`/site/pages/<name>.json`) to its remote id.
    pub fn id_for_path(&self, path: &str) -> Option<String> {
        self.id_for_name(&ThemePath::resource_name(path))
    }

    pub fn record(&self, page: &SitePage) {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page.name.clone(), page.id.clone());
    }

    pub fn forget(&self, name: &str) {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    pub fn len(&self) -> usize {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
