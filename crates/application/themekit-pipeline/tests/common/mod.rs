#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use themekit_core::{
    GlobalElementType, PageUpsert, ResourceListing, SiteGlobalElement, SitePage, SiteSetting,
    ThemeFileMeta, ThemeTarget,
};
use themekit_infra::{ContentError, ContentSource, RemoteClient, RemoteError};
use themekit_pipeline::{TaskManager, TaskManagerConfig};

/// In-memory remote. Every mutating call is logged as `"<op> <subject>"`, where the
/// subject is the theme path for files and the resource name otherwise.
#[derive(Default)]
pub struct FakeRemote {
    pub calls: Mutex<Vec<String>>,
    pub denied: Mutex<HashSet<String>>,
    pub broken: Mutex<HashSet<String>>,
    pub slow: Mutex<HashSet<String>>,
    pub listing: Mutex<ResourceListing>,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub upserts: Mutex<HashMap<String, Value>>,
    next_id: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deny(&self, subject: &str) {
        self.denied.lock().unwrap().insert(subject.to_string());
    }

    pub fn break_subject(&self, subject: &str) {
        self.broken.lock().unwrap().insert(subject.to_string());
    }

    pub fn slow_down(&self, subject: &str) {
        self.slow.lock().unwrap().insert(subject.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn call(&self, op: &str, subject: &str) -> Result<(), RemoteError> {
        if self.slow.lock().unwrap().contains(subject) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.calls.lock().unwrap().push(format!("{op} {subject}"));
        if self.denied.lock().unwrap().contains(subject) {
            return Err(RemoteError::from_status(403, subject, "forbidden"));
        }
        if self.broken.lock().unwrap().contains(subject) {
            return Err(RemoteError::from_status(500, subject, "server error"));
        }
        Ok(())
    }

    fn page(&self, id: String, page: &PageUpsert) -> SitePage {
        SitePage {
            id,
            route: page.route.clone(),
            name: page.name.clone(),
            site_id: "site".into(),
            properties: page.properties.clone(),
        }
    }
}

#[async_trait::async_trait]
impl RemoteClient for FakeRemote {
    async fn list_theme_files(&self, _: &ThemeTarget) -> Result<Vec<ThemeFileMeta>, RemoteError> {
        Ok(self.listing.lock().unwrap().theme_files.clone())
    }

    async fn list_global_elements(
        &self,
        _: &ThemeTarget,
    ) -> Result<Vec<SiteGlobalElement>, RemoteError> {
        Ok(self.listing.lock().unwrap().global_elements.clone())
    }

    async fn list_pages(&self, _: &ThemeTarget) -> Result<Vec<SitePage>, RemoteError> {
        Ok(self.listing.lock().unwrap().pages.clone())
    }

    async fn list_settings(&self, _: &ThemeTarget) -> Result<Vec<SiteSetting>, RemoteError> {
        Ok(self.listing.lock().unwrap().settings.clone())
    }

    async fn download_theme_file(
        &self,
        _: &ThemeTarget,
        path: &str,
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        self.call("download_theme_file", path).await?;
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    async fn upsert_theme_file(
        &self,
        _: &ThemeTarget,
        path: &str,
        content: Vec<u8>,
    ) -> Result<(), RemoteError> {
        self.call("upsert_theme_file", path).await?;
        self.files.lock().unwrap().insert(path.to_string(), content);
        Ok(())
    }

    async fn delete_theme_file(&self, _: &ThemeTarget, path: &str) -> Result<(), RemoteError> {
        self.call("delete_theme_file", path).await
    }

    async fn upsert_global_element(
        &self,
        _: &ThemeTarget,
        name: &str,
        element_type: GlobalElementType,
        properties: &Value,
    ) -> Result<(), RemoteError> {
        self.call(&format!("upsert_{}", element_type.as_str()), name)
            .await?;
        self.upserts
            .lock()
            .unwrap()
            .insert(name.to_string(), properties.clone());
        Ok(())
    }

    async fn delete_global_element(
        &self,
        _: &ThemeTarget,
        name: &str,
        element_type: GlobalElementType,
    ) -> Result<(), RemoteError> {
        self.call(&format!("delete_{}", element_type.as_str()), name)
            .await
    }

    async fn upsert_setting(
        &self,
        _: &ThemeTarget,
        name: &str,
        properties: &Value,
    ) -> Result<(), RemoteError> {
        self.call("upsert_setting", name).await?;
        self.upserts
            .lock()
            .unwrap()
            .insert(name.to_string(), properties.clone());
        Ok(())
    }

    async fn delete_setting(&self, _: &ThemeTarget, name: &str) -> Result<(), RemoteError> {
        self.call("delete_setting", name).await
    }

    async fn create_page(
        &self,
        _: &ThemeTarget,
        page: &PageUpsert,
    ) -> Result<SitePage, RemoteError> {
        self.call("create_page", &page.name).await?;
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(self.page(id, page))
    }

    async fn update_page(
        &self,
        _: &ThemeTarget,
        page_id: &str,
        page: &PageUpsert,
    ) -> Result<SitePage, RemoteError> {
        self.call("update_page", &format!("{}#{}", page.name, page_id))
            .await?;
        Ok(self.page(page_id.to_string(), page))
    }

    async fn delete_page(&self, _: &ThemeTarget, page_id: &str) -> Result<(), RemoteError> {
        self.call("delete_page", page_id).await
    }
}

/// Theme directory held in memory, keyed by normalized theme path.
#[derive(Default)]
pub struct MemoryContent {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryContent {
    pub fn with_files(files: &[(&str, &str)]) -> Arc<Self> {
        let content = Self::default();
        {
            let mut map = content.files.lock().unwrap();
            for (path, body) in files {
                map.insert(path.to_string(), body.as_bytes().to_vec());
            }
        }
        Arc::new(content)
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

fn not_found(path: &str) -> ContentError {
    ContentError::Io {
        path: path.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
    }
}

#[async_trait::async_trait]
impl ContentSource for MemoryContent {
    async fn file_size(&self, path: &str) -> Result<Option<u64>, ContentError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(path)
            .map(|b| b.len() as u64))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, ContentError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<(), ContentError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }
}

pub fn target() -> ThemeTarget {
    ThemeTarget::new("site", "theme-1")
}

pub fn manager(remote: &Arc<FakeRemote>, content: &Arc<MemoryContent>) -> TaskManager {
    TaskManager::new(TaskManagerConfig::new(
        target(),
        remote.clone(),
        content.clone(),
    ))
}

pub fn site_page(name: &str, id: &str, properties: &str) -> SitePage {
    SitePage {
        id: id.into(),
        route: format!("/{name}"),
        name: name.into(),
        site_id: "site".into(),
        properties: properties.into(),
    }
}
