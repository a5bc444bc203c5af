use crate::{
    GlobalElementType, RemoteResource, ResourceKind, SiteGlobalElement, SitePage, SiteSetting,
};

pub struct ThemePath;

impl ThemePath {
    /// Forward slashes and exactly one leading `/`.
    /// This is the canonical form used for snapshots and task identity.
    pub fn normalize(path: &str) -> String {
        let path = path.replace('\\', "/");
        if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        }
    }

    /// Remote endpoints address theme files without the leading slash.
    pub fn strip_leading_slash(path: &str) -> &str {
        path.strip_prefix('/').unwrap_or(path)
    }

    fn parts(path: &str) -> Vec<&str> {
        // "/a/b.json" -> ["", "a", "b.json"], matching a split on the normalized form.
        let mut parts: Vec<&str> = Vec::new();
        if !path.starts_with('/') {
            parts.push("");
        }
        parts.extend(path.split('/'));
        parts
    }

    pub fn is_json(path: &str) -> bool {
        std::path::Path::new(path)
            .extension()
            .is_some_and(|ext| ext == "json")
    }

    pub fn is_theme_file(path: &str) -> bool {
        Self::parts(path).get(1) == Some(&"theme")
    }

    pub fn is_global_element_section(path: &str) -> bool {
        let parts = Self::parts(path);
        Self::is_json(path)
            && parts.len() == 5
            && parts[1] == "site"
            && parts[2] == "global"
            && parts[3] == "sections"
    }

    pub fn is_global_element_container(path: &str) -> bool {
        let parts = Self::parts(path);
        Self::is_json(path)
            && parts.len() == 5
            && parts[1] == "site"
            && parts[2] == "global"
            && parts[3] == "containers"
    }

    pub fn is_page(path: &str) -> bool {
        let parts = Self::parts(path);
        Self::is_json(path) && parts.len() == 4 && parts[1] == "site" && parts[2] == "pages"
    }

    pub fn is_setting(path: &str) -> bool {
        let parts = Self::parts(path);
        Self::is_json(path) && parts.len() == 4 && parts[1] == "site" && parts[2] == "settings"
    }

    /// Map a path onto the resource kind it addresses. Unknown shapes yield `None`
    /// and are never turned into tasks.
    pub fn classify(path: &str) -> Option<ResourceKind> {
        if Self::is_theme_file(path) {
            Some(ResourceKind::ThemeFile)
        } else if Self::is_global_element_container(path) || Self::is_global_element_section(path)
        {
            Some(ResourceKind::GlobalElement)
        } else if Self::is_page(path) {
            Some(ResourceKind::Page)
        } else if Self::is_setting(path) {
            Some(ResourceKind::Setting)
        } else {
            None
        }
    }

    pub fn global_element_type(path: &str) -> Option<GlobalElementType> {
        if Self::is_global_element_section(path) {
            Some(GlobalElementType::Section)
        } else if Self::is_global_element_container(path) {
            Some(GlobalElementType::Container)
        } else {
            None
        }
    }

    /// Resource name encoded in a structured resource path (the file stem).
    pub fn resource_name(path: &str) -> String {
        std::path::Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn global_element_path(element: &SiteGlobalElement) -> String {
        format!(
            "/site/global/{}/{}.json",
            element.element_type.dir_name(),
            element.name
        )
    }

    pub fn setting_path(setting: &SiteSetting) -> String {
        format!("/site/settings/{}.json", setting.name)
    }

    pub fn page_path(page: &SitePage) -> String {
        format!("/site/pages/{}.json", page.name)
    }

    /// Local target path for a downloaded resource.
    pub fn pull_path(resource: &RemoteResource) -> String {
        match resource {
            RemoteResource::ThemeFile(meta) => Self::normalize(&meta.path),
            RemoteResource::GlobalElement(element) => Self::global_element_path(element),
            RemoteResource::Page(page) => Self::page_path(page),
            RemoteResource::Setting(setting) => Self::setting_path(setting),
        }
    }
}
