use serde::{Deserialize, Serialize};

pub mod diff;
pub mod hashing;
pub mod path_utils;
pub mod remote;

pub type Sha256Digest = String;

/// One resource's identity and content fingerprint inside a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileState {
    pub path: String,
    pub hash: Option<Sha256Digest>,
}

impl FileState {
    pub fn new(path: impl Into<String>, hash: impl Into<Option<String>>) -> Self {
        Self {
            path: path.into(),
            hash: hash.into(),
        }
    }
}

/// Point-in-time view of a theme, either local or remote.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeState {
    pub files: Vec<FileState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaState {
    pub create: Vec<FileState>,
    pub update: Vec<FileState>,
    pub delete: Vec<FileState>,
}

impl DeltaState {
    pub fn has_changes(&self) -> bool {
        !self.create.is_empty() || !self.update.is_empty() || !self.delete.is_empty()
    }

    /// Iterate every entry together with the push action it maps to.
    pub fn entries(&self) -> impl Iterator<Item = (Action, &FileState)> {
        self.create
            .iter()
            .map(|f| (Action::Create, f))
            .chain(self.update.iter().map(|f| (Action::Update, f)))
            .chain(self.delete.iter().map(|f| (Action::Delete, f)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    #[serde(rename = "theme")]
    ThemeFile,
    GlobalElement,
    Page,
    Setting,
}

impl ResourceKind {
    /// Execution precedence: theme files first, settings last.
    pub const ORDERED: [ResourceKind; 4] = [
        ResourceKind::ThemeFile,
        ResourceKind::GlobalElement,
        ResourceKind::Page,
        ResourceKind::Setting,
    ];

    pub fn precedence(self) -> u8 {
        match self {
            ResourceKind::ThemeFile => 0,
            ResourceKind::GlobalElement => 1,
            ResourceKind::Page => 2,
            ResourceKind::Setting => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::ThemeFile => "theme",
            ResourceKind::GlobalElement => "global-element",
            ResourceKind::Page => "page",
            ResourceKind::Setting => "setting",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    Download,
}

impl Action {
    /// Order inside one resource kind: download, delete, update, create.
    pub fn precedence(self) -> u8 {
        match self {
            Action::Download => 0,
            Action::Delete => 1,
            Action::Update => 2,
            Action::Create => 3,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Action::Create | Action::Update | Action::Delete => Direction::Push,
            Action::Download => Direction::Pull,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Download => "download",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync direction a task belongs to. Permission failures are tracked per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Push,
    Pull,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GlobalElementType {
    #[serde(alias = "SECTION")]
    Section,
    #[serde(alias = "CONTAINER")]
    Container,
}

impl GlobalElementType {
    pub fn dir_name(self) -> &'static str {
        match self {
            GlobalElementType::Section => "sections",
            GlobalElementType::Container => "containers",
        }
    }

    /// Wire spelling expected by the upsert endpoint.
    pub fn as_upper(self) -> &'static str {
        match self {
            GlobalElementType::Section => "SECTION",
            GlobalElementType::Container => "CONTAINER",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GlobalElementType::Section => "section",
            GlobalElementType::Container => "container",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeFileMeta {
    pub path: String,
    #[serde(default)]
    pub site_theme_id: String,
    pub checksum: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SitePage {
    pub id: String,
    pub route: String,
    pub name: String,
    #[serde(default)]
    pub site_id: String,
    /// JSON document encoded as a string.
    pub properties: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteSetting {
    pub name: String,
    /// JSON document encoded as a string.
    pub properties: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteGlobalElement {
    pub name: String,
    #[serde(rename = "type")]
    pub element_type: GlobalElementType,
    /// JSON document encoded as a string.
    pub properties: String,
}

/// Body of a page create/update request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageUpsert {
    pub name: String,
    pub route: String,
    /// Page document minus `route`, encoded as a string.
    pub properties: String,
}

/// The site and installed theme a sync run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeTarget {
    pub site_id: String,
    pub theme_id: String,
}

impl ThemeTarget {
    pub fn new(site_id: impl Into<String>, theme_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            theme_id: theme_id.into(),
        }
    }
}

/// Everything the remote side holds for one site theme.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceListing {
    pub theme_files: Vec<ThemeFileMeta>,
    pub global_elements: Vec<SiteGlobalElement>,
    pub pages: Vec<SitePage>,
    pub settings: Vec<SiteSetting>,
}

/// A single remote descriptor carried by a download task.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResource {
    ThemeFile(ThemeFileMeta),
    GlobalElement(SiteGlobalElement),
    Page(SitePage),
    Setting(SiteSetting),
}

impl RemoteResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            RemoteResource::ThemeFile(_) => ResourceKind::ThemeFile,
            RemoteResource::GlobalElement(_) => ResourceKind::GlobalElement,
            RemoteResource::Page(_) => ResourceKind::Page,
            RemoteResource::Setting(_) => ResourceKind::Setting,
        }
    }
}
