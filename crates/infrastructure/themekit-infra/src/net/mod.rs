use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use themekit_config::{API_VERSION, LIST_PAGE_LIMIT};
use themekit_core::path_utils::ThemePath;
use themekit_core::{
    GlobalElementType, PageUpsert, ResourceListing, SiteGlobalElement, SitePage, SiteSetting,
    ThemeFileMeta, ThemeTarget,
};
use tracing::debug;

pub mod error;

pub use error::RemoteError;
use error::ApiErrorBody;

/// Remote mutation and listing operations, one per (resource kind, action).
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_theme_files(&self, target: &ThemeTarget)
        -> Result<Vec<ThemeFileMeta>, RemoteError>;
    async fn list_global_elements(
        &self,
        target: &ThemeTarget,
    ) -> Result<Vec<SiteGlobalElement>, RemoteError>;
    async fn list_pages(&self, target: &ThemeTarget) -> Result<Vec<SitePage>, RemoteError>;
    async fn list_settings(&self, target: &ThemeTarget) -> Result<Vec<SiteSetting>, RemoteError>;

    /// Fetch all four listings concurrently.
    async fn fetch_listing(&self, target: &ThemeTarget) -> Result<ResourceListing, RemoteError> {
        let (theme_files, global_elements, pages, settings) = futures::try_join!(
            self.list_theme_files(target),
            self.list_global_elements(target),
            self.list_pages(target),
            self.list_settings(target),
        )?;
        Ok(ResourceListing {
            theme_files,
            global_elements,
            pages,
            settings,
        })
    }

    /// Content of a theme file, or `None` when the remote no longer has it.
    async fn download_theme_file(
        &self,
        target: &ThemeTarget,
        path: &str,
    ) -> Result<Option<Vec<u8>>, RemoteError>;
    async fn upsert_theme_file(
        &self,
        target: &ThemeTarget,
        path: &str,
        content: Vec<u8>,
    ) -> Result<(), RemoteError>;
    async fn delete_theme_file(&self, target: &ThemeTarget, path: &str) -> Result<(), RemoteError>;

    async fn upsert_global_element(
        &self,
        target: &ThemeTarget,
        name: &str,
        element_type: GlobalElementType,
        properties: &serde_json::Value,
    ) -> Result<(), RemoteError>;
    async fn delete_global_element(
        &self,
        target: &ThemeTarget,
        name: &str,
        element_type: GlobalElementType,
    ) -> Result<(), RemoteError>;

    async fn upsert_setting(
        &self,
        target: &ThemeTarget,
        name: &str,
        properties: &serde_json::Value,
    ) -> Result<(), RemoteError>;
    async fn delete_setting(&self, target: &ThemeTarget, name: &str) -> Result<(), RemoteError>;

    async fn create_page(
        &self,
        target: &ThemeTarget,
        page: &PageUpsert,
    ) -> Result<SitePage, RemoteError>;
    async fn update_page(
        &self,
        target: &ThemeTarget,
        page_id: &str,
        page: &PageUpsert,
    ) -> Result<SitePage, RemoteError>;
    async fn delete_page(&self, target: &ThemeTarget, page_id: &str) -> Result<(), RemoteError>;
}

pub fn default_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("themekit/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// MIME type sent with a theme file upload. JSON goes up as `text/plain` because the
/// upload endpoint rejects `application/json` file parts.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = std::path::Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "html" | "htm" => "text/html",
        "md" | "markdown" => "text/markdown",
        "txt" | "json" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Deserialize)]
struct ThemeFilesPage {
    files: Option<Vec<ThemeFileMeta>>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThemeFile {
    path: String,
    #[serde(default)]
    binary_encoding_type: Option<String>,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ThemeFilesContent {
    #[serde(default)]
    files: Vec<RawThemeFile>,
}

#[derive(Debug, Deserialize)]
struct PagesPage {
    pages: Option<Vec<SitePage>>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    page: SitePage,
}

#[derive(Debug, Deserialize)]
struct SettingsResponse {
    #[serde(default)]
    settings: Vec<SiteSetting>,
}

#[derive(Debug, Deserialize)]
struct GlobalElementsResponse {
    #[serde(default)]
    global_elements: Vec<SiteGlobalElement>,
}

/// HTTP implementation of [`RemoteClient`] against the site theme REST API.
pub struct HttpRemoteClient {
    client: Client,
    base: Url,
    access_token: String,
}

/// Treat the host as a directory base so endpoint segments append instead of replace.
fn normalize_api_base(host: &str) -> Result<Url, RemoteError> {
    let mut url =
        Url::parse(host).map_err(|e| RemoteError::InvalidUrl(format!("{host}: {e}")))?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

impl HttpRemoteClient {
    pub fn new(
        client: Client,
        host: &str,
        access_token: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            client,
            base: normalize_api_base(host)?,
            access_token: access_token.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| RemoteError::InvalidUrl(self.base.to_string()))?;
            segs.pop_if_empty();
            for seg in segments {
                segs.push(seg);
            }
        }
        Ok(url)
    }

    /// `v2/sites/{site}/site-themes/{theme}/{resource}`
    fn site_theme_endpoint(
        &self,
        target: &ThemeTarget,
        tail: &[&str],
    ) -> Result<Url, RemoteError> {
        let mut segments = vec![
            "v2",
            "sites",
            target.site_id.as_str(),
            "site-themes",
            target.theme_id.as_str(),
        ];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    /// `v2/sites/{site}/themes/{theme}/files`
    fn theme_files_endpoint(&self, target: &ThemeTarget) -> Result<Url, RemoteError> {
        self.endpoint(&[
            "v2",
            "sites",
            target.site_id.as_str(),
            "themes",
            target.theme_id.as_str(),
            "files",
        ])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header("Square-Version", API_VERSION)
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let request = builder
            .build()
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        let url = request.url().to_string();
        debug!("{} {}", request.method(), url);

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ApiErrorBody>(&body)
            .map(|b| b.message())
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        Err(RemoteError::from_status(status.as_u16(), url, message))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let resp = self.send_raw(builder).await?;
        let url = resp.url().to_string();
        let bytes = resp
            .bytes()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.clone(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode {
            url,
            reason: e.to_string(),
        })
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), RemoteError> {
        self.send_raw(builder).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn list_theme_files(
        &self,
        target: &ThemeTarget,
    ) -> Result<Vec<ThemeFileMeta>, RemoteError> {
        let url = self.theme_files_endpoint(target)?;
        let mut files = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut req = self
                .request(Method::GET, url.clone())
                .query(&[("limit", LIST_PAGE_LIMIT.to_string())]);
            if let Some(c) = &cursor {
                req = req.query(&[("cursor", c)]);
            }
            let page: ThemeFilesPage = self.send_json(req).await?;
            match page.files {
                Some(batch) => files.extend(batch),
                None => break,
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(files)
    }

    async fn list_global_elements(
        &self,
        target: &ThemeTarget,
    ) -> Result<Vec<SiteGlobalElement>, RemoteError> {
        let url = self.site_theme_endpoint(target, &["global-elements"])?;
        let resp: GlobalElementsResponse = self.send_json(self.request(Method::GET, url)).await?;
        Ok(resp.global_elements)
    }

    async fn list_pages(&self, target: &ThemeTarget) -> Result<Vec<SitePage>, RemoteError> {
        let url = self.site_theme_endpoint(target, &["pages"])?;
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut req = self
                .request(Method::GET, url.clone())
                .query(&[("limit", LIST_PAGE_LIMIT.to_string())]);
            if let Some(c) = &cursor {
                req = req.query(&[("cursor", c)]);
            }
            let page: PagesPage = self.send_json(req).await?;
            match page.pages {
                Some(batch) => pages.extend(batch),
                None => break,
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(pages)
    }

    async fn list_settings(&self, target: &ThemeTarget) -> Result<Vec<SiteSetting>, RemoteError> {
        let url = self.site_theme_endpoint(target, &["settings"])?;
        let resp: SettingsResponse = self.send_json(self.request(Method::GET, url)).await?;
        Ok(resp.settings)
    }

    async fn download_theme_file(
        &self,
        target: &ThemeTarget,
        path: &str,
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        let url = self.theme_files_endpoint(target)?;
        let remote_path = ThemePath::strip_leading_slash(path);
        let req = self
            .request(Method::GET, url.clone())
            .query(&[("path", remote_path)]);
        let resp: ThemeFilesContent = self.send_json(req).await?;

        let Some(file) = resp.files.into_iter().find(|f| f.path == remote_path) else {
            return Ok(None);
        };

        if file.binary_encoding_type.as_deref() == Some("base64") {
            let bytes = STANDARD
                .decode(file.content.as_bytes())
                .map_err(|e| RemoteError::Decode {
                    url: url.to_string(),
                    reason: format!("base64 content of {remote_path}: {e}"),
                })?;
            Ok(Some(bytes))
        } else {
            Ok(Some(file.content.into_bytes()))
        }
    }

    async fn upsert_theme_file(
        &self,
        target: &ThemeTarget,
        path: &str,
        content: Vec<u8>,
    ) -> Result<(), RemoteError> {
        let url = self.theme_files_endpoint(target)?;
        let remote_path = ThemePath::strip_leading_slash(path).to_string();
        let file_name = std::path::Path::new(&remote_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| remote_path.clone());

        let part = reqwest::multipart::Part::bytes(content)
            .file_name(file_name)
            .mime_str(content_type_for(&remote_path))
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("request", json!({ "path": remote_path }).to_string())
            .part("file", part);

        self.send_empty(self.request(Method::POST, url).multipart(form))
            .await
    }

    async fn delete_theme_file(&self, target: &ThemeTarget, path: &str) -> Result<(), RemoteError> {
        let url = self.theme_files_endpoint(target)?;
        let req = self
            .request(Method::DELETE, url)
            .query(&[("path", ThemePath::strip_leading_slash(path))]);
        self.send_empty(req).await
    }

    async fn upsert_global_element(
        &self,
        target: &ThemeTarget,
        name: &str,
        element_type: GlobalElementType,
        properties: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let url = self.site_theme_endpoint(target, &["global-elements"])?;
        let body = json!({
            "name": name,
            "type": element_type.as_upper(),
            "properties": properties.to_string(),
        });
        self.send_empty(self.request(Method::POST, url).json(&body))
            .await
    }

    async fn delete_global_element(
        &self,
        target: &ThemeTarget,
        name: &str,
        element_type: GlobalElementType,
    ) -> Result<(), RemoteError> {
        let url = self.site_theme_endpoint(target, &["global-elements"])?;
        let req = self
            .request(Method::DELETE, url)
            .query(&[(element_type.as_str(), name)]);
        self.send_empty(req).await
    }

    async fn upsert_setting(
        &self,
        target: &ThemeTarget,
        name: &str,
        properties: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let url = self.site_theme_endpoint(target, &["settings"])?;
        let body = json!({
            "name": name,
            "properties": properties.to_string(),
        });
        self.send_empty(self.request(Method::POST, url).json(&body))
            .await
    }

    async fn delete_setting(&self, target: &ThemeTarget, name: &str) -> Result<(), RemoteError> {
        let url = self.site_theme_endpoint(target, &["settings"])?;
        self.send_empty(self.request(Method::DELETE, url).query(&[("name", name)]))
            .await
    }

    async fn create_page(
        &self,
        target: &ThemeTarget,
        page: &PageUpsert,
    ) -> Result<SitePage, RemoteError> {
        let url = self.site_theme_endpoint(target, &["pages"])?;
        let body = json!({
            "page": page,
            "idempotency_key": uuid::Uuid::new_v4().to_string(),
        });
        let resp: PageResponse = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(resp.page)
    }

    async fn update_page(
        &self,
        target: &ThemeTarget,
        page_id: &str,
        page: &PageUpsert,
    ) -> Result<SitePage, RemoteError> {
        let url = self.site_theme_endpoint(target, &["pages", page_id])?;
        let body = json!({
            "page": page,
            "idempotency_key": uuid::Uuid::new_v4().to_string(),
        });
        let resp: PageResponse = self
            .send_json(self.request(Method::PUT, url).json(&body))
            .await?;
        Ok(resp.page)
    }

    async fn delete_page(&self, target: &ThemeTarget, page_id: &str) -> Result<(), RemoteError> {
        let url = self.site_theme_endpoint(target, &["pages", page_id])?;
        self.send_empty(self.request(Method::DELETE, url)).await
    }
}
