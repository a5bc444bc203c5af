//! Per-(kind, action) task handlers.
//!
//! Every handler validates first and returns the prepared input that `execute` consumes,
//! so invalid content never reaches the remote client.

use std::sync::Arc;

use serde_json::Value;
use themekit_config::MAX_THEME_FILE_BYTE_SIZE;
use themekit_core::path_utils::ThemePath;
use themekit_core::remote::{page_file_content, page_upsert_from_content, properties_file_content};
use themekit_core::{
    Action, GlobalElementType, PageUpsert, RemoteResource, ResourceKind, ThemeTarget,
};
use themekit_infra::{ContentSource, RemoteClient};
use tracing::debug;

use super::{TaskError, TaskPayload, ValidationError};
use crate::identity::PageIdentityStore;

/// Collaborators shared by every task of one manager.
#[derive(Clone)]
pub struct TaskContext {
    pub target: ThemeTarget,
    pub client: Arc<dyn RemoteClient>,
    pub content: Arc<dyn ContentSource>,
    pub identity: Arc<PageIdentityStore>,
}

/// Input produced by validation.
#[derive(Debug)]
pub enum Prepared {
    Nothing,
    Bytes(Vec<u8>),
    Json(Value),
    Page(PageUpsert),
    ElementType(GlobalElementType),
    Element(GlobalElementType, Value),
}

#[async_trait::async_trait]
pub trait TaskHandler: Send + Sync {
    async fn validate(&self, ctx: &TaskContext, payload: &TaskPayload)
        -> Result<Prepared, TaskError>;

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        prepared: Prepared,
    ) -> Result<(), TaskError>;
}

struct ThemeFileUpsert;
struct ThemeFileDelete;
struct ThemeFileDownload;
struct GlobalElementUpsert;
struct GlobalElementDelete;
struct GlobalElementDownload;
struct PageCreate;
struct PageUpdate;
struct PageDelete;
struct PageDownload;
struct SettingUpsert;
struct SettingDelete;
struct SettingDownload;

pub fn handler_for(kind: ResourceKind, action: Action) -> &'static dyn TaskHandler {
    match (kind, action) {
        (ResourceKind::ThemeFile, Action::Create | Action::Update) => &ThemeFileUpsert,
        (ResourceKind::ThemeFile, Action::Delete) => &ThemeFileDelete,
        (ResourceKind::ThemeFile, Action::Download) => &ThemeFileDownload,
        (ResourceKind::GlobalElement, Action::Create | Action::Update) => &GlobalElementUpsert,
        (ResourceKind::GlobalElement, Action::Delete) => &GlobalElementDelete,
        (ResourceKind::GlobalElement, Action::Download) => &GlobalElementDownload,
        (ResourceKind::Page, Action::Create) => &PageCreate,
        (ResourceKind::Page, Action::Update) => &PageUpdate,
        (ResourceKind::Page, Action::Delete) => &PageDelete,
        (ResourceKind::Page, Action::Download) => &PageDownload,
        (ResourceKind::Setting, Action::Create | Action::Update) => &SettingUpsert,
        (ResourceKind::Setting, Action::Delete) => &SettingDelete,
        (ResourceKind::Setting, Action::Download) => &SettingDownload,
    }
}

// --- Shared helpers ---

async fn read_json(
    ctx: &TaskContext,
    path: &str,
    invalid: fn(String, String) -> ValidationError,
) -> Result<Value, TaskError> {
    let bytes = ctx
        .content
        .read(path)
        .await
        .map_err(|e| invalid(path.to_string(), e.to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TaskError::Validation(invalid(path.to_string(), e.to_string())))
}

fn page_parse(path: String, reason: String) -> ValidationError {
    ValidationError::PageParse { path, reason }
}

fn settings_parse(path: String, reason: String) -> ValidationError {
    ValidationError::SettingsParse { path, reason }
}

fn element_parse(path: String, reason: String) -> ValidationError {
    ValidationError::GlobalElementParse { path, reason }
}

fn element_type(path: &str) -> Result<GlobalElementType, TaskError> {
    ThemePath::global_element_type(path).ok_or_else(|| {
        TaskError::Validation(element_parse(
            path.to_string(),
            "path is not a section or container".to_string(),
        ))
    })
}

fn unexpected(payload: &TaskPayload) -> TaskError {
    TaskError::Generic(format!(
        "Unexpected input for {} {} task on {}",
        payload.kind, payload.action, payload.file_path
    ))
}

/// The remote descriptor a download task carries.
fn remote_resource(payload: &TaskPayload) -> Result<&RemoteResource, TaskError> {
    payload.resource.as_ref().ok_or_else(|| {
        TaskError::Generic(format!(
            "Download task for {} has no remote resource",
            payload.file_path
        ))
    })
}

async fn write_text(
    ctx: &TaskContext,
    path: &str,
    rendered: Result<String, serde_json::Error>,
) -> Result<(), TaskError> {
    let text = rendered
        .map_err(|e| TaskError::Generic(format!("Invalid remote properties for {path}: {e}")))?;
    ctx.content.write(path, text.as_bytes()).await?;
    Ok(())
}

async fn validate_download(payload: &TaskPayload) -> Result<Prepared, TaskError> {
    remote_resource(payload).map(|_| Prepared::Nothing)
}

// --- Theme files ---

#[async_trait::async_trait]
impl TaskHandler for ThemeFileUpsert {
    async fn validate(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
    ) -> Result<Prepared, TaskError> {
        let path = payload.file_path.as_str();
        let read_error = |reason: String| ValidationError::ThemeRead {
            path: path.to_string(),
            reason,
        };

        let size = ctx
            .content
            .file_size(path)
            .await
            .map_err(|e| read_error(e.to_string()))?
            .ok_or_else(|| read_error("file does not exist".to_string()))?;
        if size == 0 || size >= MAX_THEME_FILE_BYTE_SIZE {
            return Err(ValidationError::ThemeSize {
                path: path.to_string(),
                size,
            }
            .into());
        }

        let bytes = ctx
            .content
            .read(path)
            .await
            .map_err(|e| read_error(e.to_string()))?;
        Ok(Prepared::Bytes(bytes))
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        prepared: Prepared,
    ) -> Result<(), TaskError> {
        let Prepared::Bytes(bytes) = prepared else {
            return Err(unexpected(payload));
        };
        ctx.client
            .upsert_theme_file(&ctx.target, &payload.file_path, bytes)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for ThemeFileDelete {
    async fn validate(&self, _: &TaskContext, _: &TaskPayload) -> Result<Prepared, TaskError> {
        Ok(Prepared::Nothing)
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        _: Prepared,
    ) -> Result<(), TaskError> {
        ctx.client
            .delete_theme_file(&ctx.target, &payload.file_path)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for ThemeFileDownload {
    async fn validate(&self, _: &TaskContext, payload: &TaskPayload) -> Result<Prepared, TaskError> {
        validate_download(payload).await
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        _: Prepared,
    ) -> Result<(), TaskError> {
        let RemoteResource::ThemeFile(meta) = remote_resource(payload)? else {
            return Err(unexpected(payload));
        };
        match ctx.client.download_theme_file(&ctx.target, &meta.path).await? {
            Some(bytes) => ctx.content.write(&payload.file_path, &bytes).await?,
            None => debug!("{} no longer exists remotely", meta.path),
        }
        Ok(())
    }
}

// --- Global elements ---

#[async_trait::async_trait]
impl TaskHandler for GlobalElementUpsert {
    async fn validate(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
    ) -> Result<Prepared, TaskError> {
        let element_type = element_type(&payload.file_path)?;
        let value = read_json(ctx, &payload.file_path, element_parse).await?;
        Ok(Prepared::Element(element_type, value))
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        prepared: Prepared,
    ) -> Result<(), TaskError> {
        let Prepared::Element(element_type, value) = prepared else {
            return Err(unexpected(payload));
        };
        let name = ThemePath::resource_name(&payload.file_path);
        ctx.client
            .upsert_global_element(&ctx.target, &name, element_type, &value)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for GlobalElementDelete {
    async fn validate(&self, _: &TaskContext, payload: &TaskPayload) -> Result<Prepared, TaskError> {
        element_type(&payload.file_path).map(Prepared::ElementType)
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        prepared: Prepared,
    ) -> Result<(), TaskError> {
        let Prepared::ElementType(element_type) = prepared else {
            return Err(unexpected(payload));
        };
        let name = ThemePath::resource_name(&payload.file_path);
        ctx.client
            .delete_global_element(&ctx.target, &name, element_type)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for GlobalElementDownload {
    async fn validate(&self, _: &TaskContext, payload: &TaskPayload) -> Result<Prepared, TaskError> {
        validate_download(payload).await
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        _: Prepared,
    ) -> Result<(), TaskError> {
        let RemoteResource::GlobalElement(element) = remote_resource(payload)? else {
            return Err(unexpected(payload));
        };
        write_text(
            ctx,
            &payload.file_path,
            properties_file_content(&element.properties),
        )
        .await
    }
}

// --- Pages ---

async fn validate_page(ctx: &TaskContext, payload: &TaskPayload) -> Result<Prepared, TaskError> {
    let path = payload.file_path.as_str();
    let bytes = ctx
        .content
        .read(path)
        .await
        .map_err(|e| page_parse(path.to_string(), e.to_string()))?;
    let upsert = page_upsert_from_content(path, &bytes)
        .map_err(|e| page_parse(path.to_string(), e.to_string()))?;
    Ok(Prepared::Page(upsert))
}

#[async_trait::async_trait]
impl TaskHandler for PageCreate {
    async fn validate(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
    ) -> Result<Prepared, TaskError> {
        validate_page(ctx, payload).await
    }

    /// Upsert: a page whose name already has an id is updated in place.
    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        prepared: Prepared,
    ) -> Result<(), TaskError> {
        let Prepared::Page(upsert) = prepared else {
            return Err(unexpected(payload));
        };
        let page = match ctx.identity.id_for_name(&upsert.name) {
            Some(id) => ctx.client.update_page(&ctx.target, &id, &upsert).await?,
            None => ctx.client.create_page(&ctx.target, &upsert).await?,
        };
        ctx.identity.record(&page);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for PageUpdate {
    async fn validate(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
    ) -> Result<Prepared, TaskError> {
        validate_page(ctx, payload).await
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        prepared: Prepared,
    ) -> Result<(), TaskError> {
        let Prepared::Page(upsert) = prepared else {
            return Err(unexpected(payload));
        };
        let id = ctx.identity.id_for_name(&upsert.name).ok_or_else(|| {
            TaskError::Generic(format!(
                "Could not find a site page id for {}",
                payload.file_path
            ))
        })?;
        let page = ctx.client.update_page(&ctx.target, &id, &upsert).await?;
        ctx.identity.record(&page);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for PageDelete {
    async fn validate(&self, _: &TaskContext, _: &TaskPayload) -> Result<Prepared, TaskError> {
        Ok(Prepared::Nothing)
    }

    /// Unknown pages have nothing to delete remotely.
    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        _: Prepared,
    ) -> Result<(), TaskError> {
        let name = ThemePath::resource_name(&payload.file_path);
        let Some(id) = ctx.identity.id_for_name(&name) else {
            debug!("No site page id for {}, nothing to delete", payload.file_path);
            return Ok(());
        };
        ctx.client.delete_page(&ctx.target, &id).await?;
        ctx.identity.forget(&name);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for PageDownload {
    async fn validate(&self, _: &TaskContext, payload: &TaskPayload) -> Result<Prepared, TaskError> {
        validate_download(payload).await
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        _: Prepared,
    ) -> Result<(), TaskError> {
        let RemoteResource::Page(page) = remote_resource(payload)? else {
            return Err(unexpected(payload));
        };
        write_text(ctx, &payload.file_path, page_file_content(page)).await
    }
}

// --- Settings ---

#[async_trait::async_trait]
impl TaskHandler for SettingUpsert {
    async fn validate(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
    ) -> Result<Prepared, TaskError> {
        read_json(ctx, &payload.file_path, settings_parse)
            .await
            .map(Prepared::Json)
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        prepared: Prepared,
    ) -> Result<(), TaskError> {
        let Prepared::Json(value) = prepared else {
            return Err(unexpected(payload));
        };
        let name = ThemePath::resource_name(&payload.file_path);
        ctx.client.upsert_setting(&ctx.target, &name, &value).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for SettingDelete {
    async fn validate(&self, _: &TaskContext, _: &TaskPayload) -> Result<Prepared, TaskError> {
        Ok(Prepared::Nothing)
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        _: Prepared,
    ) -> Result<(), TaskError> {
        let name = ThemePath::resource_name(&payload.file_path);
        ctx.client.delete_setting(&ctx.target, &name).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskHandler for SettingDownload {
    async fn validate(&self, _: &TaskContext, payload: &TaskPayload) -> Result<Prepared, TaskError> {
        validate_download(payload).await
    }

    async fn execute(
        &self,
        ctx: &TaskContext,
        payload: &TaskPayload,
        _: Prepared,
    ) -> Result<(), TaskError> {
        let RemoteResource::Setting(setting) = remote_resource(payload)? else {
            return Err(unexpected(payload));
        };
        write_text(
            ctx,
            &payload.file_path,
            properties_file_content(&setting.properties),
        )
        .await
    }
}
