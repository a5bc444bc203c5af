//! Conversions from remote resource descriptors to snapshots and on-disk content.

use crate::hashing::json_hash;
use crate::path_utils::ThemePath;
use crate::{FileState, PageUpsert, ResourceListing, SitePage, ThemeState};
use serde::Serialize;
use serde_json::Value;

/// Page document as stored on disk: its properties plus the `route` field.
pub fn page_document(page: &SitePage) -> Result<Value, serde_json::Error> {
    let mut doc: Value = serde_json::from_str(&page.properties)?;
    if let Value::Object(map) = &mut doc {
        map.insert("route".to_string(), Value::String(page.route.clone()));
    }
    Ok(doc)
}

/// Pretty-print JSON with the 4-space indentation used for pulled files.
pub fn pretty_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse a properties blob and render it for disk.
pub fn properties_file_content(properties: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(properties)?;
    pretty_json(&value)
}

pub fn page_file_content(page: &SitePage) -> Result<String, serde_json::Error> {
    pretty_json(&page_document(page)?)
}

/// Build a page request from a local page file: `route` is lifted out of the document
/// and the name comes from the file stem.
pub fn page_upsert_from_content(path: &str, content: &[u8]) -> Result<PageUpsert, serde_json::Error> {
    let mut doc: Value = serde_json::from_slice(content)?;
    let route = match &mut doc {
        Value::Object(map) => match map.remove("route") {
            Some(Value::String(route)) => route,
            Some(other) => other.to_string(),
            None => String::new(),
        },
        _ => String::new(),
    };
    Ok(PageUpsert {
        name: ThemePath::resource_name(path),
        route,
        properties: doc.to_string(),
    })
}

fn properties_hash(properties: &str) -> Option<String> {
    serde_json::from_str::<Value>(properties)
        .ok()
        .map(|v| json_hash(&v))
}

/// Build the remote snapshot from a listing.
///
/// Structured resources whose properties fail to parse keep a `None` hash, which never
/// matches a local hash.
pub fn remote_state(listing: &ResourceListing) -> ThemeState {
    let mut files = Vec::with_capacity(
        listing.theme_files.len()
            + listing.pages.len()
            + listing.settings.len()
            + listing.global_elements.len(),
    );

    for meta in &listing.theme_files {
        files.push(FileState::new(
            ThemePath::normalize(&meta.path),
            Some(meta.checksum.clone()),
        ));
    }

    for page in &listing.pages {
        let hash = page_document(page).ok().map(|doc| json_hash(&doc));
        files.push(FileState::new(ThemePath::page_path(page), hash));
    }

    for setting in &listing.settings {
        files.push(FileState::new(
            ThemePath::setting_path(setting),
            properties_hash(&setting.properties),
        ));
    }

    for element in &listing.global_elements {
        files.push(FileState::new(
            ThemePath::global_element_path(element),
            properties_hash(&element.properties),
        ));
    }

    ThemeState { files }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> SitePage {
        SitePage {
            id: "p1".into(),
            route: "/about".into(),
            name: "about".into(),
            site_id: "s".into(),
            properties: r#"{"title":"About"}"#.into(),
        }
    }

    #[test]
    fn page_document_carries_route() {
        let doc = page_document(&page()).unwrap();
        assert_eq!(doc["route"], "/about");
        assert_eq!(doc["title"], "About");
    }

    #[test]
    fn page_upsert_lifts_route_out_of_properties() {
        let payload = page_upsert_from_content(
            "/site/pages/about.json",
            br#"{"route":"/about","title":"About"}"#,
        )
        .unwrap();
        assert_eq!(payload.name, "about");
        assert_eq!(payload.route, "/about");
        assert_eq!(payload.properties, r#"{"title":"About"}"#);
    }

    #[test]
    fn pretty_json_uses_four_spaces() {
        let out = properties_file_content(r#"{"a":1}"#).unwrap();
        assert_eq!(out, "{\n    \"a\": 1\n}");
    }
}
