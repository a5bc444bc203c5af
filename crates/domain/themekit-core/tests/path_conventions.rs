use themekit_core::path_utils::ThemePath;
use themekit_core::remote::remote_state;
use themekit_core::{
    GlobalElementType, RemoteResource, ResourceKind, ResourceListing, SiteGlobalElement, SitePage,
    SiteSetting, ThemeFileMeta,
};

fn element(name: &str, element_type: GlobalElementType) -> SiteGlobalElement {
    SiteGlobalElement {
        name: name.to_string(),
        element_type,
        properties: r#"{"k":"v"}"#.to_string(),
    }
}

#[test]
fn test_classification_by_path_shape() {
    let cases = [
        ("/theme/a.css", Some(ResourceKind::ThemeFile)),
        ("/theme/deep/nested/file.bin", Some(ResourceKind::ThemeFile)),
        ("/site/global/sections/header.json", Some(ResourceKind::GlobalElement)),
        ("/site/global/containers/main.json", Some(ResourceKind::GlobalElement)),
        ("/site/pages/home.json", Some(ResourceKind::Page)),
        ("/site/settings/colors.json", Some(ResourceKind::Setting)),
        ("/site/pages/home.txt", None),
        ("/site/pages/nested/home.json", None),
        ("/site/global/sections/extra/header.json", None),
        ("/site/global/other/x.json", None),
        ("/site/settings.json", None),
        ("/README.md", None),
        ("/themes/a.css", None),
    ];

    for (path, expected) in cases {
        assert_eq!(ThemePath::classify(path), expected, "path {path}");
    }
}

#[test]
fn test_global_element_type_from_path() {
    assert_eq!(
        ThemePath::global_element_type("/site/global/sections/header.json"),
        Some(GlobalElementType::Section)
    );
    assert_eq!(
        ThemePath::global_element_type("/site/global/containers/main.json"),
        Some(GlobalElementType::Container)
    );
    assert_eq!(ThemePath::global_element_type("/site/pages/home.json"), None);
}

#[test]
fn test_pull_paths_are_derived_from_metadata() {
    let page = SitePage {
        id: "1".into(),
        route: "/".into(),
        name: "home".into(),
        site_id: "s".into(),
        properties: "{}".into(),
    };
    let setting = SiteSetting {
        name: "colors".into(),
        properties: "{}".into(),
    };
    let meta = ThemeFileMeta {
        path: "theme/css/site.css".into(),
        site_theme_id: "t".into(),
        checksum: "c".into(),
        content_type: "text/css".into(),
        size: 3,
        updated_at: None,
    };

    assert_eq!(
        ThemePath::pull_path(&RemoteResource::Page(page)),
        "/site/pages/home.json"
    );
    assert_eq!(
        ThemePath::pull_path(&RemoteResource::Setting(setting)),
        "/site/settings/colors.json"
    );
    assert_eq!(
        ThemePath::pull_path(&RemoteResource::GlobalElement(element(
            "header",
            GlobalElementType::Section
        ))),
        "/site/global/sections/header.json"
    );
    assert_eq!(
        ThemePath::pull_path(&RemoteResource::GlobalElement(element(
            "main",
            GlobalElementType::Container
        ))),
        "/site/global/containers/main.json"
    );
    assert_eq!(
        ThemePath::pull_path(&RemoteResource::ThemeFile(meta)),
        "/theme/css/site.css"
    );
}

#[test]
fn test_remote_state_covers_every_listing_entry() {
    let listing = ResourceListing {
        theme_files: vec![ThemeFileMeta {
            path: "theme/a.css".into(),
            site_theme_id: "t".into(),
            checksum: "abc".into(),
            content_type: "text/css".into(),
            size: 1,
            updated_at: None,
        }],
        global_elements: vec![element("footer", GlobalElementType::Container)],
        pages: vec![SitePage {
            id: "1".into(),
            route: "/".into(),
            name: "home".into(),
            site_id: "s".into(),
            properties: r#"{"title":"Home"}"#.into(),
        }],
        settings: vec![SiteSetting {
            name: "broken".into(),
            properties: "not json".into(),
        }],
    };

    let state = remote_state(&listing);
    let paths: Vec<&str> = state.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/theme/a.css",
            "/site/pages/home.json",
            "/site/settings/broken.json",
            "/site/global/containers/footer.json",
        ]
    );
    assert_eq!(state.files[0].hash.as_deref(), Some("abc"));
    assert!(state.files[1].hash.is_some());
    assert!(state.files[2].hash.is_none(), "unparseable properties have no hash");
}
