use tempfile::TempDir;
use url::Url;

use quarry_core::config::store::{CONFIG_FILE_NAME, ConfigStore};
use quarry_core::config::{QuarryConfig, RepositoryConfig};
use quarry_core::context::ResolutionServices;
use quarry_core::repository::ResolutionOverride;

#[test]
fn load_missing_returns_default_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::at(temp.path().join("quarry.toml"));

    let config = store.load().unwrap();

    assert!(config.repositories.is_empty());
    assert_eq!(config.resolution, ResolutionOverride::default());
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::at(temp.path().join("nested").join("quarry.toml"));

    let mut config = QuarryConfig::new();
    config.resolution = ResolutionOverride::offline();
    config.cache.dynamic_version_ttl_secs = 600;
    config
        .repositories
        .push(RepositoryConfig::local("local", temp.path().join("repo")));
    let mut ivy = RepositoryConfig::remote("ivy", Url::parse("https://ivy.example.com/").unwrap());
    ivy.legacy = true;
    ivy.dynamic_resolve = true;
    config.repositories.push(ivy);

    store.save(&config).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, config);
    assert!(loaded.repository("ivy").unwrap().legacy);
}

#[test]
fn project_store_lives_in_project_root() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::for_project(temp.path());
    assert_eq!(store.config_path(), temp.path().join(CONFIG_FILE_NAME));
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("quarry.toml");
    std::fs::write(&path, "[[repository]]\nid = \"central\"\n").unwrap();

    let err = ConfigStore::at(&path).load().unwrap_err();
    assert!(format!("{err:#}").contains("requires 'url' field"));
}

#[test]
fn loaded_config_drives_session_services() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("quarry.toml");
    std::fs::write(
        &path,
        r#"
[resolution]
offline = true

[[repository]]
id = "central"
url = "https://repo.example.com/maven2/"
"#,
    )
    .unwrap();

    let config = ConfigStore::at(&path).load().unwrap();
    let services = ResolutionServices::from_config(&config);

    assert!(services.resolution_override().offline);
    assert_eq!(config.repositories.len(), 1);
}
