use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

use crate::boot::{BootLoader, ConfigLoader, DEFAULT_FLAGS};
use crate::kernel::bootstrap::Application;
use crate::kernel::error::{Error, Result};
use crate::storage::StorageSystemError;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

#[tokio::test]
async fn test_loads_existing_files_and_skips_missing() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let present = write(dir.path(), "app.json", r#"{"name": "demo", "listen": ":9000"}"#);
    let missing = dir.path().join("missing.json");

    let loader = ConfigLoader::new([missing, present.clone()]);
    assert_eq!(loader.flags().to_vec(), DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect::<Vec<_>>());

    let mut app = Application::new();
    loader.apply(&mut app).await?;

    assert_eq!(app.config().get_string("name").as_deref(), Some("demo"));
    assert_eq!(app.config().loaded_files().to_vec(), vec![present]);
    Ok(())
}

#[tokio::test]
async fn test_flag_overrides_file_value() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = write(dir.path(), "app.json", r#"{"debug": false, "name": "demo"}"#);

    let mut app = Application::new().with_args(["--debug=true", "--name=ignored"]);
    ConfigLoader::new([file]).apply(&mut app).await?;

    assert!(app.config().bool_or("debug", false));
    // `name` is not in the flag allow-list
    assert_eq!(app.config().get_string("name").as_deref(), Some("demo"));
    Ok(())
}

#[tokio::test]
async fn test_custom_flag_allow_list() -> Result<()> {
    let mut app = Application::new().with_args(["--port", "8081", "--verbose"]);
    ConfigLoader::new(Vec::<PathBuf>::new())
        .with_flags(["port:int", "verbose"])
        .apply(&mut app)
        .await?;

    assert_eq!(app.config().get::<i64>("port"), Some(8081));
    assert!(app.config().bool_or("verbose", false));
    Ok(())
}

#[tokio::test]
async fn test_before_config_listener_can_filter_files() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let base = write(dir.path(), "base.json", r#"{"source": "base"}"#);
    let local = write(dir.path(), "local.json", r#"{"source": "local"}"#);

    let mut app = Application::new();
    app.events_mut().on_before_config(|files, _config| {
        files.retain(|f| !f.ends_with("local.json"));
        Ok(())
    });
    ConfigLoader::new([base, local]).apply(&mut app).await?;

    assert_eq!(app.config().get_string("source").as_deref(), Some("base"));
    assert_eq!(app.config().loaded_files().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_after_config_sees_merged_store() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = write(dir.path(), "app.json", r#"{"name": "demo"}"#);

    let mut app = Application::new().with_args(["--debug"]);
    app.events_mut().on_after_config(|config| {
        assert_eq!(config.get_string("name").as_deref(), Some("demo"));
        assert!(config.bool_or("debug", false));
        config.set("checked", true)
    });
    ConfigLoader::new([file]).apply(&mut app).await?;

    assert!(app.config().bool_or("checked", false));
    Ok(())
}

#[tokio::test]
async fn test_malformed_file_fails_without_after_event() {
    let dir = tempdir().expect("Failed to create temp dir");
    let broken = write(dir.path(), "broken.json", "{ not json");

    let after_calls = Arc::new(AtomicU32::new(0));
    let mut app = Application::new();
    {
        let after_calls = Arc::clone(&after_calls);
        app.events_mut().on_after_config(move |_config| {
            after_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }

    let result = ConfigLoader::new([broken]).apply(&mut app).await;

    assert!(matches!(
        result,
        Err(Error::StorageSystem(StorageSystemError::DeserializationError { .. }))
    ));
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_before_listener_aborts_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = write(dir.path(), "app.json", r#"{"name": "demo"}"#);

    let mut app = Application::new();
    app.events_mut()
        .on_before_config(|_files, _config| Err(Error::Other("config source offline".into())));

    let result = ConfigLoader::new([file]).apply(&mut app).await;

    assert!(matches!(result, Err(Error::EventSystem(_))));
    assert!(!app.config().contains_key("name"));
}
