#![cfg(test)]

use std::sync::{Arc, Mutex};

use crate::boot::BootChain;
use crate::event::{EventKind, EVT_AFTER_CONFIG, EVT_BEFORE_CONFIG, EVT_BOOT, EVT_BOOTED};
use crate::kernel::bootstrap::{Application, LifecycleState};
use crate::kernel::error::{Error, Result};

use super::common::Project;

#[tokio::test]
async fn test_env_before_config_resolves_placeholders() -> Result<()> {
    let project = Project::new();
    project.write(".env", "LAKO_IT_DB_HOST=db.internal\n");
    project.write("app.json", r#"{"db": {"host": "${LAKO_IT_DB_HOST|localhost}"}}"#);

    let mut app = project.app(&["app.json"], &[]);
    app.boot().await?;

    assert_eq!(app.config().get_string("db.host").as_deref(), Some("db.internal"));
    Ok(())
}

#[tokio::test]
async fn test_config_before_env_falls_back_to_default() -> Result<()> {
    let project = Project::new();
    project.write(".env", "LAKO_IT_CACHE_HOST=cache.internal\n");
    project.write("app.json", r#"{"cache": {"host": "${LAKO_IT_CACHE_HOST|localhost}"}}"#);

    let chain = BootChain::new()
        .with(project.config_loader(&["app.json"]))
        .with(project.env_loader());
    let mut app = Application::new().with_chain(chain);
    app.boot().await?;

    assert_eq!(app.config().get_string("cache.host").as_deref(), Some("localhost"));
    // The env loader still ran, just too late for the config file
    assert_eq!(std::env::var("LAKO_IT_CACHE_HOST").as_deref(), Ok("cache.internal"));
    Ok(())
}

#[tokio::test]
async fn test_flag_beats_file_value() -> Result<()> {
    let project = Project::new();
    project.write("config/app.toml", "name = \"flagged\"\ndebug = false\n");

    let mut app = project.app(&["config/app.toml"], &["--debug=true"]);
    app.boot().await?;

    assert!(app.config().bool_or("debug", false));
    assert_eq!(app.name(), "flagged");
    Ok(())
}

#[tokio::test]
async fn test_missing_optional_file_is_skipped() -> Result<()> {
    let project = Project::new();
    project.write("app.yaml", "name: present\nlisten: \":9001\"\n");

    let mut app = project.app(&["absent.json", "app.yaml"], &[]);
    app.boot().await?;

    assert_eq!(app.name(), "present");
    assert_eq!(app.listen_addr(None), ":9001");
    assert_eq!(app.config().loaded_files().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_later_files_override_only_their_keys() -> Result<()> {
    let project = Project::new();
    project.write("base.json", r#"{"name": "base", "db": {"host": "a", "port": 5432}}"#);
    project.write("local.json", r#"{"db": {"host": "b"}}"#);

    let mut app = project.app(&["base.json", "local.json"], &[]);
    app.boot().await?;

    assert_eq!(app.config().get_string("db.host").as_deref(), Some("b"));
    assert_eq!(app.config().get::<u16>("db.port"), Some(5432));
    assert_eq!(app.name(), "base");
    Ok(())
}

#[tokio::test]
async fn test_malformed_env_file_aborts_boot() {
    let project = Project::new();
    project.write(".env", "NOT A VALID LINE\n");
    project.write("app.json", r#"{"name": "never"}"#);

    let mut app = project.app(&["app.json"], &[]);
    let result = app.boot().await;

    assert!(matches!(result, Err(Error::KernelLifecycleError { .. })));
    assert_eq!(app.state(), LifecycleState::Uninitialized);
    // Config loader comes after env and never ran
    assert!(!app.config().contains_key("name"));
    assert_eq!(app.name(), "");
}

#[tokio::test]
async fn test_before_config_listener_changes_what_loads() -> Result<()> {
    let project = Project::new();
    project.write("app.json", r#"{"mode": "file"}"#);
    let extra = project.write("extra.json", r#"{"mode": "extra"}"#);

    let mut app = project.app(&["app.json"], &[]);
    app.events_mut().on_before_config(move |files, _config| {
        files.push(extra.clone());
        Ok(())
    });
    app.boot().await?;

    assert_eq!(app.config().get_string("mode").as_deref(), Some("extra"));
    Ok(())
}

#[tokio::test]
async fn test_lifecycle_events_fire_in_order() -> Result<()> {
    let project = Project::new();
    project.write("app.json", r#"{"name": "ordered"}"#);

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut app = project.app(&["app.json"], &[]);
    for kind in [
        EventKind::Booted,
        EventKind::AfterConfig,
        EventKind::BeforeConfig,
        EventKind::Boot,
    ] {
        let order = Arc::clone(&order);
        app.events_mut().on(kind, move |event| {
            order.lock().unwrap().push(event.name());
            Ok(())
        });
    }

    app.boot().await?;
    app.boot().await?;

    assert_eq!(
        *order.lock().unwrap(),
        vec![EVT_BOOT, EVT_BEFORE_CONFIG, EVT_AFTER_CONFIG, EVT_BOOTED]
    );
    Ok(())
}
