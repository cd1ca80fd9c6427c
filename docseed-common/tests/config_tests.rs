//! Unit tests for configuration loading and connection string resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate connection variables are marked with #[serial].

use docseed_common::config::{
    default_entities, resolve_connection_string, EntitySpec, TomlConfig, CONNECTION_ENV_VARS,
};
use docseed_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

fn clear_connection_vars() {
    for name in CONNECTION_ENV_VARS {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_missing_connection_string_is_config_error() {
    clear_connection_vars();

    let result = resolve_connection_string(None, &CONNECTION_ENV_VARS);
    match result {
        Err(Error::Config(msg)) => {
            assert!(msg.contains("DOCSEED_CONNECTION_STRING"), "message was: {}", msg);
            assert!(msg.contains("MONGO_URL"), "message was: {}", msg);
        }
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_first_non_empty_variable_wins() {
    clear_connection_vars();
    env::set_var("DOCSEED_CONNECTION_STRING", "   ");
    env::set_var("MONGO_URI", "sqlite://second.db");
    env::set_var("DATABASE_URL", "sqlite://last.db");

    let url = resolve_connection_string(None, &CONNECTION_ENV_VARS).unwrap();
    assert_eq!(url, "sqlite://second.db");

    clear_connection_vars();
}

#[test]
#[serial]
fn test_explicit_value_overrides_environment() {
    clear_connection_vars();
    env::set_var("DOCSEED_CONNECTION_STRING", "sqlite://env.db");

    let url = resolve_connection_string(Some("sqlite://cli.db"), &CONNECTION_ENV_VARS).unwrap();
    assert_eq!(url, "sqlite://cli.db");

    // Empty explicit value falls through to the environment
    let url = resolve_connection_string(Some(""), &CONNECTION_ENV_VARS).unwrap();
    assert_eq!(url, "sqlite://env.db");

    clear_connection_vars();
}

#[test]
#[serial]
fn test_custom_variable_list() {
    clear_connection_vars();
    env::set_var("DOCSEED_TEST_CUSTOM_URL", "sqlite://custom.db");

    let names = vec!["DOCSEED_TEST_CUSTOM_URL".to_string()];
    let url = resolve_connection_string(None, &names).unwrap();
    assert_eq!(url, "sqlite://custom.db");

    env::remove_var("DOCSEED_TEST_CUSTOM_URL");
}

#[test]
fn test_default_entities() {
    let entities = default_entities();
    assert_eq!(entities.len(), 2);

    assert_eq!(entities[0].name, "users");
    assert_eq!(entities[0].collection(), "users");
    assert_eq!(entities[0].keys, vec!["users", "user"]);
    assert_eq!(entities[0].fixture, PathBuf::from("test-users.json"));

    assert_eq!(entities[1].name, "hotels");
    assert_eq!(entities[1].keys, vec!["hotels", "hotel", "properties"]);
    assert_eq!(entities[1].fixture, PathBuf::from("test-hotel.json"));
}

#[test]
fn test_fixture_path_resolution() {
    let relative = EntitySpec::new("users", "users.json", &[]);
    assert_eq!(
        relative.fixture_path(Path::new("data")),
        PathBuf::from("data/users.json")
    );

    let absolute = EntitySpec::new("users", "/srv/fixtures/users.json", &[]);
    assert_eq!(
        absolute.fixture_path(Path::new("data")),
        PathBuf::from("/srv/fixtures/users.json")
    );
}

#[test]
fn test_toml_config_full() {
    let config = TomlConfig::from_toml_str(
        r#"
        data_dir = "fixtures"
        preserve_ids = true
        parallel = true
        connection_env = ["SEED_DB"]

        [logging]
        level = "debug"

        [[entities]]
        name = "rooms"
        collection = "hotel_rooms"
        fixture = "rooms.json"
        keys = ["rooms"]
        "#,
    )
    .unwrap();

    assert_eq!(config.data_dir, Some(PathBuf::from("fixtures")));
    assert_eq!(config.preserve_ids, Some(true));
    assert_eq!(config.parallel, Some(true));
    assert_eq!(config.connection_env_or_default(), vec!["SEED_DB".to_string()]);
    assert_eq!(config.logging.level, "debug");

    let entities = config.entities_or_default();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].collection(), "hotel_rooms");
    assert_eq!(entities[0].keys, vec!["rooms"]);
}

#[test]
fn test_toml_config_empty_uses_defaults() {
    let config = TomlConfig::from_toml_str("").unwrap();

    assert!(config.data_dir.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.entities_or_default(), default_entities());
    assert_eq!(config.connection_env_or_default().len(), CONNECTION_ENV_VARS.len());
}

#[test]
fn test_toml_config_invalid_is_config_error() {
    let result = TomlConfig::from_toml_str("data_dir = [");
    assert!(matches!(result, Err(Error::Config(_))));

    // Entity without a fixture path
    let result = TomlConfig::from_toml_str("[[entities]]\nname = \"users\"\n");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.toml");
    std::fs::write(&path, "parallel = true\n").unwrap();

    let config = TomlConfig::load(Some(&path)).unwrap();
    assert_eq!(config.parallel, Some(true));
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let result = TomlConfig::load(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}
