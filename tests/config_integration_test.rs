//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold ENV_MUTEX to avoid
//! interference between tests.

use dextract::config::{load_config, SourceKind, StorageBackend};
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("DEXTRACT_APPLICATION_LOG_LEVEL");
    std::env::remove_var("DEXTRACT_EXTRACT_NAME");
    std::env::remove_var("DEXTRACT_SQL_MAX_CONNECTIONS");
    std::env::remove_var("DEXTRACT_STORAGE_CONTAINER");
    std::env::remove_var("TEST_DEXTRACT_SQL_PASSWORD");
    std::env::remove_var("TEST_DEXTRACT_CLIENT_SECRET");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[extract]
name = "study"
description = "Quiz activity"
container = "/tmp/extracts"
mappings = "state/mappings.json"

[sql]
connection_string = "postgresql://reader:pw@db:5432/warehouse"
max_connections = 8
statement_timeout_seconds = 60
ssl_mode = "require"

[storage]
backend = "azure"
container = "extracts"
account_url = "https://acct.blob.core.windows.net"
tenant_id = "tenant"
client_id = "client"
client_secret = "secret"
sync_root = "data"
extensions = [".csv"]

[[sources]]
name = "quiz_sessions"
kind = "sql"
query = "SELECT * FROM quiz_sessions"
columns_to_entities = { UserId = "User", QuizId = "Quiz", AuthorId = "User" }
whitelist = ["SchoolId"]

[sources.glossary]
Score = "Fraction of correct answers."

[[sources]]
name = "surveys"
kind = "spreadsheet"
path = "data/surveys.xlsx"
sheet = "2025"

[[sources]]
name = "events"
kind = "table_storage"
table = "events"
filter = "PartitionKey eq 'web'"

[[sources]]
name = "all_sessions"
kind = "merge"
parents = ["quiz_sessions", "surveys"]

[logging]
local_enabled = true
local_path = "/tmp/dextract-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.extract.name, "study");
    assert_eq!(config.extract.container, PathBuf::from("/tmp/extracts"));
    assert_eq!(
        config.extract.mappings,
        Some(PathBuf::from("state/mappings.json"))
    );

    let sql = config.sql.as_ref().unwrap();
    assert_eq!(sql.max_connections, 8);
    assert_eq!(sql.statement_timeout_seconds, 60);
    assert_eq!(sql.connection_timeout_seconds, 30);
    assert_eq!(sql.ssl_mode, "require");

    let storage = config.storage.as_ref().unwrap();
    assert_eq!(storage.backend, StorageBackend::Azure);
    assert_eq!(storage.client_secret.as_ref().unwrap().expose_secret(), "secret");
    assert_eq!(storage.extensions, vec![".csv".to_string()]);

    assert_eq!(config.sources.len(), 4);
    let kinds: Vec<SourceKind> = config.sources.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SourceKind::Sql,
            SourceKind::Spreadsheet,
            SourceKind::TableStorage,
            SourceKind::Merge
        ]
    );

    // Declaration order decides surrogate assignment
    let columns: Vec<&str> = config.sources[0].columns_to_entities.columns().collect();
    assert_eq!(columns, vec!["UserId", "QuizId", "AuthorId"]);
    assert!(config.sources[0].whitelist.contains("SchoolId"));
    assert_eq!(
        config.sources[0].glossary.get("Score").map(String::as_str),
        Some("Fraction of correct answers.")
    );

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[extract]
name = "study"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.extract.description, "");
    assert_eq!(config.extract.container, PathBuf::from("extracts"));
    assert!(config.extract.mappings.is_none());
    assert!(config.sql.is_none());
    assert!(config.storage.is_none());
    assert!(config.sources.is_empty());
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "daily");
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_DEXTRACT_SQL_PASSWORD", "s3cret");
    std::env::set_var("TEST_DEXTRACT_CLIENT_SECRET", "client-s3cret");

    let temp_file = write_config(
        r#"
[extract]
name = "study"

# password = "${NOT_SET_BUT_COMMENTED}"
[sql]
connection_string = "postgresql://reader:${TEST_DEXTRACT_SQL_PASSWORD}@db/warehouse"

[storage]
backend = "azure"
container = "extracts"
account_url = "https://acct.blob.core.windows.net"
tenant_id = "tenant"
client_id = "client"
client_secret = "${TEST_DEXTRACT_CLIENT_SECRET}"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");
    assert_eq!(
        config.sql.unwrap().connection_string.expose_secret(),
        "postgresql://reader:s3cret@db/warehouse"
    );
    assert_eq!(
        config.storage.unwrap().client_secret.unwrap().expose_secret(),
        "client-s3cret"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[extract]
name = "study"

[sql]
connection_string = "postgresql://reader:${TEST_DEXTRACT_SQL_PASSWORD}@db/warehouse"
"#,
    );

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_DEXTRACT_SQL_PASSWORD"));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DEXTRACT_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("DEXTRACT_EXTRACT_NAME", "override");
    std::env::set_var("DEXTRACT_SQL_MAX_CONNECTIONS", "16");
    std::env::set_var("DEXTRACT_STORAGE_CONTAINER", "other");

    let temp_file = write_config(
        r#"
[extract]
name = "study"

[sql]
connection_string = "postgresql://db/warehouse"

[storage]
backend = "local"
container = "blobs"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");
    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.extract.name, "override");
    assert_eq!(config.sql.unwrap().max_connections, 16);
    assert_eq!(config.storage.unwrap().container, "other");

    cleanup_env_vars();
}

#[test]
fn test_invalid_configs_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        // sql source without [sql]
        "[extract]\nname = \"x\"\n[[sources]]\nname = \"a\"\nkind = \"sql\"\nquery = \"SELECT 1\"\n",
        // merge parent declared after the merge
        "[extract]\nname = \"x\"\n[[sources]]\nname = \"m\"\nkind = \"merge\"\nparents = [\"a\"]\n[[sources]]\nname = \"a\"\nkind = \"csv\"\npath = \"a.csv\"\n",
        // duplicate source names
        "[extract]\nname = \"x\"\n[[sources]]\nname = \"a\"\nkind = \"csv\"\npath = \"a.csv\"\n[[sources]]\nname = \"a\"\nkind = \"csv\"\npath = \"b.csv\"\n",
        // column both mapped and whitelisted
        "[extract]\nname = \"x\"\n[[sources]]\nname = \"a\"\nkind = \"csv\"\npath = \"a.csv\"\ncolumns_to_entities = { UserId = \"User\" }\nwhitelist = [\"UserId\"]\n",
        // table storage on a local backend
        "[extract]\nname = \"x\"\n[storage]\nbackend = \"local\"\ncontainer = \"b\"\n[[sources]]\nname = \"a\"\nkind = \"table_storage\"\ntable = \"t\"\n",
        // unknown log level
        "[application]\nlog_level = \"loud\"\n[extract]\nname = \"x\"\n",
    ];

    for contents in cases {
        let temp_file = write_config(contents);
        let result = load_config(temp_file.path());
        assert!(result.is_err(), "expected rejection of:\n{contents}");
    }
}

#[test]
fn test_missing_file() {
    let result = load_config("/nonexistent/dextract.toml");
    assert!(result.is_err());
}
