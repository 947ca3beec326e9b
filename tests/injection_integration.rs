//! Integration tests for the resolve-then-template flow.
//!
//! Vault is played by a wiremock server and the process environment by a
//! `MemoryEnvironment`, so these run without network access and without
//! touching the real environment of the test process.

use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secret_getter::cli::Cli;
use secret_getter::config::RunConfig;
use secret_getter::pipeline;
use secret_getter::secrets::{
    Environment, MemoryEnvironment, OrderPolicy, SourceOptions, SourceRegistry,
};
use secret_getter::Error;

// ============================================================================
// Helpers
// ============================================================================

const SECRETS_TXT: &str = "\
secret_key1 = secret_value_1
secret_key2=secret_value_2
  spaced_key   =   spaced value
# not a key line
empty_key=
";

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let file = dir.path().join(name);
    fs::write(&file, content).unwrap();
    file
}

fn file_config(key_file: &PathBuf, files: Vec<PathBuf>) -> RunConfig {
    let mut config = RunConfig::new(
        "file",
        SourceOptions {
            path: key_file.to_string_lossy().into_owned(),
            ..Default::default()
        },
    );
    config.files = files;
    config
}

fn vault_config(server: &MockServer, root: &str, files: Vec<PathBuf>) -> RunConfig {
    let mut config = RunConfig::new(
        "vault",
        SourceOptions {
            path: root.to_string(),
            address: Some(server.uri()),
            token: Some("root-token".to_string()),
        },
    );
    config.files = files;
    config
}

async fn mount_vault(server: &MockServer, root: &str, secrets: &[(&str, &str)]) {
    let keys: Vec<&str> = secrets.iter().map(|(k, _)| *k).collect();
    Mock::given(method("GET"))
        .and(path(format!("/v1/{root}")))
        .and(query_param("list", "true"))
        .and(header("X-Vault-Token", "root-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "keys": keys }
        })))
        .mount(server)
        .await;

    for (key, value) in secrets {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{root}/{key}")))
            .and(header("X-Vault-Token", "root-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "value": value }
            })))
            .mount(server)
            .await;
    }
}

// ============================================================================
// File source
// ============================================================================

#[tokio::test]
async fn file_source_templates_known_keys_and_keeps_the_rest() {
    let dir = TempDir::new().unwrap();
    let key_file = write(&dir, "secrets.txt", SECRETS_TXT);
    let target = write(
        &dir,
        "app.conf",
        "a={secret_key1}\nb={secret_key2} c={spaced_key}\nd={empty_key} e={missing}\n",
    );

    let config = file_config(&key_file, vec![target.clone()]);
    let env = MemoryEnvironment::new();
    let report = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.substitutions, 3);
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "a=secret_value_1\nb=secret_value_2 c=spaced value\nd={empty_key} e={missing}\n"
    );
}

#[tokio::test]
async fn file_source_directory_target_is_one_level_deep() {
    let dir = TempDir::new().unwrap();
    let key_file = write(&dir, "secrets.txt", SECRETS_TXT);

    let conf_dir = dir.path().join("conf.d");
    fs::create_dir_all(conf_dir.join("nested")).unwrap();
    fs::write(conf_dir.join("one.conf"), "{secret_key1}").unwrap();
    fs::write(conf_dir.join("nested").join("two.conf"), "{secret_key2}").unwrap();

    let config = file_config(&key_file, vec![conf_dir.clone()]);
    let env = MemoryEnvironment::new();
    let report = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(fs::read_to_string(conf_dir.join("one.conf")).unwrap(), "secret_value_1");
    assert_eq!(
        fs::read_to_string(conf_dir.join("nested").join("two.conf")).unwrap(),
        "{secret_key2}"
    );
}

#[tokio::test]
async fn file_source_rejects_a_directory_as_key_file() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir.path().to_path_buf(), vec![]);
    let env = MemoryEnvironment::new();

    let err = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[tokio::test]
async fn failing_file_does_not_block_the_others() {
    let dir = TempDir::new().unwrap();
    let key_file = write(&dir, "secrets.txt", SECRETS_TXT);
    let good = write(&dir, "good.conf", "{secret_key1}");
    let missing = dir.path().join("missing.conf");

    let config = file_config(&key_file, vec![missing.clone(), good.clone()]);
    let env = MemoryEnvironment::new();
    let report = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&good).unwrap(), "secret_value_1");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, missing);
}

#[tokio::test]
async fn command_line_defaults_drive_a_file_run() {
    let dir = TempDir::new().unwrap();
    let key_file = write(&dir, "secrets.txt", SECRETS_TXT);
    let target = write(&dir, "app.conf", "name={secret_key1}\n");

    let key_arg = key_file.to_string_lossy().into_owned();
    let files_arg = target.to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "secret-getter",
        "file",
        "--path",
        key_arg.as_str(),
        "--files",
        files_arg.as_str(),
    ])
    .unwrap();
    let config = cli.into_run_config();

    let env = MemoryEnvironment::new();
    let report = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.rewritten, vec![target.clone()]);
    assert_eq!(fs::read_to_string(&target).unwrap(), "name=secret_value_1\n");
}

// ============================================================================
// Vault source
// ============================================================================

#[tokio::test]
async fn vault_source_templates_with_custom_delimiters() {
    let server = MockServer::start().await;
    mount_vault(&server, "secret/app", &[("DB_HOST", "db.internal"), ("DB_PASS", "s3cr3t")]).await;

    let dir = TempDir::new().unwrap();
    let target = write(&dir, "app.env", "HOST=${DB_HOST}\r\nPASS=${DB_PASS}\r\n");

    let mut config = vault_config(&server, "secret/app", vec![target.clone()]);
    config.prefix = r"\$\{".into();
    config.suffix = r"\}".into();

    let env = MemoryEnvironment::new();
    let report = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "HOST=db.internal\r\nPASS=s3cr3t\r\n"
    );
}

#[tokio::test]
async fn vault_list_failure_leaves_placeholders_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": ["permission denied"]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = write(&dir, "app.conf", "{DB_HOST}\n");

    let config = vault_config(&server, "secret/app", vec![target.clone()]);
    let env = MemoryEnvironment::new();
    let report = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.substitutions, 0);
    assert_eq!(fs::read_to_string(&target).unwrap(), "{DB_HOST}\n");
}

// ============================================================================
// Order of precedence
// ============================================================================

#[tokio::test]
async fn vault_order_ignores_environment() {
    let server = MockServer::start().await;
    mount_vault(&server, "secret/app", &[("DB_HOST", "from-vault")]).await;

    let dir = TempDir::new().unwrap();
    let target = write(&dir, "app.conf", "{DB_HOST}");

    let config = vault_config(&server, "secret/app", vec![target.clone()]);
    let env = MemoryEnvironment::with_vars([("DB_HOST", "from-env")]);
    pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "from-vault");
    assert_eq!(env.get("DB_HOST").as_deref(), Some("from-env"));
}

#[tokio::test]
async fn env_order_prefers_environment_for_known_secrets() {
    let server = MockServer::start().await;
    mount_vault(&server, "secret/app", &[("DB_HOST", "from-vault"), ("DB_PORT", "5432")]).await;

    let dir = TempDir::new().unwrap();
    let target = write(&dir, "app.conf", "{DB_HOST}:{DB_PORT} {ONLY_ENV}");

    let mut config = vault_config(&server, "secret/app", vec![target.clone()]);
    config.order = OrderPolicy::Env;
    let env = MemoryEnvironment::with_vars([
        ("DB_HOST", "from-env"),
        ("DB_PORT", ""),
        ("ONLY_ENV", "ignored"),
    ]);
    pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "from-env:5432 {ONLY_ENV}"
    );
}

#[tokio::test]
async fn override_order_rewrites_existing_environment_only() {
    let server = MockServer::start().await;
    mount_vault(&server, "secret/app", &[("DB_HOST", "from-vault"), ("NEW_KEY", "fresh")]).await;

    let dir = TempDir::new().unwrap();
    let target = write(&dir, "app.conf", "{DB_HOST}");

    let mut config = vault_config(&server, "secret/app", vec![target.clone()]);
    config.order = OrderPolicy::Override;
    let env = MemoryEnvironment::with_vars([("DB_HOST", "from-env")]);
    pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "from-vault");
    assert_eq!(env.get("DB_HOST").as_deref(), Some("from-vault"));
    assert_eq!(env.get("NEW_KEY"), None);
}

// ============================================================================
// Handoff
// ============================================================================

#[tokio::test]
async fn strict_mode_stops_before_handoff() {
    let dir = TempDir::new().unwrap();
    let key_file = write(&dir, "secrets.txt", SECRETS_TXT);

    let mut config = file_config(&key_file, vec![dir.path().join("missing.conf")]);
    config.strict = true;
    config.command = vec!["secret-getter-never-runs".to_string()];

    let env = MemoryEnvironment::with_vars([("VAULT_TOKEN", "s.token")]);
    let report = pipeline::run(&config, &SourceRegistry::default(), &env)
        .await
        .unwrap();
    let err = pipeline::finish(&config, report, &env).unwrap_err();

    assert!(matches!(err, Error::Template(ref failures) if failures.len() == 1));
    assert_eq!(env.get("VAULT_TOKEN").as_deref(), Some("s.token"));
}
