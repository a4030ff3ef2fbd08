//! Tests for layered configuration loading: `.env` < `.env.<profile>` <
//! process environment.

use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};

use tempfile::TempDir;
use tezlik::config::ConfigLoader;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        env::remove_var("TEZLIK_PROFILE");
        env::remove_var("TEZLIK_API_BIND_ADDR");
        env::remove_var("TEZLIK_LOG_LEVEL");
        env::remove_var("TEZLIK_DATABASE_URL");
        env::remove_var("TEZLIK_OPERATOR_TOKENS");
        env::remove_var("TEZLIK_OPERATOR_TOKEN");
        env::remove_var("TEZLIK_GEO_TIMEOUT_MS");
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn empty_dir() -> PathBuf {
    TempDir::new().unwrap().keep()
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let loader = ConfigLoader::with_base_dir(empty_dir());
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "dev");
    assert_eq!(cfg.api_bind_addr, "127.0.0.1:8080");
    assert_eq!(cfg.database_url, "sqlite::memory:");
    assert!(cfg.operator_tokens.is_empty());
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn profile_file_overrides_base_env_file() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(
        &dir,
        ".env",
        "TEZLIK_PROFILE=staging\nTEZLIK_LOG_LEVEL=info\nTEZLIK_DATABASE_URL=sqlite://base.db\n",
    );
    write_env_file(&dir, ".env.staging", "TEZLIK_LOG_LEVEL=debug\n");

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let cfg = loader.load().expect("layered config loads");

    assert_eq!(cfg.profile, "staging");
    // Profile file wins over the base file.
    assert_eq!(cfg.log_level, "debug");
    // Untouched keys fall through from the base file.
    assert_eq!(cfg.database_url, "sqlite://base.db");
    clear_env();
}

#[test]
fn process_env_beats_env_files() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "TEZLIK_LOG_LEVEL=info\n");
    write_env_file(&dir, ".env.dev", "TEZLIK_LOG_LEVEL=debug\n");

    unsafe {
        env::set_var("TEZLIK_LOG_LEVEL", "warn");
    }

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let cfg = loader.load().expect("config loads");

    assert_eq!(cfg.log_level, "warn");
    clear_env();
}

#[test]
fn operator_tokens_parse_from_comma_separated_list() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("TEZLIK_OPERATOR_TOKENS", "tok-a, tok-b,,tok-c");
    }

    let loader = ConfigLoader::with_base_dir(empty_dir());
    let cfg = loader.load().expect("config loads");

    assert_eq!(cfg.operator_tokens, vec!["tok-a", "tok-b", "tok-c"]);
    clear_env();
}

#[test]
fn single_operator_token_is_accepted() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("TEZLIK_OPERATOR_TOKEN", "only-one");
    }

    let loader = ConfigLoader::with_base_dir(empty_dir());
    let cfg = loader.load().expect("config loads");

    assert_eq!(cfg.operator_tokens, vec!["only-one"]);
    clear_env();
}

#[test]
fn invalid_geo_timeout_is_rejected() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("TEZLIK_GEO_TIMEOUT_MS", "0");
    }

    let loader = ConfigLoader::with_base_dir(empty_dir());
    assert!(loader.load().is_err());
    clear_env();
}
