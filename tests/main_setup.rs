use portal_access::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic, time::Duration};

// --- Setup/Teardown Utilities ---

const CONFIG_VARS: [&str; 11] = [
    "APP_ENV",
    "BIND_ADDR",
    "IDENTITY_URL",
    "IDENTITY_SESSION_PATH",
    "IDENTITY_LOGOUT_PATH",
    "SESSION_COOKIE",
    "IDENTITY_TIMEOUT_SECS",
    "LOGIN_PATH",
    "ADMIN_HOME",
    "USER_HOME",
    "RUST_LOG",
];

/// Runs a test with a clean configuration environment and restores it afterward.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(&[("APP_ENV", "production")], || {
        panic::catch_unwind(AppConfig::load)
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without IDENTITY_URL"
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.identity_url, "http://localhost:8080");
    assert_eq!(config.session_endpoint(), "http://localhost:8080/auth/session");
    assert_eq!(config.logout_endpoint(), "http://localhost:8080/auth/logout");
    assert_eq!(config.session_cookie, "session");
    assert_eq!(config.identity_timeout, None);

    let policy = config.redirect_policy();
    assert_eq!(policy.login, "/login");
    assert_eq!(policy.admin_home, "/admin");
    assert_eq!(policy.user_home, "/dashboard");
}

#[test]
#[serial]
fn test_app_config_production_overrides() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("IDENTITY_URL", "https://id.example.com/"),
            ("IDENTITY_SESSION_PATH", "/v1/me"),
            ("SESSION_COOKIE", "sid"),
            ("IDENTITY_TIMEOUT_SECS", "5"),
            ("USER_HOME", "/portfolio"),
        ],
        AppConfig::load,
    );

    assert_eq!(config.env, Env::Production);
    // Trailing slash is dropped so endpoint paths join cleanly.
    assert_eq!(config.session_endpoint(), "https://id.example.com/v1/me");
    assert_eq!(config.session_cookie, "sid");
    assert_eq!(config.identity_timeout, Some(Duration::from_secs(5)));
    assert_eq!(config.redirect_policy().user_home, "/portfolio");
}

#[test]
#[serial]
fn test_app_config_rejects_zero_timeout() {
    let result = run_with_env(&[("IDENTITY_TIMEOUT_SECS", "0")], || {
        panic::catch_unwind(AppConfig::load)
    });

    assert!(result.is_err());
}
