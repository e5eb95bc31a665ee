use std::{
    path::Path,
    sync::{Mutex, MutexGuard, OnceLock},
};

use tempfile::TempDir;

/// Environment variables a test may override; all are restored on drop.
const GUARDED_VARS: &[&str] = &[
    "TODO_ASSET_DIR",
    "DATABASE_URL",
    "CRON_SECRET",
    "JWT_SECRET",
    "EMAIL_SERVICE",
    "APP_URL",
    "NOTIFICATION_INTERVAL_SECS",
];

pub fn test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

pub struct TestEnvGuard {
    _lock: MutexGuard<'static, ()>,
    previous: Vec<(&'static str, Option<String>)>,
}

impl TestEnvGuard {
    pub fn new(asset_dir: &Path, db_url: String) -> Self {
        let lock = test_lock().lock().unwrap_or_else(|err| err.into_inner());
        let previous = GUARDED_VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();

        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            for name in GUARDED_VARS {
                std::env::remove_var(name);
            }
            std::env::set_var("TODO_ASSET_DIR", asset_dir);
            std::env::set_var("DATABASE_URL", db_url);
        }

        Self {
            _lock: lock,
            previous,
        }
    }

    /// Sets one of the guarded variables for the lifetime of the guard.
    pub fn set(&self, name: &'static str, value: &str) {
        assert!(
            GUARDED_VARS.contains(&name),
            "{name} is not restored by TestEnvGuard"
        );
        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            std::env::set_var(name, value);
        }
    }
}

impl Drop for TestEnvGuard {
    fn drop(&mut self) {
        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            for (name, value) in &self.previous {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }
}

/// Temporary asset directory with a file-backed SQLite database, dropped
/// together with the env guard.
pub struct TestAssets {
    pub env: TestEnvGuard,
    dir: TempDir,
}

impl TestAssets {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("todo-test-").tempdir()?;
        let db_path = dir.path().join("db.sqlite");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let env = TestEnvGuard::new(dir.path(), db_url);
        Ok(Self { env, dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
