use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
pub const ASSET_DIR_ENV: &str = "TODO_ASSET_DIR";

/// Directory holding the SQLite database and `config.json`.
///
/// `TODO_ASSET_DIR` wins when set; debug builds use `dev_assets/` at the
/// workspace root, release builds the platform data directory.
pub fn asset_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var(ASSET_DIR_ENV) {
        let override_dir = override_dir.trim();
        if !override_dir.is_empty() {
            return PathBuf::from(override_dir);
        }
    }

    if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("dev", "todo", "todo-server")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".todo"))
    }
    // ✔ macOS → ~/Library/Application Support/dev.todo.todo-server
    // ✔ Linux → ~/.local/share/todo-server   (respects XDG_DATA_HOME)
    // ✔ Windows → %APPDATA%\todo\todo-server
}

/// Same as [`asset_dir`] but creates the directory when missing.
pub fn ensure_asset_dir() -> std::io::Result<PathBuf> {
    let path = asset_dir();
    if !path.exists() {
        std::fs::create_dir_all(&path)?;
    }
    Ok(path)
}

pub fn config_path() -> PathBuf {
    asset_dir().join("config.json")
}

pub fn database_path() -> PathBuf {
    asset_dir().join("db.sqlite")
}

#[cfg(test)]
mod tests {
    use test_support::TestEnvGuard;

    use super::*;

    #[test]
    fn asset_dir_honours_env_override() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("nested");
        let _guard = TestEnvGuard::new(&nested, "sqlite::memory:".to_string());

        assert_eq!(asset_dir(), nested);
        assert_eq!(config_path(), nested.join("config.json"));
        assert!(!nested.exists());

        let created = ensure_asset_dir().unwrap();
        assert_eq!(created, nested);
        assert!(nested.is_dir());
    }
}
