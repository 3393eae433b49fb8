//! ConfigEnv trait for testable I/O.
//!
//! Every file read, environment lookup and working-directory query made
//! during resolution goes through [`ConfigEnv`], so tests can swap the
//! process environment for a [`MockEnv`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Environment trait for configuration I/O operations.
///
/// # Example
///
/// ```
/// use strata::env::MockEnv;
///
/// let env = MockEnv::new()
///     .with_file("config.yml", "db:\n  host: localhost\n")
///     .with_env("APP_DB_PORT", "5432");
/// ```
pub trait ConfigEnv: Send + Sync {
    /// Read a file's contents as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the file does not exist, is not valid UTF-8,
    /// or cannot be read.
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Check if a regular file exists at `path`.
    fn file_exists(&self, path: &Path) -> bool;

    /// Get an environment variable by name.
    fn get_env(&self, name: &str) -> Option<String>;

    /// Get all environment variables whose name starts with `prefix`.
    ///
    /// Returns tuples of (full_name, value).
    fn env_vars_with_prefix(&self, prefix: &str) -> Vec<(String, String)>;

    /// Directory that relative search paths are resolved against.
    fn current_dir(&self) -> PathBuf;
}

/// Production environment backed by the real process.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnv;

impl RealEnv {
    pub fn new() -> Self {
        Self
    }
}

impl ConfigEnv for RealEnv {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn get_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn env_vars_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        std::env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect()
    }

    fn current_dir(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

#[derive(Debug, Clone)]
enum MockFile {
    Content(String),
    PermissionDenied,
}

/// Mock environment for testing configuration resolution.
///
/// Files are keyed by the exact path the resolver will ask for. The current
/// directory defaults to `.`, so discovered files live at `./config.yml`,
/// `./src/config/config.yml` and so on.
///
/// ```
/// use strata::env::{ConfigEnv, MockEnv};
/// use std::path::Path;
///
/// let env = MockEnv::new()
///     .with_current_dir("/srv/app")
///     .with_file("/srv/app/config.yml", "basic:\n  listenPort: 8080\n")
///     .with_env("XNTHA_DB_HOST", "db.internal");
///
/// assert!(env.file_exists(Path::new("/srv/app/config.yml")));
/// assert_eq!(env.get_env("XNTHA_DB_HOST").as_deref(), Some("db.internal"));
/// ```
#[derive(Debug, Clone)]
pub struct MockEnv {
    files: HashMap<PathBuf, MockFile>,
    env_vars: HashMap<String, String>,
    cwd: PathBuf,
}

impl Default for MockEnv {
    fn default() -> Self {
        Self {
            files: HashMap::new(),
            env_vars: HashMap::new(),
            cwd: PathBuf::from("."),
        }
    }
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files
            .insert(path.into(), MockFile::Content(content.into()));
        self
    }

    /// Add a file that exists but returns "permission denied" when read.
    pub fn with_unreadable_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into(), MockFile::PermissionDenied);
        self
    }

    /// Set an environment variable.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    /// Set multiple environment variables from an iterator.
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the directory used for config file discovery.
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = dir.into();
        self
    }
}

impl ConfigEnv for MockEnv {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        match self.files.get(path) {
            Some(MockFile::Content(content)) => Ok(content.clone()),
            Some(MockFile::PermissionDenied) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("mock permission denied: {}", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock file not found: {}", path.display()),
            )),
        }
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn get_env(&self, name: &str) -> Option<String> {
        self.env_vars.get(name).cloned()
    }

    fn env_vars_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = self
            .env_vars
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        vars.sort();
        vars
    }

    fn current_dir(&self) -> PathBuf {
        self.cwd.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_env_file_exists() {
        let env = RealEnv::new();
        // Cargo.toml should exist in the project root
        assert!(env.file_exists(Path::new("Cargo.toml")));
        assert!(!env.file_exists(Path::new("nonexistent.yml")));
    }

    #[test]
    fn test_mock_env_files() {
        let env = MockEnv::new()
            .with_file("config.yml", "host: localhost")
            .with_file("other.yml", "port: 8080");

        assert!(env.file_exists(Path::new("config.yml")));
        assert!(env.file_exists(Path::new("other.yml")));
        assert!(!env.file_exists(Path::new("missing.yml")));

        let content = env.read_file(Path::new("config.yml")).unwrap();
        assert_eq!(content, "host: localhost");
    }

    #[test]
    fn test_mock_env_missing_file() {
        let env = MockEnv::new();

        let result = env.read_file(Path::new("missing.yml"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_mock_env_permission_denied() {
        let env = MockEnv::new().with_unreadable_file("secret.yml");

        assert!(env.file_exists(Path::new("secret.yml")));
        let result = env.read_file(Path::new("secret.yml"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_mock_env_vars() {
        let env = MockEnv::new()
            .with_env("APP_HOST", "localhost")
            .with_envs([("APP_PORT", "8080"), ("OTHER_VAR", "value")]);

        assert_eq!(env.get_env("APP_HOST"), Some("localhost".to_string()));
        assert_eq!(env.get_env("MISSING"), None);

        let app_vars = env.env_vars_with_prefix("APP_");
        assert_eq!(
            app_vars,
            vec![
                ("APP_HOST".to_string(), "localhost".to_string()),
                ("APP_PORT".to_string(), "8080".to_string()),
            ]
        );
    }

    #[test]
    fn test_mock_env_current_dir() {
        assert_eq!(MockEnv::new().current_dir(), PathBuf::from("."));
        let env = MockEnv::new().with_current_dir("/srv/app");
        assert_eq!(env.current_dir(), PathBuf::from("/srv/app"));
    }
}
