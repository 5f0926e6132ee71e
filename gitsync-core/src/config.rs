//! YAML configuration loading.
//!
//! # Inputs
//!
//! ```text
//! config.yml           settings: work_dir, git options, report transport
//! <repos>.yml ...      one or more `repositories:` lists, merged in order
//! -                    a repository list read from stdin
//! ```
//!
//! # API pattern
//!
//! Functions that depend on the user's home directory have two forms:
//! - `fn_at(home: Option<&Path>, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::{BatchConfig, RepositoryConfig, RepositoryFile, Settings};
use crate::validate::{validate_branch, validate_repository};

/// File name looked up in the current directory and the platform config dir.
pub const SETTINGS_FILE: &str = "config.yml";

/// Path argument that stands for stdin.
pub const STDIN_PATH: &str = "-";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// Pick the settings file: `explicit` if given, else `<cwd>/config.yml`,
/// else `<config_dir>/gitsync/config.yml`.
///
/// An explicit path is returned even when missing so the loader can report it.
pub fn resolve_settings_path(
    explicit: Option<&Path>,
    cwd: &Path,
    config_dir: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let mut searched = vec![cwd.join(SETTINGS_FILE)];
    if let Some(dir) = config_dir {
        searched.push(dir.join("gitsync").join(SETTINGS_FILE));
    }
    searched
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or(ConfigError::NoSettingsFile { searched })
}

/// Expand a leading `~` against `home`.
pub fn expand_tilde_at(home: Option<&Path>, path: &Path) -> Result<PathBuf, ConfigError> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = home.ok_or(ConfigError::HomeNotFound)?;
    Ok(home.join(rest))
}

// ---------------------------------------------------------------------------
// 2. Raw reads
// ---------------------------------------------------------------------------

/// Read a configuration source; `-` reads stdin.
pub fn read_source(path: &Path) -> Result<String, ConfigError> {
    if path == Path::new(STDIN_PATH) {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| io_err("<stdin>", e))?;
        return Ok(buf);
    }
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// 3. Settings
// ---------------------------------------------------------------------------

/// Parse settings YAML; `origin` only annotates errors.
pub fn parse_settings(contents: &str, origin: &Path) -> Result<Settings, ConfigError> {
    serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: origin.to_path_buf(),
        source: e,
    })
}

/// Load, expand and validate the settings file at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_settings_at(home: Option<&Path>, path: &Path) -> Result<Settings, ConfigError> {
    let contents = read_source(path)?;
    let mut settings = parse_settings(&contents, path)?;

    settings.work_dir = expand_tilde_at(home, &settings.work_dir)?;
    if let Some(dir) = settings.log_dir.take() {
        settings.log_dir = Some(expand_tilde_at(home, &dir)?);
    }
    if let Some(dir) = settings.templates_dir.take() {
        settings.templates_dir = Some(expand_tilde_at(home, &dir)?);
    }
    validate_branch("default_branch", &settings.default_branch)?;
    Ok(settings)
}

/// `load_settings_at` convenience wrapper.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    load_settings_at(dirs::home_dir().as_deref(), path)
}

// ---------------------------------------------------------------------------
// 4. Repository files
// ---------------------------------------------------------------------------

/// Parse a `repositories:` YAML document; `origin` only annotates errors.
pub fn parse_repository_file(contents: &str, origin: &Path) -> Result<RepositoryFile, ConfigError> {
    // An empty document deserializes to unit, not to an empty mapping.
    if contents.trim().is_empty() {
        return Ok(RepositoryFile::default());
    }
    serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: origin.to_path_buf(),
        source: e,
    })
}

/// Load one repository file (or stdin for `-`).
pub fn load_repository_file(path: &Path) -> Result<RepositoryFile, ConfigError> {
    let contents = read_source(path)?;
    parse_repository_file(&contents, path)
}

/// Merge repository files in order, validating every entry.
///
/// Names must be unique across all files; the error names both origins.
pub fn merge_repositories(
    files: Vec<(PathBuf, RepositoryFile)>,
) -> Result<Vec<RepositoryConfig>, ConfigError> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut merged = Vec::new();

    for (origin, file) in files {
        for repo in file.repositories {
            validate_repository(&repo)?;
            if let Some(first) = seen.get(repo.name.as_str()) {
                return Err(ConfigError::DuplicateRepository {
                    name: repo.name.0.clone(),
                    first: first.clone(),
                    second: origin.clone(),
                });
            }
            seen.insert(repo.name.0.clone(), origin.clone());
            merged.push(repo);
        }
    }
    Ok(merged)
}

// ---------------------------------------------------------------------------
// 5. Batch
// ---------------------------------------------------------------------------

/// Load the settings file and every repository file into one [`BatchConfig`].
pub fn load_batch_at(
    home: Option<&Path>,
    settings_path: &Path,
    repository_files: &[PathBuf],
) -> Result<BatchConfig, ConfigError> {
    let settings = load_settings_at(home, settings_path)?;
    let mut files = Vec::with_capacity(repository_files.len());
    for path in repository_files {
        files.push((path.clone(), load_repository_file(path)?));
    }
    let repositories = merge_repositories(files)?;
    Ok(BatchConfig {
        settings,
        repositories,
    })
}

/// `load_batch_at` convenience wrapper.
pub fn load_batch(
    settings_path: &Path,
    repository_files: &[PathBuf],
) -> Result<BatchConfig, ConfigError> {
    load_batch_at(dirs::home_dir().as_deref(), settings_path, repository_files)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
