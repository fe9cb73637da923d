use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomeDirError {
    #[error("no platform home directory ({var} is not set)")]
    NoPlatformHome { var: &'static str },

    #[error("failed to create home directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

#[cfg(target_os = "windows")]
const PLATFORM_HOME_VAR: &str = "APPDATA";
#[cfg(not(target_os = "windows"))]
const PLATFORM_HOME_VAR: &str = "HOME";

fn platform_home() -> Result<PathBuf, HomeDirError> {
    std::env::var_os(PLATFORM_HOME_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(HomeDirError::NoPlatformHome {
            var: PLATFORM_HOME_VAR,
        })
}

/// Resolve the application home directory.
///
/// - `None` => `<platform home>/<default_subdir>`
/// - `~` and `~/...` expand against the platform home
/// - relative paths are made absolute against the current directory
///
/// With `create` set, the directory (and parents) is created.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match configured.as_deref().map(str::trim) {
        None | Some("") => platform_home()?.join(default_subdir),
        Some("~") => platform_home()?,
        Some(p) if p.starts_with("~/") || p.starts_with("~\\") => platform_home()?.join(&p[2..]),
        Some(p) => absolutize(Path::new(p))?,
    };

    if create {
        std::fs::create_dir_all(&path).map_err(|source| HomeDirError::Create {
            path: path.clone(),
            source,
        })?;
    }
    Ok(path)
}

fn absolutize(p: &Path) -> Result<PathBuf, HomeDirError> {
    if p.is_absolute() {
        return Ok(p.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(HomeDirError::CurrentDir)?;
    Ok(cwd.join(p))
}
