use std::path::{Path, PathBuf};

use url::Url;

use crate::config::RuntimeMode;
use crate::error::PathError;

/// Overrides application root discovery when set.
pub const APP_ROOT_ENV_VAR: &str = "APP_ROOT";

/// Packaged application root, relative to the bundle's resource directory.
/// Must match the targets under `bundle.resources` in tauri.conf.json.
pub const PACKAGED_ROOT: &str = "app";

const BRIDGE_SCRIPT: &str = "dist-bridge/bridge.js";
const UI_ENTRY: &str = "dist-app/index.html";
const ASSET_DIR: &str = "src/assets";

/// File-system locations the shell needs, resolved against the application
/// root. In development the bridge script and assets sit next to the root;
/// in a packaged build they sit one level above it.
#[derive(Debug, Clone)]
pub struct AppPaths {
    root: PathBuf,
    mode: RuntimeMode,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>, mode: RuntimeMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    /// Packaged layout inside a bundle resource directory:
    /// `{resources}/app/dist-app/` and `{resources}/dist-bridge/`.
    pub fn packaged_in(resource_dir: &Path) -> Self {
        Self::new(resource_dir.join(PACKAGED_ROOT), RuntimeMode::Packaged)
    }

    /// Locate the application root. `APP_ROOT` wins; otherwise development
    /// uses the working directory and packaged builds use the bundle's
    /// resource directory, as reported by the host when it can.
    pub fn discover(mode: RuntimeMode, resource_dir: Option<&Path>) -> Result<Self, PathError> {
        let override_root = std::env::var_os(APP_ROOT_ENV_VAR).map(PathBuf::from);
        let paths = Self::resolve(mode, override_root, resource_dir)?;
        tracing::debug!("Application root resolved to {:?}", paths.root);
        Ok(paths)
    }

    fn resolve(
        mode: RuntimeMode,
        override_root: Option<PathBuf>,
        resource_dir: Option<&Path>,
    ) -> Result<Self, PathError> {
        if let Some(root) = override_root {
            return Ok(Self::new(root, mode));
        }

        match (mode, resource_dir) {
            (RuntimeMode::Development, _) => Ok(Self::new(std::env::current_dir()?, mode)),
            (RuntimeMode::Packaged, Some(dir)) => Ok(Self::packaged_in(dir)),
            (RuntimeMode::Packaged, None) => {
                let exe = std::env::current_exe()?;
                let exe = exe.canonicalize().unwrap_or(exe);
                let exe_dir = exe.parent().map(Path::to_path_buf).unwrap_or(exe);
                Ok(Self::packaged_in(&find_resource_dir(&exe_dir)))
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn is_development(&self) -> bool {
        self.mode.is_development()
    }

    fn mode_segment(&self) -> &'static str {
        if self.is_development() {
            "."
        } else {
            ".."
        }
    }

    /// Compiled bridge script injected into the window before page scripts run.
    pub fn bridge_script(&self) -> PathBuf {
        self.root.join(self.mode_segment()).join(BRIDGE_SCRIPT)
    }

    /// Entry document of the packaged UI bundle.
    pub fn ui_entry(&self) -> PathBuf {
        self.root.join(UI_ENTRY)
    }

    /// `file:` URL of [`Self::ui_entry`]. Both the window loader and the frame
    /// validator take the packaged UI URL from here.
    pub fn ui_entry_url(&self) -> Result<Url, PathError> {
        let entry = self.ui_entry();
        Url::from_file_path(&entry).map_err(|()| PathError::NotAbsolute(entry))
    }

    pub fn asset_dir(&self) -> PathBuf {
        self.root.join(self.mode_segment()).join(ASSET_DIR)
    }
}

/// Resource directory next to the executable when the host can't report one.
/// Falls back to the executable's own directory, which is where resources
/// land for unbundled builds.
fn find_resource_dir(exe_dir: &Path) -> PathBuf {
    // Tauri resource paths by platform:
    let candidates: &[PathBuf] = &[
        // macOS: {app}/Contents/MacOS/{exe} -> ../Resources
        exe_dir.join("../Resources"),
        // Linux (AppImage/deb): {exe_dir}/../lib/shellkit
        exe_dir.join("../lib/shellkit"),
        // Windows installer and unbundled builds: alongside the exe
        exe_dir.to_path_buf(),
    ];
    for candidate in candidates {
        if AppPaths::packaged_in(candidate).ui_entry().exists() {
            return candidate.canonicalize().unwrap_or_else(|_| candidate.clone());
        }
    }
    exe_dir.to_path_buf()
}

/// An absolute root on whatever platform the tests run on.
#[cfg(test)]
pub(crate) fn test_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\app")
    } else {
        PathBuf::from("/app")
    }
}
