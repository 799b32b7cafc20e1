use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::component::Component;
use crate::error::{Error, Result};

pub const DEFAULT_ROOT: &str = "activity_logs";
pub const LOG_FILE_NAME: &str = "activity.json";

/// Filesystem layout of the per-component activity logs:
/// `<root>/<component>/activity.json`.
///
/// Producers own the files. The store only creates missing ones.
#[derive(Debug, Clone)]
pub struct ActivityStore {
    root: PathBuf,
}

impl Default for ActivityStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl ActivityStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, component: Component) -> PathBuf {
        self.root.join(component.as_str()).join(LOG_FILE_NAME)
    }

    /// Create every component directory, and an `activity.json` holding `[]`
    /// where none exists. Returns the files that were created.
    pub fn ensure_layout(&self) -> Result<Vec<(Component, PathBuf)>> {
        let mut created = Vec::new();
        for component in Component::ALL {
            let path = self.path_for(component);
            let dir = self.root.join(component.as_str());
            fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

            // create_new never clobbers a file a producer wrote in the meantime
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(b"[]").map_err(|e| Error::io(&path, e))?;
                    info!(component = component.as_str(), path = %path.display(), "created activity log");
                    created.push((component, path));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(Error::io(&path, e)),
            }
        }
        Ok(created)
    }

    pub fn read(&self, component: Component) -> Result<String> {
        let path = self.path_for(component);
        fs::read_to_string(&path).map_err(|e| Error::io(&path, e))
    }
}
