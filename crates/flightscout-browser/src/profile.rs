use crate::Result;
use std::path::{Path, PathBuf};

enum ProfileDir {
    /// Fresh directory, removed again on drop
    Scratch(PathBuf),
    /// Caller-owned directory that keeps cookies between runs
    Kept(PathBuf),
}

/// Chrome user-data directory for a scrape session
pub struct ProfileManager {
    dir: ProfileDir,
}

impl ProfileManager {
    /// Fresh profile removed on drop, so each run starts without cookies
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("flightscout-profile-")
            .tempdir()?;
        Ok(Self {
            dir: ProfileDir::Scratch(dir.keep()),
        })
    }

    /// Profile at an explicit path, created if missing and kept afterwards
    pub fn persistent(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            dir: ProfileDir::Kept(path),
        })
    }

    /// Named persistent profile under `~/.flightscout/profiles`
    pub fn named(name: &str) -> Result<Self> {
        let root = dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".flightscout")
            .join("profiles");
        Self::persistent(root.join(name))
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            ProfileDir::Scratch(path) | ProfileDir::Kept(path) => path,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.dir, ProfileDir::Scratch(_))
    }
}

impl Drop for ProfileManager {
    fn drop(&mut self) {
        if let ProfileDir::Scratch(path) = &self.dir
            && let Err(e) = std::fs::remove_dir_all(path)
        {
            tracing::debug!("Could not remove profile {}: {}", path.display(), e);
        }
    }
}
