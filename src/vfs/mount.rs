//! Mount registration.
//!
//! A [`MountTable`] owns every registered filesystem and routes each path to
//! the one with the longest matching mount point. Registration hands back a
//! [`MountHandle`] which is the only way to unmount again.

use tracing::info;

use super::path::{resolve, strip_mount_point};
use super::{DirEntryInfo, Filesystem, OpenFile, Stat, StatVfs, S_IFDIR};
use crate::common::{basename, parent_folder};
use crate::{FrozenError, Result};

/// Proof of a live registration, consumed by [`MountTable::unmount`].
#[derive(Debug, PartialEq, Eq)]
pub struct MountHandle {
    id: u64,
    mount_point: String,
}

impl MountHandle {
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }
}

struct Mounted {
    id: u64,
    mount_point: String,
    fs: Box<dyn Filesystem>,
}

/// The set of mounted filesystems plus a current directory for relative paths.
pub struct MountTable {
    mounts: Vec<Mounted>,
    next_id: u64,
    cwd: String,
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MountTable {
    pub fn new() -> Self {
        Self { mounts: Vec::new(), next_id: 0, cwd: "/".to_string() }
    }

    /// Registers `fs` at `target`.
    ///
    /// Fails fast with `AlreadyExists` when `target` is already a mount point
    /// or names something that exists inside a mounted filesystem.
    pub fn mount<F: Filesystem + 'static>(&mut self, fs: F, target: &str) -> Result<MountHandle> {
        let mount_point = resolve(&self.cwd, target)?;
        if self.is_occupied(&mount_point) {
            return Err(FrozenError::AlreadyExists(mount_point));
        }
        let mut fs: Box<dyn Filesystem> = Box::new(fs);
        fs.mount(true)?;

        let id = self.next_id;
        self.next_id += 1;
        self.mounts.push(Mounted { id, mount_point: mount_point.clone(), fs });
        info!("mounted filesystem at {}", mount_point);
        Ok(MountHandle { id, mount_point })
    }

    /// Deregisters the filesystem behind `handle` and gives it back.
    pub fn unmount(&mut self, handle: MountHandle) -> Result<Box<dyn Filesystem>> {
        let pos = self
            .mounts
            .iter()
            .position(|m| m.id == handle.id)
            .ok_or_else(|| FrozenError::NotFound(handle.mount_point.clone()))?;
        let mut mounted = self.mounts.remove(pos);
        mounted.fs.umount();
        if strip_mount_point(&mounted.mount_point, &self.cwd).is_some() {
            self.cwd = "/".to_string();
        }
        info!("{} unmounted", mounted.mount_point);
        Ok(mounted.fs)
    }

    pub fn mount_points(&self) -> impl Iterator<Item = &str> {
        self.mounts.iter().map(|m| m.mount_point.as_str())
    }

    pub fn is_mounted(&self, mount_point: &str) -> bool {
        self.mounts.iter().any(|m| m.mount_point == mount_point)
    }

    fn is_occupied(&self, mount_point: &str) -> bool {
        if self.is_mounted(mount_point) {
            return true;
        }
        match self.locate(mount_point) {
            Ok((idx, inner)) => self.mounts[idx].fs.stat(&inner).is_ok(),
            Err(_) => false,
        }
    }

    /// Index of the owning mount and the path inside it.
    fn locate(&self, path: &str) -> Result<(usize, String)> {
        let resolved = resolve(&self.cwd, path)?;
        let found = self
            .mounts
            .iter()
            .enumerate()
            .filter_map(|(i, m)| strip_mount_point(&m.mount_point, &resolved).map(|inner| (i, m, inner)))
            .max_by_key(|(_, m, _)| m.mount_point.len())
            .map(|(i, _, inner)| (i, inner.to_string()));
        found.ok_or(FrozenError::NotFound(resolved))
    }

    pub fn open(&self, path: &str, mode: &str) -> Result<OpenFile> {
        let (idx, inner) = self.locate(path)?;
        self.mounts[idx].fs.open(&inner, mode)
    }

    pub fn stat(&self, path: &str) -> Result<Stat> {
        match self.locate(path) {
            Ok((idx, inner)) => self.mounts[idx].fs.stat(&inner),
            Err(e) => {
                if self.mount_children(path)?.is_empty() {
                    return Err(e);
                }
                Ok(Stat { mode: S_IFDIR, size: 0 })
            }
        }
    }

    pub fn statvfs(&self, path: &str) -> Result<StatVfs> {
        let (idx, _) = self.locate(path)?;
        Ok(self.mounts[idx].fs.statvfs())
    }

    /// Listing of `path`, with mount points directly below it shown as folders.
    pub fn ilistdir(&self, path: &str) -> Result<Vec<DirEntryInfo>> {
        let mut rows = match self.locate(path) {
            Ok((idx, inner)) => self.mounts[idx].fs.ilistdir(&inner)?,
            Err(e) => {
                if self.mount_children(path)?.is_empty() {
                    return Err(e);
                }
                Vec::new()
            }
        };
        for name in self.mount_children(path)? {
            if !rows.iter().any(|r| r.name == name) {
                rows.push(DirEntryInfo { name, kind: S_IFDIR, inode: 0, size: 0 });
            }
        }
        Ok(rows)
    }

    pub fn listdir(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.ilistdir(path)?.into_iter().map(|e| e.name).collect())
    }

    pub fn chdir(&mut self, path: &str) -> Result<()> {
        let resolved = resolve(&self.cwd, path)?;
        match self.locate(&resolved) {
            Ok((idx, inner)) => self.mounts[idx].fs.chdir(&inner)?,
            Err(e) => {
                if self.mount_children(&resolved)?.is_empty() {
                    return Err(e);
                }
            }
        }
        self.cwd = resolved;
        Ok(())
    }

    pub fn getcwd(&self) -> &str {
        &self.cwd
    }

    pub fn remove(&mut self, path: &str) -> Result<()> {
        let (idx, inner) = self.locate(path)?;
        self.mounts[idx].fs.remove(&inner)
    }

    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        let (idx, inner) = self.locate(path)?;
        self.mounts[idx].fs.mkdir(&inner)
    }

    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        let (idx, inner) = self.locate(path)?;
        self.mounts[idx].fs.rmdir(&inner)
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let (idx, inner_from) = self.locate(from)?;
        let (to_idx, inner_to) = self.locate(to)?;
        if idx != to_idx {
            return Err(FrozenError::InvalidArgument(format!("rename across mounts: {from} -> {to}")));
        }
        self.mounts[idx].fs.rename(&inner_from, &inner_to)
    }

    fn mount_children(&self, path: &str) -> Result<Vec<String>> {
        let resolved = resolve(&self.cwd, path)?;
        Ok(self
            .mounts
            .iter()
            .filter(|m| m.mount_point != "/" && parent_folder(&m.mount_point) == resolved)
            .map(|m| basename(&m.mount_point).to_string())
            .collect())
    }
}
