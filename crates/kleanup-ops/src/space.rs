//! Free disk space probing.

use std::path::Path;

/// Reports free space available to the archive.
pub trait SpaceProbe {
    /// Bytes available on the filesystem holding `path`.
    fn available_space(&self, path: &Path) -> std::io::Result<u64>;
}

/// Probe backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSpaceProbe;

impl SpaceProbe for DiskSpaceProbe {
    fn available_space(&self, path: &Path) -> std::io::Result<u64> {
        fs2::available_space(path)
    }
}
