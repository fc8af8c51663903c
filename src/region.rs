//! Physical memory window access.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use log::{debug, info, trace};
use memmap2::{MmapMut, MmapOptions};

use crate::error::Error;

/// Conventional physical memory device.
pub const DEV_MEM: &str = "/dev/mem";

/// Typed 32-bit access to a window of device registers.
///
/// Reads take `&mut self`: reading a data register may advance the device's
/// FIFO, so a read is never assumed to be idempotent.
pub trait Registers {
    /// Window length in bytes.
    fn window_len(&self) -> usize;

    fn read_u32(&mut self, offset: usize) -> u32;

    fn write_u32(&mut self, offset: usize, value: u32);
}

/// A shared read/write mapping of `len` bytes of physical memory at `base`.
///
/// The mapping is released when the region is dropped, on every exit path.
#[derive(Debug)]
pub struct DeviceRegion {
    map: MmapMut,
    base: u64,
    path: PathBuf,
}

impl DeviceRegion {
    pub fn open(path: impl AsRef<Path>, base: u64, len: usize) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("opening {} for window {:#010x}+{:#x}", path.display(), base, len);

        let file: File = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Error::ResourceUnavailable {
                path: path.to_owned(),
                source,
            })?;

        // SAFETY: the mapping is of device memory owned by this process for
        // the lifetime of the region; it is only accessed through volatile
        // word reads/writes below, never through references into the map.
        let map = unsafe { MmapOptions::new().offset(base).len(len).map_mut(&file) }
            .map_err(|source| Error::MappingFailed { base, len, source })?;

        info!("mapped {:#x} bytes at {:#010x} from {}", len, base, path.display());

        Ok(Self {
            map,
            base,
            path: path.to_owned(),
        })
    }

    fn check(&self, offset: usize) {
        assert!(
            offset % 4 == 0 && offset + 4 <= self.map.len(),
            "register offset {offset:#x} outside the {:#x} byte window",
            self.map.len()
        );
    }
}

impl Registers for DeviceRegion {
    fn window_len(&self) -> usize {
        self.map.len()
    }

    fn read_u32(&mut self, offset: usize) -> u32 {
        self.check(offset);
        // SAFETY: offset is word aligned and inside the mapping (checked
        // above); volatile because the device changes the value under us.
        let value = unsafe { self.map.as_ptr().add(offset).cast::<u32>().read_volatile() };
        trace!("read {:#010x} = {:#010x}", self.base + offset as u64, value);
        value
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.check(offset);
        trace!("write {:#010x} = {:#010x}", self.base + offset as u64, value);
        // SAFETY: as in `read_u32`; the write has device side effects and must
        // not be elided or reordered.
        unsafe {
            self.map
                .as_mut_ptr()
                .add(offset)
                .cast::<u32>()
                .write_volatile(value)
        }
    }
}

impl Drop for DeviceRegion {
    fn drop(&mut self) {
        debug!(
            "unmapping {:#x} bytes at {:#010x} ({})",
            self.map.len(),
            self.base,
            self.path.display()
        );
    }
}
