use crate::error::Error;
use memmap2::MmapMut;

/// Append only view of a writable mapping with a hard capacity.
///
/// The capacity is computed up front as an upper bound of what will be written, so running out of
/// space is a bug in the bound and is reported as [Error::CapacityExceeded] instead of growing.
pub struct FrozenBuffer {
    mmap: MmapMut,
    used: usize,
}

impl FrozenBuffer {
    pub fn new(mmap: MmapMut) -> Self {
        Self { mmap, used: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.mmap.len()
    }

    /// number of bytes written so far
    pub fn used(&self) -> usize {
        self.used
    }

    /// appends `data`, `what` names the item for the error message
    pub fn write(&mut self, what: &'static str, data: &[u8]) -> Result<(), Error> {
        let end = self.used + data.len();
        if end > self.capacity() {
            return Err(Error::CapacityExceeded {
                what,
                used: self.used,
                size: data.len(),
                capacity: self.capacity(),
            });
        }
        self.mmap[self.used..end].copy_from_slice(data);
        self.used = end;
        Ok(())
    }

    /// Flushes the written bytes to disk and releases the mapping.
    ///
    /// Returns the number of bytes used. The mapping is gone once this returns, so the file can be
    /// truncated to that size.
    pub fn finish(self) -> Result<usize, Error> {
        self.mmap.flush()?;
        Ok(self.used)
    }
}
