//! [`DiskManager`] takes care of the allocation and deallocation of pages
//! within a database file. It performs blocking reads and writes of pages
//! to and from disk, providing a logical file layer within the context of
//! a database management system.
//!
//! This is the CORE's sole concrete I/O boundary; everything above it
//! (the disk scheduler, the buffer pool, the hash index) only ever talks
//! to a page-sized byte buffer.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::common::config::{PageId, PAGE_SIZE};
use crate::common::error::Result;

/// Reads and writes fixed-size pages to a single backing file.
///
/// `DiskManager` is the concrete collaborator behind the `DiskManager`
/// contract described by the spec (section 6): blocking `read_page`/
/// `write_page` of exactly one page's worth of bytes.
pub struct DiskManager {
    db_io: Mutex<File>,
    file_name: String,
    num_flushes: AtomicU32,
    num_writes: AtomicU32,
    next_page_id: AtomicU32,
}

impl DiskManager {
    /// Opens (creating if necessary) the database file at `db_file`.
    pub fn new(db_file: &str) -> Result<Self> {
        let path = Path::new(db_file);
        let db_io = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .or_else(|_| {
                OpenOptions::new()
                    .create(true)
                    .read(true)
                    .write(true)
                    .open(path)
            })?;

        Ok(Self {
            db_io: Mutex::new(db_io),
            file_name: db_file.to_string(),
            num_flushes: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
            next_page_id: AtomicU32::new(0),
        })
    }

    /// Writes a page to the database file. `page_data` must be exactly
    /// [`PAGE_SIZE`] bytes.
    pub fn write_page(&self, page_id: PageId, page_data: &[u8]) -> Result<()> {
        assert_eq!(page_data.len(), PAGE_SIZE);
        let offset = page_id as u64 * PAGE_SIZE as u64;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        let mut db_io = self.db_io.lock().unwrap();
        db_io.seek(SeekFrom::Start(offset))?;
        db_io.write_all(page_data)?;
        db_io.flush()?;
        self.num_flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Reads a page from the database file into `page_data`, which must be
    /// exactly [`PAGE_SIZE`] bytes. Reading past the end of the file is
    /// tolerated and fills the remainder with zeroes (a page that was
    /// allocated but never flushed).
    pub fn read_page(&self, page_id: PageId, page_data: &mut [u8]) -> Result<()> {
        assert_eq!(page_data.len(), PAGE_SIZE);
        let offset = page_id as u64 * PAGE_SIZE as u64;

        let mut db_io = self.db_io.lock().unwrap();
        let file_len = db_io.metadata()?.len();
        if offset >= file_len {
            page_data.fill(0);
            return Ok(());
        }
        db_io.seek(SeekFrom::Start(offset))?;
        let read_count = db_io.read(page_data)?;
        if read_count < PAGE_SIZE {
            page_data[read_count..].fill(0);
        }
        Ok(())
    }

    /// Allocates and returns a fresh monotonically increasing page id.
    pub fn allocate_page(&self) -> PageId {
        self.next_page_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Deallocates a page. A no-op placeholder: without a free-space map
    /// there is nothing to reclaim on disk, matching the teacher's own
    /// `BufferPoolManager::deallocate_page`.
    pub fn deallocate_page(&self, _page_id: PageId) {}

    pub fn get_num_flushes(&self) -> u32 {
        self.num_flushes.load(Ordering::Relaxed)
    }

    pub fn get_num_writes(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn read_write_page() {
        let mut buf = [0u8; PAGE_SIZE];
        let mut data = [0u8; PAGE_SIZE];

        let dir = TempDir::new("test").unwrap();
        let db_file = dir.path().join("test.db");
        let dm = DiskManager::new(db_file.to_str().unwrap()).unwrap();
        let test_str = b"A test string.";
        data[..test_str.len()].copy_from_slice(test_str);

        dm.read_page(0, &mut buf).unwrap(); // tolerate empty read

        dm.write_page(0, &data).unwrap();
        dm.read_page(0, &mut buf).unwrap();
        assert_eq!(buf, data);

        buf.fill(0);
        dm.write_page(5, &data).unwrap();
        dm.read_page(5, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn allocate_page_is_monotonic() {
        let dir = TempDir::new("test").unwrap();
        let db_file = dir.path().join("test.db");
        let dm = DiskManager::new(db_file.to_str().unwrap()).unwrap();
        let ids: Vec<_> = (0..5).map(|_| dm.allocate_page()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }
}
