use std::mem::ManuallyDrop;
use std::sync::Arc;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::common::config::{PageId, PAGE_SIZE};
use crate::storage::page::page::{Page, PageReadLatch, PageWriteLatch};

/// An RAII guard over a pinned page that holds no latch of its own.
///
/// Acquiring one pins the page; dropping it unpins, reporting whichever
/// dirty flag accumulated via [`BasicPageGuard::get_data_mut`]. It can be
/// [`upgrade_read`](BasicPageGuard::upgrade_read)d or
/// [`upgrade_write`](BasicPageGuard::upgrade_write)d into a latch-holding
/// guard without the page being evicted in between, since the pin is held
/// throughout.
pub struct BasicPageGuard {
    bpm: Arc<BufferPoolManager>,
    page: Page,
    is_dirty: bool,
}

impl BasicPageGuard {
    pub fn new(bpm: Arc<BufferPoolManager>, page: Page) -> BasicPageGuard {
        Self {
            bpm,
            page,
            is_dirty: false,
        }
    }

    /// Upgrades to a [`ReadPageGuard`], acquiring the shared latch. The
    /// page stays pinned throughout — it cannot be evicted during the
    /// upgrade.
    pub fn upgrade_read(self) -> ReadPageGuard {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the pin it represents is
        // moved into the returned guard rather than released and
        // reacquired.
        let bpm = unsafe { std::ptr::read(&this.bpm) };
        let page = unsafe { std::ptr::read(&this.page) };
        let is_dirty = this.is_dirty;
        let latch = page.acquire_read_latch();
        ReadPageGuard {
            guard: BasicPageGuard { bpm, page, is_dirty },
            latch,
        }
    }

    /// Upgrades to a [`WritePageGuard`], acquiring the exclusive latch.
    pub fn upgrade_write(self) -> WritePageGuard {
        let this = ManuallyDrop::new(self);
        // SAFETY: see `upgrade_read`.
        let bpm = unsafe { std::ptr::read(&this.bpm) };
        let page = unsafe { std::ptr::read(&this.page) };
        let latch = page.acquire_write_latch();
        WritePageGuard {
            guard: BasicPageGuard {
                bpm,
                page,
                is_dirty: true,
            },
            latch,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page.get_page_id().expect("guarded page has no id")
    }

    pub fn get_data(&self) -> parking_lot::MappedRwLockReadGuard<'_, [u8; PAGE_SIZE]> {
        self.page.get_data()
    }

    pub fn get_data_mut(&mut self) -> parking_lot::MappedRwLockWriteGuard<'_, [u8; PAGE_SIZE]> {
        self.is_dirty = true;
        self.page.get_data_mut()
    }
}

impl Drop for BasicPageGuard {
    fn drop(&mut self) {
        self.bpm.unpin_page(self.page_id(), self.is_dirty);
    }
}

/// An RAII guard over a pinned page holding its shared latch.
pub struct ReadPageGuard {
    guard: BasicPageGuard,
    latch: PageReadLatch,
}

impl ReadPageGuard {
    pub fn new(bpm: Arc<BufferPoolManager>, page: Page) -> Self {
        let latch = page.acquire_read_latch();
        Self {
            guard: BasicPageGuard::new(bpm, page),
            latch,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn get_data(&self) -> &[u8] {
        self.latch.data()
    }
}

/// An RAII guard over a pinned page holding its exclusive latch. Acquiring
/// one unconditionally marks the page dirty, since exclusive access is
/// only ever requested in order to write.
pub struct WritePageGuard {
    guard: BasicPageGuard,
    latch: PageWriteLatch,
}

impl WritePageGuard {
    pub fn new(bpm: Arc<BufferPoolManager>, page: Page) -> Self {
        let latch = page.acquire_write_latch();
        let mut guard = BasicPageGuard::new(bpm, page);
        guard.is_dirty = true;
        Self { guard, latch }
    }

    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn get_data(&self) -> &[u8] {
        self.latch.data()
    }

    pub fn get_data_mut(&mut self) -> &mut [u8] {
        self.latch.data_mut()
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::buffer::buffer_pool_manager::BufferPoolManager;
    use crate::storage::disk::disk_manager::DiskManager;

    #[test]
    fn basic_guard_unpins_on_drop() {
        let buffer_pool_size = 5;
        let k = 2;

        let dir = TempDir::new("test").unwrap();
        let db_file = dir.path().join("test.db");
        let disk_manager = DiskManager::new(db_file.to_str().unwrap()).unwrap();
        let bpm = Arc::new(BufferPoolManager::new(buffer_pool_size, disk_manager, k));

        let page0 = bpm.new_page().unwrap();
        assert_eq!(1, page0.get_pin_count());

        let guarded_page = BasicPageGuard::new(bpm.clone(), page0.clone());
        assert_eq!(*page0.get_data(), *guarded_page.get_data());
        assert_eq!(page0.get_page_id(), Some(guarded_page.page_id()));

        drop(guarded_page);
        assert_eq!(0, page0.get_pin_count());
    }

    #[test]
    fn read_and_write_guards_see_each_others_writes() {
        let dir = TempDir::new("test").unwrap();
        let db_file = dir.path().join("test.db");
        let disk_manager = DiskManager::new(db_file.to_str().unwrap()).unwrap();
        let bpm = Arc::new(BufferPoolManager::new(5, disk_manager, 2));

        let page = bpm.new_page().unwrap();
        {
            let mut guard = WritePageGuard::new(bpm.clone(), page.clone());
            guard.get_data_mut()[0] = 42;
        }
        let guard = ReadPageGuard::new(bpm.clone(), page.clone());
        assert_eq!(guard.get_data()[0], 42);
    }

    #[test]
    fn upgrade_preserves_pin_across_transition() {
        let dir = TempDir::new("test").unwrap();
        let db_file = dir.path().join("test.db");
        let disk_manager = DiskManager::new(db_file.to_str().unwrap()).unwrap();
        let bpm = Arc::new(BufferPoolManager::new(5, disk_manager, 2));

        let page = bpm.new_page().unwrap();
        assert_eq!(1, page.get_pin_count());
        let basic = BasicPageGuard::new(bpm.clone(), page.clone());
        let write_guard = basic.upgrade_write();
        assert_eq!(1, page.get_pin_count());
        drop(write_guard);
        assert_eq!(0, page.get_pin_count());
    }
}
