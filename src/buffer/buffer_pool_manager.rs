use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::lru_k_replacer::LRUKReplacer;
use crate::common::config::{FrameId, PageId};
use crate::storage::disk::{DiskManager, DiskRequest, DiskScheduler};
use crate::storage::page::{BasicPageGuard, Page, ReadPageGuard, WritePageGuard};

/// Reads disk pages to and from an in-memory pool of fixed-size frames.
///
/// Every public method takes `&self`: the buffer pool is meant to be
/// shared behind an `Arc` by every page guard it hands out, so all of its
/// state (page table, free list, replacer) is interior-mutable.
pub struct BufferPoolManager {
    pool_size: usize,
    next_page_id: AtomicU32,

    pages: Vec<Page>,
    disk_scheduler: DiskScheduler,
    page_table: Mutex<HashMap<PageId, FrameId>>,
    replacer: LRUKReplacer,
    free_list: Mutex<Vec<FrameId>>,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk_manager: DiskManager, replacer_k: usize) -> BufferPoolManager {
        let free_list = (0..pool_size as FrameId).rev().collect();
        Self {
            pool_size,
            next_page_id: AtomicU32::new(0),
            pages: (0..pool_size).map(|_| Page::new()).collect(),
            disk_scheduler: DiskScheduler::new(Arc::new(disk_manager)),
            page_table: Mutex::new(HashMap::new()),
            replacer: LRUKReplacer::new(pool_size, replacer_k),
            free_list: Mutex::new(free_list),
        }
    }

    pub fn get_pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn get_pages(&self) -> &[Page] {
        &self.pages
    }

    /// Picks a victim frame from the free list first, falling back to the
    /// replacer. If the victim frame holds a dirty page, that page is
    /// flushed to disk synchronously before the frame is handed back,
    /// keeping the page table's invariants simple at the cost of blocking
    /// the caller on the write.
    fn find_victim_frame(&self) -> Option<FrameId> {
        if let Some(frame_id) = self.free_list.lock().unwrap().pop() {
            return Some(frame_id);
        }
        let frame_id = self.replacer.evict()?;
        let page = &self.pages[frame_id as usize];
        if page.is_dirty() {
            self.flush_frame(page);
        }
        if let Some(page_id) = page.get_page_id() {
            self.page_table.lock().unwrap().remove(&page_id);
        }
        Some(frame_id)
    }

    fn flush_frame(&self, page: &Page) {
        let (tx, rx) = oneshot::channel();
        self.disk_scheduler.schedule(DiskRequest::Write {
            page: page.clone(),
            callback: tx,
        });
        rx.blocking_recv()
            .expect("disk scheduler dropped the completion channel")
            .expect("flush failed");
        page.set_dirty(false);
    }

    /// Creates a new page in the buffer pool. Returns `None` if every
    /// frame is pinned and none can be evicted.
    pub fn new_page(&self) -> Option<Page> {
        let frame_id = self.find_victim_frame()?;
        let page_id = self.allocate_page();
        trace!(page_id, frame_id, "buffer pool: new page");

        let page = &self.pages[frame_id as usize];
        page.reset();
        page.set_page_id(page_id);
        page.pin();
        self.page_table.lock().unwrap().insert(page_id, frame_id);
        let _ = self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Some(page.clone())
    }

    /// [`BasicPageGuard`] wrapper for [`Self::new_page`]. `self` must be
    /// held behind an `Arc` since the returned guard calls back into it
    /// when dropped.
    pub fn new_page_guarded(self: &Arc<Self>) -> Option<BasicPageGuard> {
        let page = self.new_page()?;
        Some(BasicPageGuard::new(self.clone(), page))
    }

    /// Fetches `page_id` from the buffer pool, reading it from disk first
    /// if it isn't resident. Returns `None` if the page isn't resident and
    /// every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Option<Page> {
        if let Some(&frame_id) = self.page_table.lock().unwrap().get(&page_id) {
            let page = &self.pages[frame_id as usize];
            page.pin();
            let _ = self.replacer.record_access(frame_id);
            return Some(page.clone());
        }

        let frame_id = self.find_victim_frame()?;
        let page = &self.pages[frame_id as usize];
        page.reset();
        page.set_page_id(page_id);
        page.pin();

        let (tx, rx) = oneshot::channel();
        self.disk_scheduler.schedule(DiskRequest::Read {
            page: page.clone(),
            callback: tx,
        });
        rx.blocking_recv()
            .expect("disk scheduler dropped the completion channel")
            .expect("read failed");

        debug!(page_id, frame_id, "buffer pool: fetched from disk");
        self.page_table.lock().unwrap().insert(page_id, frame_id);
        let _ = self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Some(page.clone())
    }

    pub fn fetch_page_basic(self: &Arc<Self>, page_id: PageId) -> Option<BasicPageGuard> {
        let page = self.fetch_page(page_id)?;
        Some(BasicPageGuard::new(self.clone(), page))
    }

    pub fn fetch_page_read(self: &Arc<Self>, page_id: PageId) -> Option<ReadPageGuard> {
        let page = self.fetch_page(page_id)?;
        Some(ReadPageGuard::new(self.clone(), page))
    }

    pub fn fetch_page_write(self: &Arc<Self>, page_id: PageId) -> Option<WritePageGuard> {
        let page = self.fetch_page(page_id)?;
        Some(WritePageGuard::new(self.clone(), page))
    }

    /// Decrements `page_id`'s pin count, marking it evictable once it
    /// reaches zero. Returns `false` if the page isn't resident or its pin
    /// count is already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let Some(&frame_id) = self.page_table.lock().unwrap().get(&page_id) else {
            return false;
        };
        let page = &self.pages[frame_id as usize];
        if page.get_pin_count() <= 0 {
            return false;
        }
        if is_dirty {
            page.set_dirty(true);
        }
        page.unpin();
        if page.get_pin_count() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Flushes `page_id` to disk regardless of its dirty flag, clearing
    /// the flag afterwards. Returns `false` if the page isn't resident.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let Some(&frame_id) = self.page_table.lock().unwrap().get(&page_id) else {
            return false;
        };
        self.flush_frame(&self.pages[frame_id as usize]);
        true
    }

    pub fn flush_all_pages(&self) {
        for page in &self.pages {
            if page.get_page_id().is_some() {
                self.flush_frame(page);
            }
        }
    }

    /// Removes `page_id` from the buffer pool. Returns `true` if the page
    /// wasn't resident, or was resident and unpinned (and so could be
    /// deleted); `false` if it's resident but still pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let frame_id = {
            let mut page_table = self.page_table.lock().unwrap();
            let Some(&frame_id) = page_table.get(&page_id) else {
                return true;
            };
            if self.pages[frame_id as usize].get_pin_count() > 0 {
                return false;
            }
            page_table.remove(&page_id);
            frame_id
        };
        let _ = self.replacer.remove(frame_id);
        self.free_list.lock().unwrap().push(frame_id);
        self.pages[frame_id as usize].reset();
        self.disk_scheduler.disk_manager().deallocate_page(page_id);
        true
    }

    fn allocate_page(&self) -> PageId {
        self.next_page_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use rand::distributions::{Distribution, Uniform};
    use tempdir::TempDir;

    use super::*;
    use crate::common::config::PAGE_SIZE;

    #[test]
    fn binary_data_round_trips_through_eviction() {
        let dir = TempDir::new("test").unwrap();
        let db_name = dir.path().join("test.db");
        let buffer_pool_size = 10;
        let k = 5;

        let mut rng = rand::thread_rng();
        let uniform_dist = Uniform::from(std::u8::MIN..=std::u8::MAX);

        let disk_manager = DiskManager::new(db_name.to_str().unwrap()).unwrap();
        let bpm = BufferPoolManager::new(buffer_pool_size, disk_manager, k);

        let page0 = bpm.new_page();
        assert!(page0.is_some());

        let mut random_binary_data: Vec<u8> = (0..PAGE_SIZE).map(|_| uniform_dist.sample(&mut rng)).collect();
        random_binary_data[PAGE_SIZE / 2] = 0;
        random_binary_data[PAGE_SIZE - 1] = 0;

        let page0 = page0.unwrap();
        page0.get_data_mut()[..random_binary_data.len()].copy_from_slice(&random_binary_data);
        assert_eq!(random_binary_data, page0.get_data()[..random_binary_data.len()]);

        for _ in 1..buffer_pool_size {
            assert!(bpm.new_page().is_some());
        }
        for _ in buffer_pool_size..buffer_pool_size * 2 {
            assert!(bpm.new_page().is_none());
        }

        for i in 0..5 {
            assert!(bpm.unpin_page(i, true));
            bpm.flush_page(i);
        }
        for _ in 0..5 {
            let page = bpm.new_page();
            assert!(page.is_some());
            bpm.unpin_page(page.unwrap().get_page_id().unwrap(), false);
        }

        let page0 = bpm.fetch_page(0);
        assert!(page0.is_some());
        let page0 = page0.unwrap();
        assert_eq!(*page0.get_data(), random_binary_data.as_slice());
        assert!(bpm.unpin_page(0, true));
    }

    #[test]
    fn fetch_fails_once_pool_is_saturated() {
        let dir = TempDir::new("test").unwrap();
        let db_name = dir.path().join("test.db");
        let buffer_pool_size = 10;
        let k = 5;

        let disk_manager = DiskManager::new(db_name.to_str().unwrap()).unwrap();
        let bpm = BufferPoolManager::new(buffer_pool_size, disk_manager, k);

        let page0 = bpm.new_page().unwrap();
        assert_eq!(0, page0.get_page_id().unwrap());

        let data = b"Hello";
        page0.get_data_mut()[..data.len()].copy_from_slice(data);
        assert_eq!(data, &page0.get_data()[..data.len()]);

        for _ in 1..buffer_pool_size {
            assert!(bpm.new_page().is_some());
        }
        for _ in buffer_pool_size..buffer_pool_size * 2 {
            assert!(bpm.new_page().is_none());
        }

        for i in 0..5 {
            assert!(bpm.unpin_page(i as PageId, true));
        }
        for _ in 0..4 {
            assert!(bpm.new_page().is_some());
        }

        let page0 = bpm.fetch_page(0);
        assert!(page0.is_some());
        let page0 = page0.unwrap();
        assert_eq!(data, &page0.get_data()[..data.len()]);

        assert!(bpm.unpin_page(0, true));
        assert!(bpm.new_page().is_some());
        assert!(bpm.fetch_page(0).is_none());
    }

    #[test]
    fn delete_page_frees_its_frame() {
        let dir = TempDir::new("test").unwrap();
        let db_name = dir.path().join("test.db");
        let bpm = BufferPoolManager::new(2, DiskManager::new(db_name.to_str().unwrap()).unwrap(), 2);

        let page0 = bpm.new_page().unwrap();
        let id0 = page0.get_page_id().unwrap();
        assert!(!bpm.delete_page(id0)); // still pinned

        assert!(bpm.unpin_page(id0, false));
        assert!(bpm.delete_page(id0));
        assert!(bpm.delete_page(id0)); // already gone: trivially true

        // the freed frame should be reusable
        for _ in 0..2 {
            assert!(bpm.new_page().is_some());
        }
    }
}
