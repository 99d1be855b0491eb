use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::config::{Lsn, PageId, PAGE_SIZE};

const OFFSET_LSN: usize = 4;

/// `Page` is the basic unit of storage within the database system. It wraps
/// the actual bytes held in main memory plus the book-keeping the buffer
/// pool manager needs: pin count, dirty flag, page id.
///
/// A `Page` handle is cheap to clone (it's an `Arc` around the real state),
/// which lets the buffer pool, its page table, and any page guards all
/// share the same frame without copying page contents.
#[derive(Debug, Clone)]
pub struct Page(Arc<RwLock<PageInner>>);

#[derive(Debug)]
struct PageInner {
    data: [u8; PAGE_SIZE],
    page_id: Option<PageId>,
    pin_count: i32,
    is_dirty: bool,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// Constructs a page with a zeroed-out data buffer and no identity.
    pub fn new() -> Page {
        let inner = PageInner {
            data: [0; PAGE_SIZE],
            page_id: None,
            pin_count: 0,
            is_dirty: false,
        };
        Page(Arc::new(RwLock::new(inner)))
    }

    /// Resets a page back to its just-constructed state. Used when a frame
    /// is handed back to the free list.
    pub fn reset(&self) {
        let mut p = self.0.write();
        p.data.fill(0);
        p.page_id = None;
        p.pin_count = 0;
        p.is_dirty = false;
    }

    /// Returns the actual data contained within this page.
    pub fn get_data(&self) -> MappedRwLockReadGuard<'_, [u8; PAGE_SIZE]> {
        RwLockReadGuard::map(self.0.read(), |i| &i.data)
    }

    pub fn get_data_mut(&self) -> MappedRwLockWriteGuard<'_, [u8; PAGE_SIZE]> {
        RwLockWriteGuard::map(self.0.write(), |i| &mut i.data)
    }

    pub fn set_page_id(&self, page_id: PageId) {
        self.0.write().page_id = Some(page_id);
    }

    pub fn get_page_id(&self) -> Option<PageId> {
        self.0.read().page_id
    }

    pub fn get_pin_count(&self) -> i32 {
        self.0.read().pin_count
    }

    pub fn pin(&self) {
        self.0.write().pin_count += 1;
    }

    pub fn unpin(&self) {
        self.0.write().pin_count -= 1;
    }

    /// True if the page in memory has been modified relative to disk.
    pub fn is_dirty(&self) -> bool {
        self.0.read().is_dirty
    }

    pub fn set_dirty(&self, is_dirty: bool) {
        self.0.write().is_dirty = is_dirty;
    }

    /// Acquires this page's shared latch, blocking until available, and
    /// returns an RAII handle to the underlying bytes. The handle keeps
    /// this page's `Arc` alive for as long as it's held, independent of
    /// `self`'s lifetime — that's what lets [`super::ReadPageGuard`] hold
    /// one across `await`-free scopes without borrowing from the buffer
    /// pool.
    pub fn acquire_read_latch(&self) -> PageReadLatch {
        let page = self.clone();
        let guard = RwLockReadGuard::map(self.0.read(), |i| &i.data);
        // SAFETY: `page` (cloned above) keeps the `Arc<RwLock<PageInner>>`
        // this guard borrows from alive for the lifetime of `PageReadLatch`.
        let guard: MappedRwLockReadGuard<'static, [u8; PAGE_SIZE]> =
            unsafe { std::mem::transmute(guard) };
        PageReadLatch { _page: page, guard }
    }

    /// Acquires this page's exclusive latch; see [`Page::acquire_read_latch`].
    pub fn acquire_write_latch(&self) -> PageWriteLatch {
        let page = self.clone();
        let guard = RwLockWriteGuard::map(self.0.write(), |i| &mut i.data);
        // SAFETY: see `acquire_read_latch`.
        let guard: MappedRwLockWriteGuard<'static, [u8; PAGE_SIZE]> =
            unsafe { std::mem::transmute(guard) };
        PageWriteLatch { _page: page, guard }
    }

    /// The page's log sequence number, stored at a fixed offset within the
    /// page's own bytes (reserved for the out-of-scope log manager).
    pub fn get_lsn(&self) -> Lsn {
        let inner = self.0.read();
        Lsn::from_ne_bytes(
            inner.data[OFFSET_LSN..OFFSET_LSN + std::mem::size_of::<Lsn>()]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_lsn(&self, lsn: Lsn) {
        let mut inner = self.0.write();
        let lsn_bytes = lsn.to_ne_bytes();
        inner.data[OFFSET_LSN..OFFSET_LSN + std::mem::size_of::<Lsn>()].copy_from_slice(&lsn_bytes);
    }
}

/// A held shared latch on a page's bytes.
pub struct PageReadLatch {
    _page: Page,
    guard: MappedRwLockReadGuard<'static, [u8; PAGE_SIZE]>,
}

impl PageReadLatch {
    pub fn data(&self) -> &[u8] {
        &self.guard[..]
    }
}

/// A held exclusive latch on a page's bytes.
pub struct PageWriteLatch {
    _page: Page,
    guard: MappedRwLockWriteGuard<'static, [u8; PAGE_SIZE]>,
}

impl PageWriteLatch {
    pub fn data(&self) -> &[u8] {
        &self.guard[..]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.guard[..]
    }
}
