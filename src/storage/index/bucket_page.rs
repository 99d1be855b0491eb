//! On-disk layout of the hash index's bucket page (section 6): `size`,
//! `max_size`, then a packed array of key/value entries. Keys are the
//! fixed-width `i32` key type the in-scope executors index on (equality
//! filters and equi-join keys); values are table [`Rid`]s.

use crate::common::config::{BUCKET_MAX_SIZE, PAGE_SIZE};
use crate::common::rid::Rid;

/// Array capacity backing a bucket page. [`BUCKET_MAX_SIZE`] is already
/// sized (section 3) so `size + max_size + entries` fits comfortably
/// within one page; a runtime-configured `max_size` (for tests exercising
/// small buckets) can be anything `<= BUCKET_ARRAY_SIZE`.
pub const BUCKET_ARRAY_SIZE: usize = BUCKET_MAX_SIZE as usize;

#[derive(Clone, Copy)]
#[repr(C)]
struct HashBucketEntry {
    key: i32,
    occupied: u8,
    _pad: [u8; 3],
    page_id: u32,
    slot_num: u32,
}

#[repr(C)]
pub struct HashTableBucketPage {
    size: u32,
    max_size: u32,
    entries: [HashBucketEntry; BUCKET_ARRAY_SIZE],
}

const _: () = assert!(std::mem::size_of::<HashTableBucketPage>() <= PAGE_SIZE);

impl HashTableBucketPage {
    pub fn view(data: &[u8]) -> &HashTableBucketPage {
        debug_assert!(data.len() >= std::mem::size_of::<HashTableBucketPage>());
        unsafe { &*(data.as_ptr() as *const HashTableBucketPage) }
    }

    pub fn view_mut(data: &mut [u8]) -> &mut HashTableBucketPage {
        debug_assert!(data.len() >= std::mem::size_of::<HashTableBucketPage>());
        unsafe { &mut *(data.as_mut_ptr() as *mut HashTableBucketPage) }
    }

    pub fn init(data: &mut [u8], max_size: u32) {
        let page = Self::view_mut(data);
        page.size = 0;
        page.max_size = max_size.min(BUCKET_ARRAY_SIZE as u32);
        for entry in page.entries.iter_mut() {
            entry.occupied = 0;
        }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size >= self.max_size
    }

    pub fn get(&self, key: i32) -> Option<Rid> {
        self.entries[..self.size as usize]
            .iter()
            .find(|e| e.occupied != 0 && e.key == key)
            .map(|e| Rid::new(e.page_id, e.slot_num))
    }

    pub fn contains(&self, key: i32) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `(key, rid)`. Returns `false` without mutating the page if
    /// the bucket is full; callers are responsible for refusing duplicate
    /// keys before calling (section 4.6 checks that globally, across the
    /// whole index, not just within one bucket).
    pub fn insert(&mut self, key: i32, rid: Rid) -> bool {
        if self.is_full() {
            return false;
        }
        let idx = self.size as usize;
        self.entries[idx] = HashBucketEntry {
            key,
            occupied: 1,
            _pad: [0; 3],
            page_id: rid.page_id(),
            slot_num: rid.slot_num(),
        };
        self.size += 1;
        true
    }

    pub fn remove(&mut self, key: i32) -> bool {
        let Some(pos) = self.entries[..self.size as usize]
            .iter()
            .position(|e| e.occupied != 0 && e.key == key)
        else {
            return false;
        };
        let last = self.size as usize - 1;
        self.entries[pos] = self.entries[last];
        self.entries[last].occupied = 0;
        self.size -= 1;
        true
    }

    pub fn all_entries(&self) -> Vec<(i32, Rid)> {
        self.entries[..self.size as usize]
            .iter()
            .map(|e| (e.key, Rid::new(e.page_id, e.slot_num)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.size = 0;
    }
}
