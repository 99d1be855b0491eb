//! A three-level (header → directory → bucket) disk-resident extendible
//! hash index (section 4.6), built entirely on top of the buffer pool and
//! its page guards. Bucket splits, directory doubling, and merge-on-delete
//! all go through the same `fetch_page_*`/`new_page_*` surface every other
//! client of the buffer pool uses.
//!
//! The index maps a fixed-width `i32` key — the key type every in-scope
//! executor actually needs (equality filters, equi-join columns) — to a
//! single [`Rid`], refusing duplicate keys, matching section 4.6's
//! "insert refuses duplicates".

use std::sync::Arc;

use tracing::{debug, trace};

use super::bucket_page::HashTableBucketPage;
use super::directory_page::HashTableDirectoryPage;
use super::header_page::HashTableHeaderPage;
use crate::buffer::BufferPoolManager;
use crate::common::config::{PageId, BUCKET_MAX_SIZE, DIRECTORY_MAX_DEPTH, HEADER_MAX_DEPTH};
use crate::common::rid::Rid;

const fn ceil_log2(mut n: u32) -> u32 {
    let mut bits = 0;
    n = n.saturating_sub(1);
    while n > 0 {
        n >>= 1;
        bits += 1;
    }
    bits
}

/// Section 3's header/directory/bucket sizing invariant: the bits spent
/// selecting a header slot, a directory slot, and an entry within a
/// bucket must not exceed the 32-bit hash this index computes.
const _: () = assert!(HEADER_MAX_DEPTH + DIRECTORY_MAX_DEPTH + ceil_log2(BUCKET_MAX_SIZE) <= 32);

/// murmur3's 32-bit finalizer, applied to the raw key bits. Deterministic
/// across a process's lifetime, which is all a non-durable index needs
/// (section 1's Non-goals exclude crash recovery).
fn hash_key(key: i32) -> u32 {
    let mut h = key as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

pub struct DiskExtendibleHashTable {
    bpm: Arc<BufferPoolManager>,
    header_page_id: PageId,
    bucket_max_size: u32,
    header_max_depth: u32,
    directory_max_depth: u32,
}

impl DiskExtendibleHashTable {
    pub fn new(
        bpm: Arc<BufferPoolManager>,
        header_max_depth: u32,
        directory_max_depth: u32,
        bucket_max_size: u32,
    ) -> Self {
        let guard = bpm.new_page_guarded().expect("buffer pool exhausted allocating hash header");
        let header_page_id = guard.page_id();
        let mut write = guard.upgrade_write();
        HashTableHeaderPage::init(write.get_data_mut(), header_max_depth);
        Self {
            bpm,
            header_page_id,
            bucket_max_size,
            header_max_depth,
            directory_max_depth,
        }
    }

    pub fn header_page_id(&self) -> PageId {
        self.header_page_id
    }

    /// Looks up `key`. `None` if absent or if no directory/bucket has been
    /// created yet for its hash range.
    pub fn get(&self, key: i32) -> Option<Rid> {
        let hash = hash_key(key);

        let header = self.bpm.fetch_page_read(self.header_page_id)?;
        let directory_page_id = {
            let page = HashTableHeaderPage::view(header.get_data());
            page.directory_page_id_at(page.hash_to_directory_index(hash))
        }?;
        drop(header);

        let directory = self.bpm.fetch_page_read(directory_page_id)?;
        let bucket_page_id = {
            let page = HashTableDirectoryPage::view(directory.get_data());
            page.bucket_page_id_at(page.hash_to_bucket_index(hash))
        }?;
        drop(directory);

        let bucket = self.bpm.fetch_page_read(bucket_page_id)?;
        HashTableBucketPage::view(bucket.get_data()).get(key)
    }

    /// Inserts `(key, rid)`, returning `false` if `key` already maps to a
    /// value or the directory is saturated at `max_depth_d` (section 4.6's
    /// `DirectoryFull`).
    pub fn insert(&self, key: i32, rid: Rid) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        let hash = hash_key(key);

        loop {
            let directory_page_id = self.directory_page_id_for(hash);
            let bucket_idx = {
                let directory = self.bpm.fetch_page_read(directory_page_id).expect("pool exhausted");
                HashTableDirectoryPage::view(directory.get_data()).hash_to_bucket_index(hash)
            };
            let bucket_page_id = self.bucket_page_id_for(directory_page_id, bucket_idx);

            {
                let mut bucket = self
                    .bpm
                    .fetch_page_write(bucket_page_id)
                    .expect("pool exhausted");
                if HashTableBucketPage::view_mut(bucket.get_data_mut()).insert(key, rid) {
                    return true;
                }
            }

            if !self.split_bucket(directory_page_id, bucket_idx, bucket_page_id) {
                return false; // directory is already at max_depth_d
            }
            // loop retries the insert against the (now split) bucket.
        }
    }

    /// Finds (creating if necessary) the directory page id covering
    /// `hash`'s header slot.
    fn directory_page_id_for(&self, hash: u32) -> PageId {
        let dir_idx = {
            let header = self.bpm.fetch_page_read(self.header_page_id).expect("pool exhausted");
            let page = HashTableHeaderPage::view(header.get_data());
            let idx = page.hash_to_directory_index(hash);
            if let Some(id) = page.directory_page_id_at(idx) {
                return id;
            }
            idx
        };

        let mut header = self.bpm.fetch_page_write(self.header_page_id).expect("pool exhausted");
        if let Some(id) = HashTableHeaderPage::view(header.get_data()).directory_page_id_at(dir_idx) {
            return id; // lost the race to another writer
        }
        let guard = self.bpm.new_page_guarded().expect("pool exhausted");
        let new_id = guard.page_id();
        let mut write = guard.upgrade_write();
        HashTableDirectoryPage::init(write.get_data_mut(), self.directory_max_depth);
        HashTableHeaderPage::view_mut(header.get_data_mut()).set_directory_page_id_at(dir_idx, new_id);
        debug!(header_page_id = self.header_page_id, new_id, "hash index: created directory page");
        new_id
    }

    /// Finds (creating if necessary) the bucket page id at `bucket_idx`
    /// within `directory_page_id`.
    fn bucket_page_id_for(&self, directory_page_id: PageId, bucket_idx: usize) -> PageId {
        {
            let directory = self.bpm.fetch_page_read(directory_page_id).expect("pool exhausted");
            if let Some(id) = HashTableDirectoryPage::view(directory.get_data()).bucket_page_id_at(bucket_idx) {
                return id;
            }
        }
        let mut directory = self.bpm.fetch_page_write(directory_page_id).expect("pool exhausted");
        if let Some(id) = HashTableDirectoryPage::view(directory.get_data()).bucket_page_id_at(bucket_idx) {
            return id;
        }
        let guard = self.bpm.new_page_guarded().expect("pool exhausted");
        let new_id = guard.page_id();
        let mut write = guard.upgrade_write();
        HashTableBucketPage::init(write.get_data_mut(), self.bucket_max_size);
        let directory_page = HashTableDirectoryPage::view_mut(directory.get_data_mut());
        directory_page.set_bucket_page_id_at(bucket_idx, new_id);
        directory_page.set_local_depth_at(bucket_idx, 0);
        new_id
    }

    /// Grows the directory if necessary, splits `old_bucket_id`, and
    /// redistributes its entries. Returns `false` (no mutation) if the
    /// directory is already saturated and a grow was required but
    /// refused.
    fn split_bucket(&self, directory_page_id: PageId, bucket_idx: usize, old_bucket_id: PageId) -> bool {
        let mut directory = self.bpm.fetch_page_write(directory_page_id).expect("pool exhausted");
        let dir_page = HashTableDirectoryPage::view_mut(directory.get_data_mut());

        let local_depth = dir_page.local_depth_at(bucket_idx);
        if local_depth == dir_page.global_depth() && !dir_page.grow() {
            return false; // DirectoryFull
        }
        let new_local_depth = local_depth + 1;
        trace!(directory_page_id, bucket_idx, new_local_depth, "hash index: splitting bucket");

        let new_bucket_guard = self.bpm.new_page_guarded().expect("pool exhausted");
        let new_bucket_id = new_bucket_guard.page_id();
        let mut new_bucket_write = new_bucket_guard.upgrade_write();
        HashTableBucketPage::init(new_bucket_write.get_data_mut(), self.bucket_max_size);

        {
            let mut old_bucket = self.bpm.fetch_page_write(old_bucket_id).expect("pool exhausted");
            let old_page = HashTableBucketPage::view_mut(old_bucket.get_data_mut());
            let entries = old_page.all_entries();
            old_page.clear();
            let new_page = HashTableBucketPage::view_mut(new_bucket_write.get_data_mut());
            for (key, rid) in entries {
                let bit = (hash_key(key) >> (new_local_depth - 1)) & 1;
                if bit == 0 {
                    old_page.insert(key, rid);
                } else {
                    new_page.insert(key, rid);
                }
            }
        }

        HashTableDirectoryPage::view_mut(directory.get_data_mut()).update_directory_mapping(
            old_bucket_id,
            new_bucket_id,
            new_local_depth,
        );
        true
    }

    /// Removes `key`, attempting to merge the now-possibly-emptier bucket
    /// with its image and to shrink the directory, per section 4.6.
    /// Returns `false` if `key` wasn't present.
    pub fn remove(&self, key: i32) -> bool {
        let hash = hash_key(key);

        let header = self.bpm.fetch_page_read(self.header_page_id);
        let Some(directory_page_id) = header.as_ref().and_then(|h| {
            let page = HashTableHeaderPage::view(h.get_data());
            page.directory_page_id_at(page.hash_to_directory_index(hash))
        }) else {
            return false;
        };
        drop(header);

        let bucket_idx = {
            let directory = self.bpm.fetch_page_read(directory_page_id).expect("pool exhausted");
            HashTableDirectoryPage::view(directory.get_data()).hash_to_bucket_index(hash)
        };
        let Some(bucket_page_id) = ({
            let directory = self.bpm.fetch_page_read(directory_page_id).expect("pool exhausted");
            HashTableDirectoryPage::view(directory.get_data()).bucket_page_id_at(bucket_idx)
        }) else {
            return false;
        };

        let removed = {
            let mut bucket = self.bpm.fetch_page_write(bucket_page_id).expect("pool exhausted");
            HashTableBucketPage::view_mut(bucket.get_data_mut()).remove(key)
        };
        if !removed {
            return false;
        }

        self.try_merge(directory_page_id, bucket_idx);
        self.try_shrink(directory_page_id);
        true
    }

    fn try_merge(&self, directory_page_id: PageId, mut bucket_idx: usize) {
        loop {
            let mut directory = self.bpm.fetch_page_write(directory_page_id).expect("pool exhausted");
            let dir_page = HashTableDirectoryPage::view_mut(directory.get_data_mut());
            let local_depth = dir_page.local_depth_at(bucket_idx);
            if local_depth == 0 {
                return;
            }
            let image_idx = dir_page.split_image_index(bucket_idx, local_depth);
            if image_idx >= dir_page.size() || dir_page.local_depth_at(image_idx) != local_depth {
                return;
            }
            let Some(this_id) = dir_page.bucket_page_id_at(bucket_idx) else {
                return;
            };
            let Some(image_id) = dir_page.bucket_page_id_at(image_idx) else {
                return;
            };
            if this_id == image_id {
                return;
            }

            let this_empty = self.bucket_is_empty(this_id);
            let image_empty = self.bucket_is_empty(image_id);
            if !this_empty && !image_empty {
                return;
            }

            let (survivor, emptied) = if this_empty { (image_id, this_id) } else { (this_id, image_id) };
            let merged_depth = local_depth - 1;
            HashTableDirectoryPage::view_mut(directory.get_data_mut())
                .merge_buckets(this_id, image_id, survivor, merged_depth);
            drop(directory);

            debug!(directory_page_id, this_id, image_id, survivor, "hash index: merged buckets");
            self.bpm.delete_page(emptied);

            bucket_idx &= (1usize << merged_depth) - 1;
        }
    }

    fn bucket_is_empty(&self, bucket_id: PageId) -> bool {
        let bucket = self.bpm.fetch_page_read(bucket_id).expect("pool exhausted");
        HashTableBucketPage::view(bucket.get_data()).is_empty()
    }

    fn try_shrink(&self, directory_page_id: PageId) {
        loop {
            let mut directory = self.bpm.fetch_page_write(directory_page_id).expect("pool exhausted");
            let dir_page = HashTableDirectoryPage::view_mut(directory.get_data_mut());
            if dir_page.global_depth() == 0 || !dir_page.can_shrink() {
                return;
            }
            dir_page.shrink();
        }
    }

    /// Current directory global depth, for tests asserting the merge
    /// round-trip property (section 8).
    pub fn global_depth(&self) -> Option<u32> {
        let header = self.bpm.fetch_page_read(self.header_page_id)?;
        let page = HashTableHeaderPage::view(header.get_data());
        let first_directory = (0..(1usize << self.header_max_depth)).find_map(|idx| page.directory_page_id_at(idx));
        drop(header);
        let dir_id = first_directory?;
        let directory = self.bpm.fetch_page_read(dir_id)?;
        Some(HashTableDirectoryPage::view(directory.get_data()).global_depth())
    }
}
