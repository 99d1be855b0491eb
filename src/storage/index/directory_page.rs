//! On-disk layout of the hash index's directory page (section 6):
//! `global_depth`, `max_depth_d`, a local-depth byte per slot, and a
//! bucket-page-id per slot. Slot count is `2^global_depth`; the arrays are
//! sized to the configured maximum `2^max_depth_d` so growing the
//! directory never needs a new page.

use crate::common::config::{PageId, INVALID_PAGE_ID, PAGE_SIZE};

pub const DIRECTORY_ARRAY_SIZE: usize = 1 << 9;

#[repr(C)]
pub struct HashTableDirectoryPage {
    global_depth: u32,
    max_depth: u32,
    local_depths: [u8; DIRECTORY_ARRAY_SIZE],
    bucket_page_ids: [PageId; DIRECTORY_ARRAY_SIZE],
}

const _: () = assert!(std::mem::size_of::<HashTableDirectoryPage>() <= PAGE_SIZE);

impl HashTableDirectoryPage {
    pub fn view(data: &[u8]) -> &HashTableDirectoryPage {
        debug_assert!(data.len() >= std::mem::size_of::<HashTableDirectoryPage>());
        unsafe { &*(data.as_ptr() as *const HashTableDirectoryPage) }
    }

    pub fn view_mut(data: &mut [u8]) -> &mut HashTableDirectoryPage {
        debug_assert!(data.len() >= std::mem::size_of::<HashTableDirectoryPage>());
        unsafe { &mut *(data.as_mut_ptr() as *mut HashTableDirectoryPage) }
    }

    pub fn init(data: &mut [u8], max_depth: u32) {
        let page = Self::view_mut(data);
        page.global_depth = 0;
        page.max_depth = max_depth;
        page.local_depths.fill(0);
        page.bucket_page_ids.fill(INVALID_PAGE_ID);
    }

    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn size(&self) -> usize {
        1 << self.global_depth
    }

    /// The bottom `global_depth` bits of `hash` select a directory slot.
    pub fn hash_to_bucket_index(&self, hash: u32) -> usize {
        if self.global_depth == 0 {
            return 0;
        }
        (hash & ((1 << self.global_depth) - 1)) as usize
    }

    pub fn local_depth_at(&self, index: usize) -> u32 {
        self.local_depths[index] as u32
    }

    pub fn set_local_depth_at(&mut self, index: usize, depth: u32) {
        self.local_depths[index] = depth as u8;
    }

    pub fn bucket_page_id_at(&self, index: usize) -> Option<PageId> {
        match self.bucket_page_ids[index] {
            INVALID_PAGE_ID => None,
            id => Some(id),
        }
    }

    pub fn set_bucket_page_id_at(&mut self, index: usize, page_id: PageId) {
        self.bucket_page_ids[index] = page_id;
    }

    /// The bucket image a split produces: the slot sharing `bucket_idx`'s
    /// low `local_depth - 1` bits but differing in bit `local_depth - 1`.
    pub fn split_image_index(&self, bucket_idx: usize, local_depth: u32) -> usize {
        bucket_idx ^ (1 << (local_depth - 1))
    }

    /// Doubles the directory: slot `i` is copied into slot `i +
    /// 2^global_depth` (same bucket pointer, same local depth), then
    /// `global_depth` is incremented. Fails (returns `false`, no mutation)
    /// if already at `max_depth`.
    pub fn grow(&mut self) -> bool {
        if self.global_depth >= self.max_depth {
            return false;
        }
        let old_size = self.size();
        for i in 0..old_size {
            self.local_depths[i + old_size] = self.local_depths[i];
            self.bucket_page_ids[i + old_size] = self.bucket_page_ids[i];
        }
        self.global_depth += 1;
        true
    }

    /// Halves the directory by decrementing `global_depth`. Callers must
    /// first establish that no slot's local depth equals `global_depth`
    /// (section 4.6's merge postcondition); the upper half's entries
    /// simply become unreachable, matching the fixed-capacity array the
    /// page always carries.
    pub fn shrink(&mut self) {
        if self.global_depth > 0 {
            self.global_depth -= 1;
        }
    }

    /// True if every occupied slot's local depth is strictly below
    /// `global_depth` — the condition that permits [`Self::shrink`].
    pub fn can_shrink(&self) -> bool {
        let size = self.size();
        (0..size).all(|i| self.local_depths[i] < self.global_depth as u8)
    }

    /// Reassigns every slot currently pointing at `old_bucket_id` to
    /// `new_bucket_id` when its index's bit `new_local_depth - 1` is set,
    /// and updates both slots' local depth to `new_local_depth`. Used
    /// after a bucket split (section 4.6 step 3): every directory entry
    /// that mapped to the bucket being split, not just the two indices
    /// touched by [`Self::split_image_index`], must be repointed.
    pub fn update_directory_mapping(
        &mut self,
        old_bucket_id: PageId,
        new_bucket_id: PageId,
        new_local_depth: u32,
    ) {
        let size = self.size();
        for i in 0..size {
            if self.bucket_page_ids[i] == old_bucket_id {
                self.local_depths[i] = new_local_depth as u8;
                if (i >> (new_local_depth - 1)) & 1 == 1 {
                    self.bucket_page_ids[i] = new_bucket_id;
                }
            }
        }
    }

    /// Repoints every slot pointing at either `bucket_a` or `bucket_b` to
    /// `survivor`, at `merged_depth` (one less than their shared local
    /// depth). Used when merging a bucket with its image on delete.
    pub fn merge_buckets(&mut self, bucket_a: PageId, bucket_b: PageId, survivor: PageId, merged_depth: u32) {
        let size = self.size();
        for i in 0..size {
            if self.bucket_page_ids[i] == bucket_a || self.bucket_page_ids[i] == bucket_b {
                self.bucket_page_ids[i] = survivor;
                self.local_depths[i] = merged_depth as u8;
            }
        }
    }
}
