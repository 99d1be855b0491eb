//! Crate-wide constants and the identifier types used by every layer above
//! raw page storage.

/// Size of a page in bytes. Every on-disk structure (header, directory,
/// bucket) must fit within this budget.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel page id meaning "no page" / "not yet allocated".
pub const INVALID_PAGE_ID: PageId = std::u32::MAX;

/// Sentinel frame id meaning "no frame".
pub const INVALID_FRAME_ID: FrameId = std::u32::MAX;

/// Default buffer pool size used by the table heap stand-in.
pub const TABLE_HEAP_BUFFER_POOL_SIZE: usize = 100;

/// Default k for the LRU-K replacer used by [`crate::buffer::BufferPoolManager`].
pub const LRUK_REPLACER_K: usize = 2;

/// Number of bits used to address a header page's directory-page-id slots.
/// `2^HEADER_MAX_DEPTH` directory page ids are stored in the header page.
pub const HEADER_MAX_DEPTH: u32 = 9;

/// Maximum number of bits a directory page can grow `global_depth` to.
/// `2^DIRECTORY_MAX_DEPTH` bucket-page-id / local-depth slots are reserved
/// in a directory page.
pub const DIRECTORY_MAX_DEPTH: u32 = 9;

/// Maximum number of key/value entries a bucket page holds before it must
/// split. Chosen so that a bucket page (size + max_size + entries) fits
/// comfortably inside [`PAGE_SIZE`].
pub const BUCKET_MAX_SIZE: u32 = 128;

/// Initial capacity hint for the aggregation executor's group-by hash table.
pub const DEFAULT_AGGREGATION_CAPACITY: usize = 64;

pub type FrameId = u32;
pub type PageId = u32;
pub type TransactionId = u32;
/// Log sequence number, reserved for the (out of scope) log manager.
pub type Lsn = u64;

pub const INVALID_LSN: Lsn = 0;
pub const INVALID_TXN_ID: TransactionId = 0;
