pub mod disk;
pub mod index;
pub mod page;
pub use page::{BasicPageGuard, Page, ReadPageGuard, WritePageGuard};
