//! The [`DiskScheduler`] schedules disk read and write operations.
//!
//! A request is scheduled by calling [`DiskScheduler::schedule`] with an
//! appropriate [`DiskRequest`]. The scheduler maintains a single background
//! worker thread that processes scheduled requests *in FIFO order* using the
//! disk manager. The background thread is spawned in the constructor and
//! joined in the destructor, after a sentinel value has told it to stop.

use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::common::error::Result;
use crate::storage::disk::DiskManager;
use crate::storage::page::Page;

/// A Write or Read request for the [`DiskManager`] to execute.
pub enum DiskRequest {
    Read {
        /// The page being read into from disk.
        page: Page,
        /// Signaled once the read completes (or fails).
        callback: oneshot::Sender<Result<()>>,
    },
    Write {
        /// The page being written out to disk.
        page: Page,
        /// Signaled once the write completes (or fails).
        callback: oneshot::Sender<Result<()>>,
    },
}

enum QueueEntry {
    Request(DiskRequest),
    Shutdown,
}

pub struct DiskScheduler {
    request_queue: crossbeam::channel::Sender<QueueEntry>,
    background_thread: Option<thread::JoinHandle<()>>,
    disk_manager: Arc<DiskManager>,
}

impl DiskScheduler {
    pub fn new(disk_manager: Arc<DiskManager>) -> Self {
        let (tx, rx) = crossbeam::channel::unbounded();
        let worker_disk_manager = disk_manager.clone();
        let background_thread =
            thread::spawn(move || Self::start_worker_thread(rx, worker_disk_manager));
        Self {
            request_queue: tx,
            background_thread: Some(background_thread),
            disk_manager,
        }
    }

    /// The disk manager backing this scheduler, for callers (the buffer
    /// pool's `delete_page`) that need to reach the allocator directly
    /// rather than go through the read/write request queue.
    pub fn disk_manager(&self) -> &DiskManager {
        &self.disk_manager
    }

    /// Schedules a request for the `DiskManager` to execute. Requests are
    /// processed strictly in submission order by the single background
    /// worker; there is no cross-request ordering guarantee beyond that.
    pub fn schedule(&self, r: DiskRequest) {
        self.request_queue
            .send(QueueEntry::Request(r))
            .expect("disk scheduler worker thread has already exited");
    }

    fn start_worker_thread(
        rx: crossbeam::channel::Receiver<QueueEntry>,
        disk_manager: Arc<DiskManager>,
    ) {
        while let Ok(entry) = rx.recv() {
            match entry {
                QueueEntry::Request(DiskRequest::Read { page, callback }) => {
                    let page_id = page.get_page_id().expect("scheduled page has no id");
                    trace!(page_id, "disk scheduler: read");
                    let result = disk_manager.read_page(page_id, &mut *page.get_data_mut());
                    let _ = callback.send(result);
                }
                QueueEntry::Request(DiskRequest::Write { page, callback }) => {
                    let page_id = page.get_page_id().expect("scheduled page has no id");
                    trace!(page_id, "disk scheduler: write");
                    let result = disk_manager.write_page(page_id, &*page.get_data());
                    let _ = callback.send(result);
                }
                QueueEntry::Shutdown => break,
            }
        }
        debug!("disk scheduler worker thread exiting");
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        // Enqueue a sentinel so the worker drains everything scheduled
        // before us, then exits; join it so no contained resource is
        // released while I/O might still be in flight.
        let _ = self.request_queue.send(QueueEntry::Shutdown);
        if let Some(handle) = self.background_thread.take() {
            let _ = handle.join();
        }
    }
}
