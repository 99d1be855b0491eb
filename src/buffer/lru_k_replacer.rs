use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::common::config::FrameId;
use crate::common::error::{Error, Result};

/// Per-frame access history: the last (up to) `k` access timestamps, oldest
/// first.
#[derive(Debug)]
struct LRUKNode {
    history: VecDeque<u64>,
    is_evictable: bool,
}

impl LRUKNode {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            is_evictable: false,
        }
    }

    fn record_access(&mut self, timestamp: u64, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Backward k-distance: `current - kth_most_recent`, or `None` (+inf)
    /// if fewer than `k` accesses have been recorded.
    fn backward_k_distance(&self, current_timestamp: u64, k: usize) -> Option<u64> {
        if self.history.len() < k {
            None
        } else {
            Some(current_timestamp - self.history[self.history.len() - k])
        }
    }

    fn earliest_access(&self) -> u64 {
        *self.history.front().expect("node always has >=1 access")
    }
}

struct ReplacerState {
    node_store: HashMap<FrameId, LRUKNode>,
    current_timestamp: u64,
    current_size: usize,
}

/// Implements the LRU-K replacement policy.
///
/// The LRU-K algorithm evicts the evictable frame whose backward k-distance
/// is largest. A frame with fewer than `k` historical accesses is given
/// `+inf` as its backward k-distance; when multiple frames are tied at
/// `+inf`, the classical-LRU tiebreak applies (evict whichever was least
/// recently *first* accessed).
pub struct LRUKReplacer {
    state: Mutex<ReplacerState>,
    replacer_size: usize,
    k: usize,
}

impl LRUKReplacer {
    /// `num_frames` is the maximum frame id (exclusive) this replacer will
    /// ever be asked to track; `k` is the LRU-K lookback distance.
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self {
            state: Mutex::new(ReplacerState {
                node_store: HashMap::new(),
                current_timestamp: 0,
                current_size: 0,
            }),
            replacer_size: num_frames,
            k,
        }
    }

    /// Records that `frame_id` was accessed at the current (monotonically
    /// increasing) timestamp, creating its history if this is the first
    /// time it's been seen.
    pub fn record_access(&self, frame_id: FrameId) -> Result<()> {
        if frame_id as usize >= self.replacer_size {
            return Err(Error::InvalidFrame(frame_id));
        }
        let mut state = self.state.lock();
        let ts = state.current_timestamp;
        state.current_timestamp += 1;
        state
            .node_store
            .entry(frame_id)
            .or_insert_with(LRUKNode::new)
            .record_access(ts, self.k);
        Ok(())
    }

    /// Toggles whether `frame_id` is a candidate for eviction. Updates
    /// `size()` only on a genuine evictable/non-evictable transition.
    /// Unknown frames are silently ignored.
    pub fn set_evictable(&self, frame_id: FrameId, set_evictable: bool) {
        let mut state = self.state.lock();
        if let Some(node) = state.node_store.get_mut(&frame_id) {
            if node.is_evictable != set_evictable {
                node.is_evictable = set_evictable;
                if set_evictable {
                    state.current_size += 1;
                } else {
                    state.current_size -= 1;
                }
            }
        }
    }

    /// Evicts the evictable frame with the largest backward k-distance,
    /// clearing its history. Returns `None` if no frame is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let mut state = self.state.lock();
        if state.current_size == 0 {
            return None;
        }
        let current_ts = state.current_timestamp;
        let k = self.k;

        let mut victim: Option<FrameId> = None;
        let mut victim_distance: Option<u64> = None; // None here means +inf
        let mut victim_earliest: u64 = 0;

        for (&frame_id, node) in state.node_store.iter() {
            if !node.is_evictable {
                continue;
            }
            let distance = node.backward_k_distance(current_ts, k);
            let earliest = node.earliest_access();

            let is_better = match (victim_distance, distance) {
                (None, None) => earliest < victim_earliest,
                (None, Some(_)) => false,
                (Some(_), None) => true,
                (Some(v), Some(d)) => d > v,
            };

            if victim.is_none() || is_better {
                victim = Some(frame_id);
                victim_distance = distance;
                victim_earliest = earliest;
            }
        }

        if let Some(frame_id) = victim {
            state.node_store.remove(&frame_id);
            state.current_size -= 1;
        }
        victim
    }

    /// Drops a specific frame's history, regardless of its k-distance rank.
    /// The frame must currently be evictable.
    pub fn remove(&self, frame_id: FrameId) -> Result<()> {
        let mut state = self.state.lock();
        match state.node_store.get(&frame_id) {
            None => Ok(()),
            Some(node) if !node.is_evictable => Err(Error::NonEvictable(frame_id)),
            Some(_) => {
                state.node_store.remove(&frame_id);
                state.current_size -= 1;
                Ok(())
            }
        }
    }

    /// Number of evictable frames currently tracked.
    pub fn size(&self) -> usize {
        self.state.lock().current_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmu_sample_scenario() {
        let lru_replacer = LRUKReplacer::new(7, 2);

        lru_replacer.record_access(1).unwrap();
        lru_replacer.record_access(2).unwrap();
        lru_replacer.record_access(3).unwrap();
        lru_replacer.record_access(4).unwrap();
        lru_replacer.record_access(5).unwrap();
        lru_replacer.record_access(6).unwrap();
        lru_replacer.set_evictable(1, true);
        lru_replacer.set_evictable(2, true);
        lru_replacer.set_evictable(3, true);
        lru_replacer.set_evictable(4, true);
        lru_replacer.set_evictable(5, true);
        lru_replacer.set_evictable(6, false);
        assert_eq!(5, lru_replacer.size());

        lru_replacer.record_access(1).unwrap();

        assert_eq!(Some(2), lru_replacer.evict());
        assert_eq!(Some(3), lru_replacer.evict());
        assert_eq!(Some(4), lru_replacer.evict());
        assert_eq!(lru_replacer.size(), 2);

        lru_replacer.record_access(3).unwrap();
        lru_replacer.record_access(4).unwrap();
        lru_replacer.record_access(5).unwrap();
        lru_replacer.record_access(4).unwrap();
        lru_replacer.set_evictable(3, true);
        lru_replacer.set_evictable(4, true);
        assert_eq!(4, lru_replacer.size());

        assert_eq!(Some(3), lru_replacer.evict());
        assert_eq!(3, lru_replacer.size());

        lru_replacer.set_evictable(6, true);
        assert_eq!(4, lru_replacer.size());
        assert_eq!(Some(6), lru_replacer.evict());
        assert_eq!(3, lru_replacer.size());

        lru_replacer.set_evictable(1, false);
        assert_eq!(2, lru_replacer.size());
        assert_eq!(Some(5), lru_replacer.evict());
        assert_eq!(1, lru_replacer.size());

        lru_replacer.record_access(1).unwrap();
        lru_replacer.record_access(1).unwrap();
        lru_replacer.set_evictable(1, true);
        assert_eq!(2, lru_replacer.size());
        assert_eq!(Some(4), lru_replacer.evict());

        assert_eq!(1, lru_replacer.size());
        assert_eq!(Some(1), lru_replacer.evict());
        assert_eq!(0, lru_replacer.size());

        assert_eq!(None, lru_replacer.evict());
        assert_eq!(0, lru_replacer.size());
    }

    #[test]
    fn invalid_frame_errors() {
        let replacer = LRUKReplacer::new(4, 2);
        assert!(matches!(
            replacer.record_access(10),
            Err(Error::InvalidFrame(10))
        ));
    }

    #[test]
    fn remove_non_evictable_errors() {
        let replacer = LRUKReplacer::new(4, 2);
        replacer.record_access(0).unwrap();
        assert!(matches!(replacer.remove(0), Err(Error::NonEvictable(0))));
        replacer.set_evictable(0, true);
        assert!(replacer.remove(0).is_ok());
    }

    #[test]
    fn k_equals_one_is_classical_lru() {
        // With k=1 every frame has a finite backward distance as soon as it
        // has been accessed once, so eviction always picks the least
        // recently accessed evictable frame.
        let replacer = LRUKReplacer::new(4, 1);
        replacer.record_access(0).unwrap();
        replacer.record_access(1).unwrap();
        replacer.record_access(2).unwrap();
        replacer.set_evictable(0, true);
        replacer.set_evictable(1, true);
        replacer.set_evictable(2, true);

        assert_eq!(Some(0), replacer.evict());
        replacer.record_access(1).unwrap(); // touch 1, now 2 is oldest
        assert_eq!(Some(2), replacer.evict());
        assert_eq!(Some(1), replacer.evict());
    }

    #[test]
    fn infinite_distance_beats_finite() {
        let replacer = LRUKReplacer::new(4, 2);
        replacer.record_access(0).unwrap();
        replacer.record_access(0).unwrap(); // frame 0 has k=2 accesses -> finite distance
        replacer.record_access(1).unwrap(); // frame 1 has 1 access -> +inf distance
        replacer.set_evictable(0, true);
        replacer.set_evictable(1, true);

        assert_eq!(Some(1), replacer.evict());
    }
}
