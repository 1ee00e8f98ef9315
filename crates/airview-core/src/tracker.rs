use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

/// An address and the number of views attributed to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewRecord {
    pub address: String,
    pub views: u64,
}

impl ViewRecord {
    pub fn new(address: impl Into<String>, views: u64) -> Self {
        Self {
            address: address.into(),
            views,
        }
    }

    /// Unused ranking slots hold an empty address with zero views.
    pub fn is_sentinel(&self) -> bool {
        self.address.is_empty()
    }
}

#[derive(Debug)]
struct TrackerState {
    /// Lifetime view count for every address ever seen
    counts: HashMap<String, u64>,
    /// Fixed-size ranking, approximately sorted by views descending
    tops: Vec<ViewRecord>,
}

/// Approximate top-K popularity tracker.
///
/// Every address keeps an exact lifetime count, but the ranking itself is
/// maintained incrementally and only ever moves an entry one slot per view.
/// An address whose views arrive in a burst therefore climbs gradually and the
/// ranking can lag the true order. A newcomer that ties the last ranked entry
/// displaces it. The one-step convergence is part of the contract: do not
/// replace it with a heap or a full sort.
#[derive(Debug)]
pub struct ViewTracker {
    capacity: usize,
    inner: RwLock<TrackerState>,
}

impl ViewTracker {
    /// Create a tracker whose ranking holds `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(TrackerState {
                counts: HashMap::new(),
                tops: vec![ViewRecord::default(); capacity],
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record one view of `address`.
    pub fn increment(&self, address: &str) {
        let mut guard = self.inner.write();
        let state = &mut *guard;

        let count = {
            let count = state.counts.entry(address.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let tops = &mut state.tops;
        if let Some(index) = tops.iter().position(|record| record.address == address) {
            tops[index].views += 1;
            if index != 0 && tops[index - 1].views < tops[index].views {
                tops.swap(index, index - 1);
            }
            return;
        }

        let Some(last) = tops.len().checked_sub(1) else {
            return;
        };

        // Furthest-back slot still ahead of the new count; 0 when none is.
        let mut out_index = 0;
        for index in (0..tops.len()).rev() {
            out_index = index;
            if tops[index].views > count {
                break;
            }
        }

        if out_index != last {
            let evicted = tops.pop();
            tops.insert(out_index + 1, ViewRecord::new(address, count));
            trace!(
                address,
                views = count,
                slot = out_index + 1,
                evicted = evicted.as_ref().map(|r| r.address.as_str()).unwrap_or(""),
                "address entered ranking"
            );
        }
    }

    /// First `num` ranking slots, or all of them when `num` is 0.
    ///
    /// # Panics
    ///
    /// Panics if `num` exceeds the tracker's capacity. Asking for more slots
    /// than are tracked is a programming error, not a runtime condition.
    pub fn top_addresses(&self, num: usize) -> Vec<ViewRecord> {
        assert!(
            num <= self.capacity,
            "Cannot get more top addresses than we are keeping track of \
             (requested {num}, tracking {})",
            self.capacity
        );
        let num = if num == 0 { self.capacity } else { num };

        self.inner.read().tops[..num].to_vec()
    }

    /// Lifetime view count for `address`, whether or not it is ranked.
    pub fn views(&self, address: &str) -> u64 {
        self.inner.read().counts.get(address).copied().unwrap_or(0)
    }

    /// Number of distinct addresses ever viewed.
    pub fn tracked_addresses(&self) -> usize {
        self.inner.read().counts.len()
    }
}
