//! Shared document-identity space for one set of rankings.
//!
//! Every distinct identifier gets a dense handle. Handles follow descending
//! cross-ranking frequency, so handle 0 is the document listed by the most
//! rankers; ties keep first-encounter order (rankers walked in input order).

use std::collections::HashMap;
use std::hash::Hash;

use crate::{AggregationError, Result};

/// Where a document appeared in one ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the ranker (input ranking) that listed the document.
    pub ranker: usize,
    /// 0-based position inside that ranking.
    pub position: usize,
    /// Length of that ranking.
    pub len: usize,
}

impl Position {
    /// Borda credit for this appearance: `len - position`.
    ///
    /// The top of a list of length `L` earns `L`, the bottom earns 1.
    #[inline]
    #[must_use]
    pub const fn credit(&self) -> usize {
        self.len - self.position
    }
}

/// Dense handle space plus the position index for one set of rankings.
///
/// # Example
///
/// ```rust
/// use concord::DocumentPool;
///
/// let pool = DocumentPool::build(&[vec!["x", "y"], vec!["y"]]).unwrap();
/// assert_eq!(pool.handle(&"y"), Some(0)); // listed twice
/// assert_eq!(pool.handle(&"x"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct DocumentPool<I> {
    /// handle -> identifier
    documents: Vec<I>,
    handles: HashMap<I, usize>,
    /// handle -> appearances, in ranker order
    positions: Vec<Vec<Position>>,
    /// ranker -> local order of handles
    rankings: Vec<Vec<usize>>,
}

impl<I: Clone + Eq + Hash> DocumentPool<I> {
    /// Build the pool for `rankings`.
    ///
    /// An empty slice (or only empty rankings) yields an empty pool.
    ///
    /// # Errors
    ///
    /// [`AggregationError::DuplicateDocument`] if a ranking lists the same
    /// identifier twice.
    pub fn build<L: AsRef<[I]>>(rankings: &[L]) -> Result<Self> {
        let estimated_size: usize = rankings.iter().map(|r| r.as_ref().len()).sum();

        // Occurrence counts in first-encounter order.
        let mut counts: Vec<(I, usize)> = Vec::with_capacity(estimated_size);
        let mut slots: HashMap<I, usize> = HashMap::with_capacity(estimated_size);
        for ranking in rankings {
            for id in ranking.as_ref() {
                if let Some(&slot) = slots.get(id) {
                    counts[slot].1 += 1;
                } else {
                    slots.insert(id.clone(), counts.len());
                    counts.push((id.clone(), 1));
                }
            }
        }
        // Stable: equal counts keep first-encounter order.
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let documents: Vec<I> = counts.into_iter().map(|(id, _)| id).collect();
        let handles: HashMap<I, usize> = documents
            .iter()
            .enumerate()
            .map(|(handle, id)| (id.clone(), handle))
            .collect();

        let mut positions: Vec<Vec<Position>> = vec![Vec::new(); documents.len()];
        let mut local_orders = Vec::with_capacity(rankings.len());
        for (ranker, ranking) in rankings.iter().enumerate() {
            let items = ranking.as_ref();
            let len = items.len();
            let mut local = Vec::with_capacity(len);
            for (position, id) in items.iter().enumerate() {
                let handle = handles[id];
                let seen = &mut positions[handle];
                // Rankers are walked in order, so a repeat shows up as the last entry.
                if seen.last().is_some_and(|p| p.ranker == ranker) {
                    return Err(AggregationError::DuplicateDocument { ranker, position });
                }
                seen.push(Position {
                    ranker,
                    position,
                    len,
                });
                local.push(handle);
            }
            local_orders.push(local);
        }

        Ok(Self {
            documents,
            handles,
            positions,
            rankings: local_orders,
        })
    }

    /// Handle assigned to `id`, if it appears in any ranking.
    #[must_use]
    pub fn handle(&self, id: &I) -> Option<usize> {
        self.handles.get(id).copied()
    }

    /// Identifier behind `handle`.
    #[must_use]
    pub fn identifier(&self, handle: usize) -> Option<&I> {
        self.documents.get(handle)
    }
}

impl<I> DocumentPool<I> {
    /// Translate an order of handles back to identifiers.
    ///
    /// Handles outside the pool are skipped.
    #[must_use]
    pub fn resolve(&self, order: &[usize]) -> Vec<I>
    where
        I: Clone,
    {
        order
            .iter()
            .filter_map(|&handle| self.documents.get(handle).cloned())
            .collect()
    }

    /// Number of distinct documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when no ranking lists any document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of rankers (input rankings), including empty ones.
    #[must_use]
    pub fn num_rankers(&self) -> usize {
        self.rankings.len()
    }

    /// Appearances of `handle` across rankings.
    #[must_use]
    pub fn positions(&self, handle: usize) -> &[Position] {
        self.positions.get(handle).map_or(&[], Vec::as_slice)
    }

    /// Per-handle appearance lists, indexed by handle.
    pub(crate) fn position_index(&self) -> &[Vec<Position>] {
        &self.positions
    }

    /// Every ranker's local order, expressed in handles.
    #[must_use]
    pub fn rankings(&self) -> &[Vec<usize>] {
        &self.rankings
    }
}
