//! Skip list - a probabilistic ordered-set container.
//!
//! A skip list keeps elements sorted by key and reaches any of them in
//! O(log n) expected time without the rebalancing machinery of a
//! deterministic tree. Every element sits in the level-0 chain; each
//! higher level holds a shrinking random subset acting as an express
//! lane:
//!
//! ```text
//! Level 2:  HEAD ──────────────────────► 50 ─────────────────► TAIL ⟲
//! Level 1:  HEAD ─────────► 20 ────────► 50 ───────► 60 ─────► TAIL ⟲
//! Level 0:  HEAD ──► 10 ──► 20 ──► 30 ──► 50 ──► 60 ────────► TAIL ⟲
//! ```
//!
//! # Design
//!
//! Nodes live in a slab and link to each other by slot index rather than
//! by owning pointers. The head and tail sentinels occupy fixed slots 0
//! and 1; the tail links back to itself at every level, which is the
//! terminator every walk and cursor checks for. Indices sidestep the
//! ownership cycles a self-linked terminator would otherwise create.
//!
//! Searches walk top level down: at each level, forward while the next
//! key still precedes the target, then drop a level carrying the last
//! visited node. Insertion records the predecessor at every level (the
//! path vector) and splices the new node's tower in behind them.
//!
//! # Cursors
//!
//! A [`Cursor`] is a detached position: it holds a slot index, not a
//! borrow, so the list can be mutated between two [`advance`] calls. The
//! one mutation with defined behavior while a cursor is parked is
//! removing the exact element the cursor rests on; the next `advance`
//! reports [`CursorInvalidated`]. Any other mutation with a live cursor
//! violates the cursor contract: a later insert may reuse the removed
//! element's slot, after which a stale cursor yields unrelated elements.
//! That misuse is a logic hazard only, never memory unsafety. For plain
//! read-only traversal prefer [`iter`], which borrows the list and rules
//! the hazard out at compile time.
//!
//! [`advance`]: SkipList::advance
//! [`iter`]: SkipList::iter

use core::cell::Cell;
use core::cmp::Ordering;
use core::fmt;
use core::ops;

use rand_core::RngCore;
use slab::Slab;

use crate::error::{BuildError, CursorInvalidated, DuplicateKey};
use crate::order::KeyOrder;

/// Slot of the head sentinel.
const HEAD: usize = 0;

/// Slot of the tail sentinel. Self-linked at every level.
const TAIL: usize = 1;

/// Worst-case element count assumed when the caller gives no estimate.
const DEFAULT_EXPECTED_COUNT: usize = 1_000_000;

/// Level count for an expected element count: one more than the base-4
/// logarithm, so each level thins the chain by about 4x under the 1-in-4
/// promotion bias.
fn estimate_levels(expected_count: usize) -> usize {
    let mut levels = 1;
    let mut n = expected_count;
    while n > 0 {
        levels += 1;
        n >>= 2;
    }
    levels
}

// ============================================================================
// Node
// ============================================================================

/// One slot of the structure: an element plus its tower of forward links.
struct Node<T> {
    /// `None` only for the two sentinels.
    element: Option<T>,
    /// Successor slot per level. Length is this node's tower height.
    links: Box<[usize]>,
}

impl<T> Node<T> {
    /// An element-less node whose links all point at the tail sentinel.
    fn sentinel(levels: usize) -> Self {
        Node {
            element: None,
            links: vec![TAIL; levels].into_boxed_slice(),
        }
    }

    fn new(element: T, links: Vec<usize>) -> Self {
        Node {
            element: Some(element),
            links: links.into_boxed_slice(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("element", &self.element)
            .field("height", &self.links.len())
            .finish()
    }
}

// ============================================================================
// SkipList
// ============================================================================

/// An ordered-set container backed by a skip list.
///
/// Elements are kept sorted by a key projected out of them (the element
/// itself by default, see [`KeyOrder`]); insert, removal, and lookup run
/// in O(log n) expected time. Equal keys are rejected by default and
/// kept in first-in-first-out order when the builder allows them.
///
/// The tower height of each inserted element is drawn from the supplied
/// [`RngCore`], so a seeded generator makes the whole structure
/// deterministic.
///
/// # Example
///
/// ```
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
/// use skipset::SkipList;
///
/// let mut set = SkipList::new(SmallRng::seed_from_u64(12345));
/// set.insert(50_u64).unwrap();
/// set.insert(10).unwrap();
/// set.insert(90).unwrap();
///
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.first(), Some(&10));
/// assert!(set.contains(&50));
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![10, 50, 90]);
///
/// assert_eq!(set.remove(&50), Some(50));
/// assert!(!set.contains(&50));
/// ```
pub struct SkipList<T, K = T, R = ()> {
    /// Node storage. Slots 0 and 1 are the head and tail sentinels.
    nodes: Slab<Node<T>>,
    order: KeyOrder<T, K>,
    rng: R,
    /// Upper bound on any tower height, fixed at construction.
    max_levels: usize,
    /// Levels currently in use. Grows by at most one per insert, never
    /// shrinks on removal.
    levels: usize,
    len: usize,
    allow_duplicates: bool,
    searches: Cell<u64>,
    compares: Cell<u64>,
}

impl<T: Ord + 'static, R: RngCore> SkipList<T, T, R> {
    /// Creates an ordered set with natural ordering, duplicates
    /// disallowed, and the default size estimate.
    ///
    /// Use [`Builder`] to override any of those.
    pub fn new(rng: R) -> Self {
        Builder::new()
            .build(rng)
            .expect("default builder parameters are valid")
    }
}

impl<T, K, R> SkipList<T, K, R> {
    /// Returns the number of elements in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of levels currently in use.
    #[inline]
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Returns the fixed upper bound on the number of levels.
    #[inline]
    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Returns `true` if inserts may repeat an existing key.
    #[inline]
    pub fn allows_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    /// Returns a snapshot of the instrumentation counters.
    #[inline]
    pub fn stats(&self) -> Stats {
        Stats {
            searches: self.searches.get(),
            compares: self.compares.get(),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Returns the first element with the given key, or `None` if no
    /// element has it.
    pub fn get(&self, key: &K) -> Option<&T> {
        let prev = self.predecessor(key);
        let target = self.nodes[prev].links[0];
        if target != TAIL && self.compare_key(target, key) == Ordering::Equal {
            self.nodes[target].element.as_ref()
        } else {
            None
        }
    }

    /// Returns `true` if any element has the given key.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the element with the smallest key, or `None` if the list
    /// is empty.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        let first = self.nodes[HEAD].links[0];
        // The tail sentinel carries no element, so this is None when empty.
        self.nodes[first].element.as_ref()
    }

    /// Returns the element with the largest key, or `None` if the list
    /// is empty.
    pub fn last(&self) -> Option<&T> {
        let mut at = HEAD;
        for level in (0..self.levels).rev() {
            loop {
                let next = self.nodes[at].links[level];
                if next == TAIL {
                    break;
                }
                at = next;
            }
        }
        self.nodes[at].element.as_ref()
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Returns a borrowing iterator over the elements in key order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, K, R> {
        Iter {
            list: self,
            at: self.nodes[HEAD].links[0],
        }
    }

    /// Returns a borrowing iterator over the elements whose keys are
    /// greater than or equal to the given key, in key order.
    #[inline]
    pub fn iter_from(&self, key: &K) -> Iter<'_, T, K, R> {
        let prev = self.predecessor(key);
        Iter {
            list: self,
            at: self.nodes[prev].links[0],
        }
    }

    /// Returns a detached cursor parked at the smallest element.
    #[inline]
    pub fn cursor_front(&self) -> Cursor {
        Cursor {
            at: self.nodes[HEAD].links[0],
        }
    }

    /// Returns a detached cursor parked at the first element whose key is
    /// greater than or equal to the given key.
    ///
    /// If no such element exists the cursor is already exhausted; that is
    /// not an error.
    #[inline]
    pub fn cursor_at(&self, key: &K) -> Cursor {
        let prev = self.predecessor(key);
        Cursor {
            at: self.nodes[prev].links[0],
        }
    }

    /// Yields the element the cursor rests on and moves it one step
    /// forward.
    ///
    /// Returns `Ok(None)` once the chain is exhausted. Fails with
    /// [`CursorInvalidated`] if the element the cursor rested on has been
    /// removed; see the [cursor contract](self#cursors) for what may
    /// happen to the list between calls.
    ///
    /// # Example
    ///
    /// ```
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    /// use skipset::SkipList;
    ///
    /// let mut set = SkipList::new(SmallRng::seed_from_u64(12345));
    /// for n in [30_u64, 10, 20] {
    ///     set.insert(n).unwrap();
    /// }
    ///
    /// let mut cursor = set.cursor_at(&15);
    /// assert_eq!(set.advance(&mut cursor), Ok(Some(&20)));
    /// assert_eq!(set.advance(&mut cursor), Ok(Some(&30)));
    /// assert_eq!(set.advance(&mut cursor), Ok(None));
    /// ```
    pub fn advance<'a>(&'a self, cursor: &mut Cursor) -> Result<Option<&'a T>, CursorInvalidated> {
        // A vacated slot is the invalidation marker a removal leaves behind.
        let node = self.nodes.get(cursor.at).ok_or(CursorInvalidated)?;
        if node.links[0] == cursor.at {
            // Only the tail sentinel links to itself.
            return Ok(None);
        }
        let element = node.element.as_ref().expect("cursor rests on a data node");
        cursor.at = node.links[0];
        Ok(Some(element))
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes the first element with the given key and returns it, or
    /// `None` if no element has that key.
    ///
    /// When duplicates are allowed, equal keys leave in insertion order:
    /// the walk stops at the oldest of them, because inserts place new
    /// duplicates after existing ones.
    pub fn remove(&mut self, key: &K) -> Option<T> {
        let path = self.predecessors(key, false);
        let target = self.nodes[path[0]].links[0];
        if target == TAIL || self.compare_key(target, key) != Ordering::Equal {
            return None;
        }

        // Unsplice at every level whose predecessor points at the target.
        // Levels above the target's tower already link past it.
        for (level, &prev) in path.iter().enumerate() {
            if self.nodes[prev].links[level] == target {
                let next = self.nodes[target].links[level];
                self.nodes[prev].links[level] = next;
            }
        }

        self.len -= 1;
        let element = self.nodes.remove(target).element;
        debug_assert!(element.is_some(), "unlinked a sentinel");
        element
    }

    /// Removes and returns the element with the smallest key, or `None`
    /// if the list is empty.
    pub fn pop_first(&mut self) -> Option<T> {
        let first = self.nodes[HEAD].links[0];
        if first == TAIL {
            return None;
        }

        // The smallest element is first in every chain it occupies, so
        // its predecessor at each of those levels is the head sentinel.
        let height = self.nodes[first].links.len();
        for level in 0..height {
            debug_assert_eq!(self.nodes[HEAD].links[level], first);
            let next = self.nodes[first].links[level];
            self.nodes[HEAD].links[level] = next;
        }

        self.len -= 1;
        self.nodes.remove(first).element
    }

    /// Drops every element and resets the structure to its empty state.
    ///
    /// The level bound and the instrumentation counters are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        let head = self.nodes.insert(Node::sentinel(self.max_levels));
        let tail = self.nodes.insert(Node::sentinel(self.max_levels));
        debug_assert_eq!((head, tail), (HEAD, TAIL));
        self.levels = 1;
        self.len = 0;
    }

    // ========================================================================
    // Internal walks
    // ========================================================================

    /// Three-way comparison between the element in `at` and a probe key.
    /// Callers rule out the sentinels, which have no key to project.
    fn compare_key(&self, at: usize, key: &K) -> Ordering {
        let element = self.nodes[at].element.as_ref().expect("sentinels have no key");
        self.compares.set(self.compares.get() + 1);
        self.order.compare(self.order.key_of(element), key)
    }

    /// `true` while the walk must keep moving forward past `at`.
    ///
    /// The tail sentinel follows every key and is never projected. With
    /// `pass_equal` the walk also moves past equal keys, which is what
    /// places a new duplicate after all existing ones.
    fn precedes(&self, at: usize, key: &K, pass_equal: bool) -> bool {
        if at == TAIL {
            return false;
        }
        match self.compare_key(at, key) {
            Ordering::Less => true,
            Ordering::Equal => pass_equal,
            Ordering::Greater => false,
        }
    }

    /// The path vector: for each level, the last node whose successor
    /// does not come after `key`. Freshly allocated on every walk, top
    /// level down, carrying the last visited node across levels.
    fn predecessors(&self, key: &K, pass_equal: bool) -> Vec<usize> {
        let mut path = vec![HEAD; self.levels];
        let mut at = HEAD;
        for level in (0..self.levels).rev() {
            let mut next = self.nodes[at].links[level];
            while self.precedes(next, key, pass_equal) {
                at = next;
                next = self.nodes[at].links[level];
            }
            path[level] = at;
        }
        self.searches.set(self.searches.get() + 1);
        path
    }

    /// Level-0 predecessor of `key`, without materializing the path
    /// vector. Lookups and cursor placement only need the final slot.
    fn predecessor(&self, key: &K) -> usize {
        let mut at = HEAD;
        for level in (0..self.levels).rev() {
            let mut next = self.nodes[at].links[level];
            while self.precedes(next, key, false) {
                at = next;
                next = self.nodes[at].links[level];
            }
        }
        self.searches.set(self.searches.get() + 1);
        at
    }
}

impl<T, K, R: RngCore> SkipList<T, K, R> {
    /// Inserts an element at the position its key orders it to.
    ///
    /// When duplicates are disallowed and an element with an equal key is
    /// already present, the insert fails and hands the element back in
    /// [`DuplicateKey`]; nothing is mutated. When duplicates are allowed
    /// the new element lands after all existing equal keys.
    ///
    /// # Example
    ///
    /// ```
    /// use rand::rngs::SmallRng;
    /// use rand::SeedableRng;
    /// use skipset::{DuplicateKey, SkipList};
    ///
    /// let mut set = SkipList::new(SmallRng::seed_from_u64(12345));
    /// set.insert(7_u64).unwrap();
    ///
    /// let rejected = set.insert(7).unwrap_err();
    /// assert_eq!(rejected, DuplicateKey(7));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, element: T) -> Result<(), DuplicateKey<T>> {
        let key = self.order.key_of(&element);
        // With duplicates disallowed the walk stops in front of an equal
        // key so the check below sees it; with duplicates allowed it
        // walks past them, keeping insertion order among equals.
        let path = self.predecessors(key, self.allow_duplicates);

        let next = self.nodes[path[0]].links[0];
        if !self.allow_duplicates
            && next != TAIL
            && self.compare_key(next, key) == Ordering::Equal
        {
            return Err(DuplicateKey(element));
        }

        let height = self.pick_height();
        self.levels = self.levels.max(height);

        // The new tower points where its predecessors pointed. A tower
        // one level taller than the path splices in right after the head.
        let mut links = Vec::with_capacity(height);
        for level in 0..height {
            let prev = path.get(level).copied().unwrap_or(HEAD);
            links.push(self.nodes[prev].links[level]);
        }
        let idx = self.nodes.insert(Node::new(element, links));
        for level in 0..height {
            let prev = path.get(level).copied().unwrap_or(HEAD);
            self.nodes[prev].links[level] = idx;
        }

        self.len += 1;
        Ok(())
    }

    /// Tower height for a new node: geometric with a 1-in-4 promotion
    /// chance (Pugh's p = 1/4), capped one level above the levels in use
    /// so a single insert grows the structure by at most one level.
    fn pick_height(&mut self) -> usize {
        let cap = (self.levels + 1).min(self.max_levels);
        let mut height = 1;
        while (self.rng.next_u32() & 0b11) == 0 && height < cap {
            height += 1;
        }
        height
    }
}

impl<T, K, R> fmt::Debug for SkipList<T, K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len)
            .field("levels", &self.levels)
            .field("max_levels", &self.max_levels)
            .field("allow_duplicates", &self.allow_duplicates)
            .finish_non_exhaustive()
    }
}

impl<T, K, R> ops::Index<&K> for SkipList<T, K, R> {
    type Output = T;

    /// Returns the first element with the given key.
    ///
    /// # Panics
    ///
    /// Panics if no element has the key. [`get`](SkipList::get) is the
    /// non-panicking form.
    fn index(&self, key: &K) -> &T {
        self.get(key).expect("no element with the given key")
    }
}

impl<'a, T, K, R> IntoIterator for &'a SkipList<T, K, R> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, K, R>;

    fn into_iter(self) -> Iter<'a, T, K, R> {
        self.iter()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configures and constructs a [`SkipList`].
///
/// # Example
///
/// A bag of resting orders keyed by price, oldest first among equal
/// prices:
///
/// ```
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
/// use skipset::{Builder, KeyOrder};
///
/// let mut book = Builder::with_order(KeyOrder::by_key(|o: &(u32, char)| &o.0))
///     .allow_duplicates(true)
///     .expected_count(10_000)
///     .build(SmallRng::seed_from_u64(12345))
///     .unwrap();
///
/// book.insert((2, 'a')).unwrap();
/// book.insert((5, 'b')).unwrap();
/// book.insert((2, 'c')).unwrap();
///
/// let fills: Vec<_> = book.iter().copied().collect();
/// assert_eq!(fills, vec![(2, 'a'), (2, 'c'), (5, 'b')]);
/// ```
#[derive(Debug)]
pub struct Builder<T, K = T> {
    order: KeyOrder<T, K>,
    allow_duplicates: bool,
    expected_count: usize,
}

impl<T: Ord + 'static> Builder<T> {
    /// Starts from natural ordering with duplicates disallowed.
    pub fn new() -> Self {
        Self::with_order(KeyOrder::natural())
    }
}

impl<T: Ord + 'static> Default for Builder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> Builder<T, K> {
    /// Starts from the given key projection and comparison.
    pub fn with_order(order: KeyOrder<T, K>) -> Self {
        Self {
            order,
            allow_duplicates: false,
            expected_count: DEFAULT_EXPECTED_COUNT,
        }
    }

    /// Whether inserts may repeat an existing key. Defaults to `false`.
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// Worst-case element count, used only to size the level bound.
    /// Defaults to 1,000,000 (11 levels); must be positive.
    pub fn expected_count(mut self, count: usize) -> Self {
        self.expected_count = count;
        self
    }

    /// Builds the list, drawing tower heights from `rng`.
    ///
    /// Fails with [`BuildError::ZeroExpectedCount`] if the expected count
    /// was set to zero.
    pub fn build<R: RngCore>(self, rng: R) -> Result<SkipList<T, K, R>, BuildError> {
        if self.expected_count == 0 {
            return Err(BuildError::ZeroExpectedCount);
        }
        let max_levels = estimate_levels(self.expected_count);

        let mut nodes = Slab::with_capacity(2);
        let head = nodes.insert(Node::sentinel(max_levels));
        let tail = nodes.insert(Node::sentinel(max_levels));
        debug_assert_eq!((head, tail), (HEAD, TAIL));

        Ok(SkipList {
            nodes,
            order: self.order,
            rng,
            max_levels,
            levels: 1,
            len: 0,
            allow_duplicates: self.allow_duplicates,
            searches: Cell::new(0),
            compares: Cell::new(0),
        })
    }
}

// ============================================================================
// Cursor and iterators
// ============================================================================

/// A detached forward-only position in a [`SkipList`].
///
/// Obtained from [`cursor_front`](SkipList::cursor_front) or
/// [`cursor_at`](SkipList::cursor_at) and consumed through
/// [`advance`](SkipList::advance). The traversal is single pass: a second
/// run over the list needs a fresh cursor.
#[derive(Debug)]
pub struct Cursor {
    /// Slot of the node whose element the next advance yields.
    at: usize,
}

/// A borrowing iterator over a [`SkipList`] in key order.
pub struct Iter<'a, T, K = T, R = ()> {
    list: &'a SkipList<T, K, R>,
    at: usize,
}

impl<'a, T, K, R> Iterator for Iter<'a, T, K, R> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = &self.list.nodes[self.at];
        if node.links[0] == self.at {
            return None;
        }
        let element = node.element.as_ref();
        self.at = node.links[0];
        element
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Read-only instrumentation counters, monotone over the list's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Level-structure walks performed. Each insert, removal, lookup, and
    /// cursor placement counts as one walk.
    pub searches: u64,
    /// Key comparisons performed. Walk steps that hit the tail sentinel
    /// resolve without projecting a key and are not counted.
    pub compares: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn make_rng() -> SmallRng {
        SmallRng::seed_from_u64(12345)
    }

    fn make_set() -> SkipList<u64, u64, SmallRng> {
        SkipList::new(make_rng())
    }

    /// Slots of the data nodes in the chain at one level, head to tail.
    fn chain_at<T, K, R>(list: &SkipList<T, K, R>, level: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut at = list.nodes[HEAD].links[level];
        while at != TAIL {
            chain.push(at);
            at = list.nodes[at].links[level];
        }
        chain
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn new_is_empty() {
        let set = make_set();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.first(), None);
        assert_eq!(set.last(), None);
        assert_eq!(set.levels(), 1);
        assert!(!set.allows_duplicates());
    }

    #[test]
    fn level_estimate_is_base_4_log_plus_one() {
        assert_eq!(estimate_levels(1), 2);
        assert_eq!(estimate_levels(3), 2);
        assert_eq!(estimate_levels(4), 3);
        assert_eq!(estimate_levels(64), 5);
        assert_eq!(estimate_levels(1_000_000), 11);
    }

    #[test]
    fn builder_rejects_zero_expected_count() {
        let result = Builder::<u32>::new().expected_count(0).build(make_rng());
        assert_eq!(result.unwrap_err(), BuildError::ZeroExpectedCount);
    }

    #[test]
    fn builder_sets_policy_and_bound() {
        let set: SkipList<u32, u32, SmallRng> = Builder::new()
            .allow_duplicates(true)
            .expected_count(64)
            .build(make_rng())
            .unwrap();
        assert!(set.allows_duplicates());
        assert_eq!(set.max_levels(), 5);
    }

    // ========================================================================
    // Insert and lookup
    // ========================================================================

    #[test]
    fn insert_and_get() {
        let mut set = make_set();
        set.insert(2).unwrap();
        set.insert(1).unwrap();
        set.insert(3).unwrap();

        assert_eq!(set.get(&1), Some(&1));
        assert_eq!(set.get(&2), Some(&2));
        assert_eq!(set.get(&3), Some(&3));
        assert_eq!(set.get(&4), None);
        assert!(set.contains(&1));
        assert!(!set.contains(&4));
    }

    #[test]
    fn iteration_is_sorted() {
        let mut set = make_set();
        for n in [50_u64, 10, 90, 30, 70] {
            set.insert(n).unwrap();
        }
        let got: Vec<u64> = set.iter().copied().collect();
        assert_eq!(got, vec![10, 30, 50, 70, 90]);
    }

    #[test]
    fn duplicate_insert_fails_and_leaves_set_unchanged() {
        let mut set = make_set();
        set.insert(10).unwrap();
        set.insert(20).unwrap();

        let rejected = set.insert(10).unwrap_err();
        assert_eq!(rejected, DuplicateKey(10));
        assert_eq!(rejected.into_inner(), 10);

        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![10, 20]);
    }

    #[test]
    fn first_and_last_track_extremes() {
        let mut set = make_set();
        for n in [50_u64, 10, 90, 30] {
            set.insert(n).unwrap();
        }
        assert_eq!(set.first(), Some(&10));
        assert_eq!(set.last(), Some(&90));

        set.remove(&10);
        set.remove(&90);
        assert_eq!(set.first(), Some(&30));
        assert_eq!(set.last(), Some(&50));
    }

    #[test]
    fn index_returns_element() {
        let mut set = make_set();
        set.insert(20).unwrap();
        assert_eq!(set[&20], 20);
    }

    #[test]
    #[should_panic(expected = "no element")]
    fn index_panics_on_missing_key() {
        let set = make_set();
        let _ = set[&1];
    }

    // ========================================================================
    // Duplicates
    // ========================================================================

    #[test]
    fn duplicate_keys_keep_insertion_order() {
        let mut bag = Builder::with_order(KeyOrder::by_key(|e: &(u32, char)| &e.0))
            .allow_duplicates(true)
            .build(make_rng())
            .unwrap();
        for e in [(5, 'a'), (2, 'b'), (8, 'c'), (2, 'd')] {
            bag.insert(e).unwrap();
        }

        assert_eq!(bag.len(), 4);
        let got: Vec<(u32, char)> = bag.iter().copied().collect();
        assert_eq!(got, vec![(2, 'b'), (2, 'd'), (5, 'a'), (8, 'c')]);

        // Removal hits the oldest of the equal keys.
        assert_eq!(bag.remove(&2), Some((2, 'b')));
        let got: Vec<(u32, char)> = bag.iter().copied().collect();
        assert_eq!(got, vec![(2, 'd'), (5, 'a'), (8, 'c')]);
        assert_eq!(bag.len(), 3);

        assert_eq!(bag.remove(&2), Some((2, 'd')));
        assert_eq!(bag.remove(&2), None);
    }

    #[test]
    fn get_finds_oldest_duplicate() {
        let mut bag = Builder::with_order(KeyOrder::by_key(|e: &(u32, char)| &e.0))
            .allow_duplicates(true)
            .build(make_rng())
            .unwrap();
        bag.insert((7, 'x')).unwrap();
        bag.insert((7, 'y')).unwrap();
        assert_eq!(bag.get(&7), Some(&(7, 'x')));
    }

    // ========================================================================
    // Removal
    // ========================================================================

    #[test]
    fn remove_missing_returns_none() {
        let mut set = make_set();
        set.insert(10).unwrap();
        assert_eq!(set.remove(&99), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn removal_keeps_order_and_size() {
        let mut set = make_set();
        for n in 0..100_u64 {
            set.insert(n * 37 % 100).unwrap();
        }
        for n in (0..100_u64).filter(|n| n % 2 == 0) {
            assert_eq!(set.remove(&n), Some(n));
        }

        assert_eq!(set.len(), 50);
        let got: Vec<u64> = set.iter().copied().collect();
        let want: Vec<u64> = (0..100).filter(|n| n % 2 == 1).collect();
        assert_eq!(got, want);
        assert!(!set.contains(&42));
    }

    #[test]
    fn insert_after_remove_reuses_structure() {
        let mut set = make_set();
        for n in 0..32_u64 {
            set.insert(n).unwrap();
        }
        for n in 0..32_u64 {
            set.remove(&n);
        }
        assert!(set.is_empty());

        for n in [3_u64, 1, 2] {
            set.insert(n).unwrap();
        }
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn pop_first_drains_in_key_order() {
        let mut set = make_set();
        for n in [30_u64, 10, 20] {
            set.insert(n).unwrap();
        }
        assert_eq!(set.pop_first(), Some(10));
        assert_eq!(set.pop_first(), Some(20));
        assert_eq!(set.pop_first(), Some(30));
        assert_eq!(set.pop_first(), None);
        assert!(set.is_empty());
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut set = make_set();
        for n in 0..16_u64 {
            set.insert(n).unwrap();
        }
        set.clear();

        assert!(set.is_empty());
        assert_eq!(set.first(), None);
        assert_eq!(set.levels(), 1);

        set.insert(5).unwrap();
        set.insert(4).unwrap();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![4, 5]);
    }

    // ========================================================================
    // Cursors
    // ========================================================================

    #[test]
    fn cursor_front_traverses_in_order() {
        let mut set = make_set();
        for n in [30_u64, 10, 20] {
            set.insert(n).unwrap();
        }

        let mut cursor = set.cursor_front();
        let mut got = Vec::new();
        while let Some(element) = set.advance(&mut cursor).unwrap() {
            got.push(*element);
        }
        assert_eq!(got, vec![10, 20, 30]);

        // Single pass: the cursor stays exhausted.
        assert_eq!(set.advance(&mut cursor), Ok(None));
    }

    #[test]
    fn cursor_at_starts_at_lower_bound() {
        let mut set = make_set();
        for n in [10_u64, 20, 30] {
            set.insert(n).unwrap();
        }

        let mut cursor = set.cursor_at(&15);
        assert_eq!(set.advance(&mut cursor), Ok(Some(&20)));
        assert_eq!(set.advance(&mut cursor), Ok(Some(&30)));
        assert_eq!(set.advance(&mut cursor), Ok(None));

        let mut cursor = set.cursor_at(&20);
        assert_eq!(set.advance(&mut cursor), Ok(Some(&20)));

        // Past the largest key the sequence is empty, not an error.
        let mut cursor = set.cursor_at(&99);
        assert_eq!(set.advance(&mut cursor), Ok(None));
    }

    #[test]
    fn cursor_on_empty_list_is_exhausted() {
        let set = make_set();
        let mut cursor = set.cursor_front();
        assert_eq!(set.advance(&mut cursor), Ok(None));
    }

    #[test]
    fn cursor_detects_removal_at_its_position() {
        let mut set = make_set();
        for n in [10_u64, 20, 30] {
            set.insert(n).unwrap();
        }

        let mut cursor = set.cursor_at(&20);
        assert_eq!(set.remove(&20), Some(20));
        assert_eq!(set.advance(&mut cursor), Err(CursorInvalidated));
        assert_eq!(set.advance(&mut cursor), Err(CursorInvalidated));
    }

    #[test]
    fn iter_from_skips_smaller_keys() {
        let mut set = make_set();
        for n in [10_u64, 20, 30, 40] {
            set.insert(n).unwrap();
        }
        let got: Vec<u64> = set.iter_from(&25).copied().collect();
        assert_eq!(got, vec![30, 40]);
        assert_eq!(set.iter_from(&41).count(), 0);
    }

    // ========================================================================
    // Custom ordering
    // ========================================================================

    #[test]
    fn comparator_reverses_order() {
        let mut set = Builder::with_order(KeyOrder::by_comparator(|a: &u64, b: &u64| b.cmp(a)))
            .build(make_rng())
            .unwrap();
        for n in [10_u64, 30, 20] {
            set.insert(n).unwrap();
        }
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![30, 20, 10]);
        assert_eq!(set.first(), Some(&30));
        assert_eq!(set.last(), Some(&10));
    }

    // ========================================================================
    // Structure invariants
    // ========================================================================

    #[test]
    fn level_growth_is_capped_per_insert() {
        let mut set: SkipList<u64, u64, SmallRng> = Builder::new()
            .expected_count(64)
            .build(make_rng())
            .unwrap();
        let mut prev = set.levels();
        assert_eq!(prev, 1);

        for n in 0..1000_u64 {
            set.insert(n).unwrap();
            let now = set.levels();
            assert!(now >= prev && now - prev <= 1);
            assert!(now <= set.max_levels());
            prev = now;
        }
    }

    #[test]
    fn upper_levels_are_subsequences_of_lower() {
        let mut set = make_set();
        for n in 0..512_u64 {
            set.insert(n * 7 % 512).unwrap();
        }
        for n in (0..512_u64).step_by(3) {
            set.remove(&n);
        }

        assert_eq!(chain_at(&set, 0).len(), set.len());
        for level in 1..set.levels() {
            let lower = chain_at(&set, level - 1);
            let upper = chain_at(&set, level);
            let mut lower_iter = lower.iter();
            for slot in &upper {
                assert!(
                    lower_iter.any(|other| other == slot),
                    "level {} is not a subsequence of level {}",
                    level,
                    level - 1
                );
            }
        }
    }

    // ========================================================================
    // Instrumentation
    // ========================================================================

    #[test]
    fn stats_count_one_walk_per_operation() {
        let mut set = make_set();
        assert_eq!(set.stats(), Stats::default());

        set.insert(1).unwrap();
        set.insert(2).unwrap();
        assert_eq!(set.stats().searches, 2);

        assert!(set.contains(&1));
        assert_eq!(set.stats().searches, 3);

        set.remove(&2);
        assert_eq!(set.stats().searches, 4);

        let _ = set.cursor_at(&1);
        assert_eq!(set.stats().searches, 5);
        assert!(set.stats().compares > 0);
    }

    #[test]
    fn plain_traversal_does_not_count_as_search() {
        let mut set = make_set();
        for n in [1_u64, 2, 3] {
            set.insert(n).unwrap();
        }
        let before = set.stats();

        let _ = set.first();
        let _ = set.last();
        let _: Vec<_> = set.iter().collect();
        let _ = set.cursor_front();

        assert_eq!(set.stats(), before);
    }
}
