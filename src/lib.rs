//! Ordered-set container backed by a skip list.
//!
//! A skip list keeps elements sorted and reaches any of them in O(log n)
//! expected time, with no rebalancing: the only bookkeeping an insert
//! ever does is flip coins for its tower height and repair one link per
//! level it lands on. This makes mutation cost flat and predictable,
//! which is the reason to pick it over a balanced tree when latency
//! matters more than worst-case guarantees.
//!
//! # Design
//!
//! One container, three pieces:
//!
//! | Piece | Role |
//! |-------|------|
//! | node | one element plus its tower of forward links |
//! | [`SkipList`] | owns all nodes, runs search / insert / remove |
//! | [`Cursor`] | detached forward-only position in the level-0 chain |
//!
//! Nodes link by slab index, not by owning pointers; the tail sentinel
//! links to itself at every level and terminates every walk. Ordering is
//! injectable through [`KeyOrder`]: a key projection plus a three-way
//! comparison, both defaulting to the element's own `Ord`. Tower heights
//! come from a caller-supplied [`rand_core::RngCore`], so a seeded
//! generator makes every structure decision reproducible.
//!
//! # Quick start
//!
//! ```
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//! use skipset::SkipList;
//!
//! let mut set = SkipList::new(SmallRng::seed_from_u64(12345));
//!
//! set.insert(50_u64).unwrap();
//! set.insert(10).unwrap();
//! set.insert(90).unwrap();
//!
//! assert_eq!(set.first(), Some(&10));
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![10, 50, 90]);
//!
//! // Lookups and removals go by key.
//! assert!(set.contains(&50));
//! assert_eq!(set.remove(&50), Some(50));
//! ```
//!
//! Elements with a projected key, duplicates kept in arrival order:
//!
//! ```
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//! use skipset::{Builder, KeyOrder};
//!
//! let mut book = Builder::with_order(KeyOrder::by_key(|o: &(u32, char)| &o.0))
//!     .allow_duplicates(true)
//!     .build(SmallRng::seed_from_u64(12345))
//!     .unwrap();
//!
//! for order in [(5, 'a'), (2, 'b'), (8, 'c'), (2, 'd')] {
//!     book.insert(order).unwrap();
//! }
//!
//! // Equal prices stay in time priority.
//! let queue: Vec<_> = book.iter().copied().collect();
//! assert_eq!(queue, vec![(2, 'b'), (2, 'd'), (5, 'a'), (8, 'c')]);
//! assert_eq!(book.remove(&2), Some((2, 'b')));
//! ```
//!
//! # Critical invariant: cursors and mutation
//!
//! A [`Cursor`] holds a position, not a borrow. The single mutation with
//! defined behavior while a cursor is parked is removing the exact
//! element it rests on, which the next [`SkipList::advance`] reports as
//! [`CursorInvalidated`]. Interleaving any other mutation with a live
//! cursor violates the cursor contract and can make the cursor yield
//! unrelated elements; it can never cause memory unsafety. Borrowing
//! iteration ([`SkipList::iter`]) has no such caveat.
//!
//! # Non-goals
//!
//! Not thread-safe (wrap it externally if you must share it), no
//! persistence, no range deletes or bulk loading, probabilistic rather
//! than worst-case balance.

#![warn(missing_docs)]

pub mod error;
pub mod order;
pub mod skiplist;

pub use error::{BuildError, CursorInvalidated, DuplicateKey};
pub use order::KeyOrder;
pub use skiplist::{Builder, Cursor, Iter, SkipList, Stats};
