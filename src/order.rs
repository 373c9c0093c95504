//! Key projection and ordering strategies.
//!
//! A skip list orders elements by a *key*, which is some comparable
//! projection of the stored element. [`KeyOrder`] bundles the two
//! injectable pieces of that relation:
//!
//! - a **projection** from an element to its key (identity by default), and
//! - a **three-way comparison** over keys (`Ord` by default).
//!
//! Both are supplied at construction and invoked through a narrow
//! functional interface, so element types need no trait impls of their
//! own beyond what the chosen strategy requires.

use core::cmp::Ordering;
use core::fmt;

type ProjectFn<T, K> = Box<dyn Fn(&T) -> &K>;
type CompareFn<K> = Box<dyn Fn(&K, &K) -> Ordering>;

/// How a skip list extracts and compares keys.
///
/// The type parameter `K` is the key domain; it defaults to the element
/// type itself for the common identity case.
///
/// # Example
///
/// Ordering resting orders by price, largest first:
///
/// ```
/// use skipset::KeyOrder;
///
/// struct Resting {
///     px: u64,
///     qty: u32,
/// }
///
/// // Project out the price, compare prices in reverse.
/// let bids = KeyOrder::by_key_with(|o: &Resting| &o.px, |a: &u64, b: &u64| b.cmp(a));
/// # let _ = bids;
/// ```
pub struct KeyOrder<T, K = T> {
    project: ProjectFn<T, K>,
    compare: CompareFn<K>,
}

impl<T: Ord + 'static> KeyOrder<T> {
    /// Elements are their own keys, compared through their `Ord` impl.
    pub fn natural() -> Self {
        Self {
            project: Box::new(|element| element),
            compare: Box::new(T::cmp),
        }
    }
}

impl<T> KeyOrder<T> {
    /// Elements are their own keys, compared with the given function.
    pub fn by_comparator(compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self {
            project: Box::new(|element| element),
            compare: Box::new(compare),
        }
    }
}

impl<T, K: Ord + 'static> KeyOrder<T, K> {
    /// Keys are projected out of elements and compared through `Ord`.
    pub fn by_key(project: impl Fn(&T) -> &K + 'static) -> Self {
        Self {
            project: Box::new(project),
            compare: Box::new(K::cmp),
        }
    }
}

impl<T, K> KeyOrder<T, K> {
    /// Keys are projected out of elements and compared with the given
    /// function.
    pub fn by_key_with(
        project: impl Fn(&T) -> &K + 'static,
        compare: impl Fn(&K, &K) -> Ordering + 'static,
    ) -> Self {
        Self {
            project: Box::new(project),
            compare: Box::new(compare),
        }
    }

    /// Projects the key out of an element.
    #[inline]
    pub(crate) fn key_of<'a>(&self, element: &'a T) -> &'a K {
        (self.project)(element)
    }

    /// Three-way comparison between two keys.
    #[inline]
    pub(crate) fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.compare)(a, b)
    }
}

impl<T: Ord + 'static> Default for KeyOrder<T> {
    fn default() -> Self {
        Self::natural()
    }
}

impl<T, K> fmt::Debug for KeyOrder<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyOrder").finish_non_exhaustive()
    }
}
