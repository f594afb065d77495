//! Multi-key comparator used by order-by sorts.

use alloc::vec::Vec;
use core::cmp::Ordering;
use quarry_core::schema::Order;

/// Orders keys of type `K`.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Lexicographic comparator over key tuples with one order per position.
///
/// Compares by the first key, breaking ties with the next, and so on. Sorting
/// with `sort_by` and this comparator is stable.
#[derive(Clone, Debug)]
pub struct MultiKeyComparator {
    orders: Vec<Order>,
}

impl MultiKeyComparator {
    /// Creates a new multi-key comparator with the given orders.
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }
}

impl<K: Ord> Comparator<[K]> for MultiKeyComparator {
    fn compare(&self, a: &[K], b: &[K]) -> Ordering {
        for (i, order) in self.orders.iter().enumerate() {
            let cmp = match (a.get(i), b.get(i)) {
                (Some(av), Some(bv)) => order.apply(av.cmp(bv)),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}
