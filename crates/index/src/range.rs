//! Key ranges used for index lookups and cost estimation.

use core::ops::Bound;

/// A key range for index queries.
///
/// Each variant describes an interval whose ends are either inclusive or
/// exclusive; [`KeyRange::contains`] is the comparator predicate derived from
/// it.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyRange<K> {
    /// All keys
    All,
    /// A single key (equality)
    Only(K),
    /// Keys >= lower bound
    LowerBound { value: K, exclusive: bool },
    /// Keys <= upper bound
    UpperBound { value: K, exclusive: bool },
    /// Keys between lower and upper bounds
    Bound {
        lower: K,
        upper: K,
        lower_exclusive: bool,
        upper_exclusive: bool,
    },
}

impl<K: Ord> KeyRange<K> {
    /// Creates a range for all keys.
    pub fn all() -> Self {
        KeyRange::All
    }

    /// Creates a range for a single key.
    pub fn only(key: K) -> Self {
        KeyRange::Only(key)
    }

    /// Creates a range with a lower bound.
    pub fn lower_bound(value: K, exclusive: bool) -> Self {
        KeyRange::LowerBound { value, exclusive }
    }

    /// Creates a range with an upper bound.
    pub fn upper_bound(value: K, exclusive: bool) -> Self {
        KeyRange::UpperBound { value, exclusive }
    }

    /// Creates a range with both bounds.
    pub fn bound(lower: K, upper: K, lower_exclusive: bool, upper_exclusive: bool) -> Self {
        KeyRange::Bound {
            lower,
            upper,
            lower_exclusive,
            upper_exclusive,
        }
    }

    /// Returns true if no key can fall inside this range, e.g. `[10, 5]` or
    /// `(5, 5]`.
    pub fn is_empty(&self) -> bool {
        match self {
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => lower > upper || (lower == upper && (*lower_exclusive || *upper_exclusive)),
            _ => false,
        }
    }

    /// Returns the range as a pair of `Bound`s, suitable for
    /// `BTreeMap::range`. Callers must check [`is_empty`](Self::is_empty)
    /// first since `BTreeMap::range` rejects inverted bounds.
    pub fn to_bounds(&self) -> (Bound<&K>, Bound<&K>) {
        fn edge<K>(value: &K, exclusive: bool) -> Bound<&K> {
            if exclusive {
                Bound::Excluded(value)
            } else {
                Bound::Included(value)
            }
        }

        match self {
            KeyRange::All => (Bound::Unbounded, Bound::Unbounded),
            KeyRange::Only(k) => (Bound::Included(k), Bound::Included(k)),
            KeyRange::LowerBound { value, exclusive } => (edge(value, *exclusive), Bound::Unbounded),
            KeyRange::UpperBound { value, exclusive } => (Bound::Unbounded, edge(value, *exclusive)),
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => (edge(lower, *lower_exclusive), edge(upper, *upper_exclusive)),
        }
    }

    /// Returns every key value mentioned by this range.
    pub fn endpoints(&self) -> impl Iterator<Item = &K> {
        let (a, b) = match self {
            KeyRange::All => (None, None),
            KeyRange::Only(k) => (Some(k), None),
            KeyRange::LowerBound { value, .. } | KeyRange::UpperBound { value, .. } => {
                (Some(value), None)
            }
            KeyRange::Bound { lower, upper, .. } => (Some(lower), Some(upper)),
        };
        a.into_iter().chain(b)
    }

    /// Checks if a key is within this range.
    pub fn contains(&self, key: &K) -> bool {
        match self {
            KeyRange::All => true,
            KeyRange::Only(k) => key == k,
            KeyRange::LowerBound { value, exclusive } => {
                if *exclusive {
                    key > value
                } else {
                    key >= value
                }
            }
            KeyRange::UpperBound { value, exclusive } => {
                if *exclusive {
                    key < value
                } else {
                    key <= value
                }
            }
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => {
                let lower_ok = if *lower_exclusive { key > lower } else { key >= lower };
                let upper_ok = if *upper_exclusive { key < upper } else { key <= upper };
                lower_ok && upper_ok
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_key_range_all() {
        let range: KeyRange<i32> = KeyRange::all();
        assert!(range.contains(&-100));
        assert!(range.contains(&100));
        assert_eq!(range.to_bounds(), (Bound::Unbounded, Bound::Unbounded));
    }

    #[test]
    fn test_key_range_only() {
        let range = KeyRange::only(5);
        assert!(!range.contains(&4));
        assert!(range.contains(&5));
        assert!(!range.contains(&6));
    }

    #[test]
    fn test_key_range_half_open() {
        let range = KeyRange::lower_bound(5, true);
        assert!(!range.contains(&5));
        assert!(range.contains(&6));

        let range = KeyRange::upper_bound(5, false);
        assert!(range.contains(&5));
        assert!(!range.contains(&6));
        assert_eq!(range.to_bounds(), (Bound::Unbounded, Bound::Included(&5)));
    }

    #[test]
    fn test_key_range_mixed_exclusive() {
        let range = KeyRange::bound(5, 10, false, true);
        assert!(range.contains(&5));
        assert!(range.contains(&9));
        assert!(!range.contains(&10));
        assert_eq!(range.to_bounds(), (Bound::Included(&5), Bound::Excluded(&10)));
    }

    #[test]
    fn test_key_range_empty() {
        assert!(KeyRange::bound(10, 5, false, false).is_empty());
        assert!(KeyRange::bound(5, 5, true, false).is_empty());
        assert!(!KeyRange::bound(5, 5, false, false).is_empty());
        assert!(!KeyRange::<i32>::all().is_empty());

        let range = KeyRange::bound(10, 5, false, false);
        assert!(!range.contains(&7));
    }

    #[test]
    fn test_key_range_endpoints() {
        let all_range = KeyRange::<i32>::all();
        let all: Vec<&i32> = all_range.endpoints().collect();
        assert!(all.is_empty());
        let bound_range = KeyRange::bound(1, 9, false, false);
        let bound: Vec<&i32> = bound_range.endpoints().collect();
        assert_eq!(bound, [&1, &9]);
    }

    #[test]
    fn test_key_range_contains_string() {
        let range = KeyRange::bound("B", "D", false, false);
        assert!(!range.contains(&"A"));
        assert!(range.contains(&"C"));
        assert!(range.contains(&"D"));
        assert!(!range.contains(&"E"));
    }
}
