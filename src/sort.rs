use core::ops::Range;

/// Insertion sort of `x[range]` driven by a strict "less than" comparator.
///
/// An element only moves past a neighbour that compares strictly greater, so
/// equal elements keep their relative order.
pub fn insertion_sort_by<T, F>(x: &mut [T], range: Range<usize>, mut less: F)
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    let Range { start, end } = range;
    let x = &mut x[start..end];
    for k in 1..x.len() {
        let current = x[k];
        let mut idx = k;
        while idx > 0 && less(&current, &x[idx - 1]) {
            x[idx] = x[idx - 1];
            idx -= 1;
        }
        x[idx] = current;
    }
}

/// Sorts `x[range]` ascending in place.
///
/// Intended for short, nearly sorted ranges such as the row indices of a
/// single column.
pub fn sort_range(x: &mut [usize], range: Range<usize>) {
    insertion_sort_by(x, range, |a, b| a < b);
}

/// Sorts the indices in `x[range]` by `key_a`, breaking ties with `key_b`.
///
/// `x` holds zero-based positions into both key slices. Indices with equal
/// `(key_a, key_b)` keep their input order.
///
/// # Panics
///
/// Panics if `range` is out of bounds for `x`, or if an index in `x[range]`
/// is out of bounds for either key slice.
pub fn sort_range_by_keys<K: PartialOrd>(
    x: &mut [usize],
    range: Range<usize>,
    key_a: &[K],
    key_b: &[K],
) {
    insertion_sort_by(x, range, |&i, &j| {
        key_a[i] < key_a[j] || (key_a[i] == key_a[j] && key_b[i] < key_b[j])
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_only_the_requested_range() {
        let mut x = vec![9, 5, 3, 4, 1, 0];
        sort_range(&mut x, 1..5);
        assert_eq!(x, vec![9, 1, 3, 4, 5, 0]);
    }

    #[test]
    fn sort_range_is_idempotent() {
        let mut x = vec![0, 2, 4, 7, 11];
        let before = x.clone();
        sort_range(&mut x, 0..5);
        assert_eq!(x, before);
        sort_range(&mut x, 0..5);
        assert_eq!(x, before);
    }

    #[test]
    fn empty_and_single_ranges_are_noops() {
        let mut x = vec![3, 1, 2];
        sort_range(&mut x, 1..1);
        sort_range(&mut x, 2..3);
        assert_eq!(x, vec![3, 1, 2]);
    }

    #[test]
    fn keyed_sort_uses_secondary_key_on_ties() {
        let key_a = [2, 1, 2, 1];
        let key_b = [5, 9, 3, 4];
        let mut x = vec![0, 1, 2, 3];
        sort_range_by_keys(&mut x, 0..4, &key_a, &key_b);
        assert_eq!(x, vec![3, 1, 2, 0]);
    }

    #[test]
    fn keyed_sort_is_stable_for_equal_keys() {
        let key_a = [1, 1, 0, 1];
        let key_b = [0, 0, 0, 0];
        let mut x = vec![3, 0, 2, 1];
        sort_range_by_keys(&mut x, 0..4, &key_a, &key_b);
        assert_eq!(x, vec![2, 3, 0, 1]);
    }

    #[test]
    fn keyed_sort_accepts_float_keys() {
        let key_a = [0.5, 0.25, 0.5];
        let key_b = [2.0, 1.0, 1.0];
        let mut x = vec![0, 1, 2];
        sort_range_by_keys(&mut x, 0..3, &key_a, &key_b);
        assert_eq!(x, vec![1, 2, 0]);
    }
}
