//! Work partitioning
//!
//! Pure functions that split an ordered sequence of work units into
//! sub-sequences, used to fan catalog pages out across ingest workers.
//! All three policies guarantee that every element lands in exactly one
//! partition, the union of the partitions equals the input, and order is
//! preserved within each partition.
//!
//! Pinned edge cases: `n_chunks == 0` (or `size == 0` for the fixed
//! policy) yields an empty Vec; an empty input with `n_chunks >= 1`
//! yields `n_chunks` empty partitions.

/// Split into `n_chunks` contiguous runs whose sizes differ by at most one.
/// The first `len % n_chunks` partitions receive one extra element.
pub fn chunks_sequential<T: Clone>(items: &[T], n_chunks: usize) -> Vec<Vec<T>> {
    if n_chunks == 0 {
        return Vec::new();
    }
    let base = items.len() / n_chunks;
    let extra = items.len() % n_chunks;
    let mut out = Vec::with_capacity(n_chunks);
    let mut start = 0;
    for i in 0..n_chunks {
        let size = if i < extra { base + 1 } else { base };
        out.push(items[start..start + size].to_vec());
        start += size;
    }
    out
}

/// Split into `n_chunks` stripes: partition `i` receives every `n_chunks`-th
/// element starting at offset `i`.
pub fn chunks_striped<T: Clone>(items: &[T], n_chunks: usize) -> Vec<Vec<T>> {
    if n_chunks == 0 {
        return Vec::new();
    }
    let mut out = vec![Vec::with_capacity(items.len() / n_chunks + 1); n_chunks];
    for (i, item) in items.iter().enumerate() {
        out[i % n_chunks].push(item.clone());
    }
    out
}

/// Split into contiguous runs of exactly `size` elements; the last partition
/// may be shorter.
pub fn chunks_fixed<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(chunks: &[Vec<u32>]) -> Vec<u32> {
        chunks.iter().flatten().copied().collect()
    }

    #[test]
    fn test_sequential_union_preserves_input_in_order() {
        for n in 1..=10 {
            let items: Vec<u32> = (0..23).collect();
            let chunks = chunks_sequential(&items, n);
            assert_eq!(chunks.len(), n);
            assert_eq!(flatten(&chunks), items, "n_chunks = {}", n);
        }
    }

    #[test]
    fn test_sequential_sizes_differ_by_at_most_one() {
        let items: Vec<u32> = (0..23).collect();
        let chunks = chunks_sequential(&items, 5);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        // 23 = 5 * 4 + 3: first three partitions get the extra element
        assert_eq!(sizes, vec![5, 5, 5, 4, 4]);
    }

    #[test]
    fn test_sequential_more_chunks_than_items() {
        let items: Vec<u32> = vec![1, 2];
        let chunks = chunks_sequential(&items, 4);
        assert_eq!(chunks, vec![vec![1], vec![2], vec![], vec![]]);
    }

    #[test]
    fn test_striped_every_nth_element() {
        let items: Vec<u32> = (0..10).collect();
        let chunks = chunks_striped(&items, 3);
        assert_eq!(chunks[0], vec![0, 3, 6, 9]);
        assert_eq!(chunks[1], vec![1, 4, 7]);
        assert_eq!(chunks[2], vec![2, 5, 8]);
    }

    #[test]
    fn test_striped_each_element_exactly_once() {
        for n in 1..=10 {
            let items: Vec<u32> = (0..23).collect();
            let chunks = chunks_striped(&items, n);
            assert_eq!(chunks.len(), n);
            let mut all = flatten(&chunks);
            all.sort_unstable();
            assert_eq!(all, items, "n_chunks = {}", n);
        }
    }

    #[test]
    fn test_fixed_contiguous_runs_with_short_tail() {
        let items: Vec<u32> = (0..10).collect();
        let chunks = chunks_fixed(&items, 4);
        assert_eq!(chunks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
        assert_eq!(flatten(&chunks), items);
    }

    #[test]
    fn test_zero_partitions_yield_empty() {
        let items: Vec<u32> = (0..5).collect();
        assert!(chunks_sequential(&items, 0).is_empty());
        assert!(chunks_striped(&items, 0).is_empty());
        assert!(chunks_fixed(&items, 0).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u32> = Vec::new();
        let expected: Vec<Vec<u32>> = vec![vec![], vec![], vec![]];
        assert_eq!(chunks_sequential(&items, 3), expected);
        assert_eq!(chunks_striped(&items, 3), expected);
        assert!(chunks_fixed(&items, 3).is_empty());
    }
}
