// Homerow Combination Generator
// Enumerates non-empty subsets, largest first

/// Generate every non-empty subset of `items` (2ⁿ−1 of them).
///
/// Subsets come out in non-increasing cardinality: all size-n subsets,
/// then all size-(n−1), and so on. That ordering is the only guarantee;
/// callers rely on it so that "more specific wins" can be expressed as
/// list order. The order among subsets of the same size is unspecified.
///
/// Within a subset, items keep their relative order from `items`.
pub fn all_combinations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let n = items.len();
    let mut result = Vec::new();

    for size in (1..=n).rev() {
        let mut indices: Vec<usize> = (0..size).collect();

        'subsets: loop {
            result.push(indices.iter().map(|&i| items[i].clone()).collect());

            // Find the rightmost index that can still move right
            let mut pos = size;
            loop {
                if pos == 0 {
                    break 'subsets;
                }
                pos -= 1;
                if indices[pos] < pos + n - size {
                    break;
                }
            }

            indices[pos] += 1;
            for next in pos + 1..size {
                indices[next] = indices[next - 1] + 1;
            }
        }
    }

    result
}
