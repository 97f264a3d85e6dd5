//! Chunk-size math shared by admission (computing `chunk_sizes` up front) and
//! cache hydration (reconstructing them from `total_points`/`total_chunks`).

use crate::types::CoordinatePoint;

/// Sizes of each contiguous chunk of `total_points` at `chunk_size`, the last one
/// possibly smaller. Empty input yields an empty list.
pub fn compute_chunk_sizes(total_points: usize, chunk_size: usize) -> Vec<usize> {
    if total_points == 0 || chunk_size == 0 {
        return Vec::new();
    }
    let full_chunks = total_points / chunk_size;
    let remainder = total_points % chunk_size;
    let mut sizes = vec![chunk_size; full_chunks];
    if remainder > 0 {
        sizes.push(remainder);
    }
    sizes
}

/// Splits `points` into contiguous slices of at most `chunk_size`, in order.
pub fn chunk_slices(points: &[CoordinatePoint], chunk_size: usize) -> Vec<&[CoordinatePoint]> {
    if chunk_size == 0 {
        return Vec::new();
    }
    points.chunks(chunk_size).collect()
}

/// Rebuilds the `chunk_sizes` a durable job row implies, special-casing a single
/// chunk (spec §4.4 hydration rule).
pub fn hydrate_chunk_sizes(total_points: usize, total_chunks: usize, chunk_size: usize) -> Vec<usize> {
    if total_chunks == 0 {
        return Vec::new();
    }
    if total_chunks == 1 {
        return vec![total_points];
    }
    let mut sizes = vec![chunk_size; total_chunks - 1];
    sizes.push(total_points.saturating_sub(chunk_size * (total_chunks - 1)));
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_has_no_chunks() {
        assert_eq!(compute_chunk_sizes(0, 1000), Vec::<usize>::new());
    }

    #[test]
    fn single_point_is_one_chunk_of_one() {
        assert_eq!(compute_chunk_sizes(1, 1000), vec![1]);
    }

    #[test]
    fn exact_multiple_is_one_full_chunk() {
        assert_eq!(compute_chunk_sizes(1000, 1000), vec![1000]);
    }

    #[test]
    fn one_over_chunk_size_splits_remainder() {
        assert_eq!(compute_chunk_sizes(1001, 1000), vec![1000, 1]);
    }

    #[test]
    fn twenty_five_hundred_splits_into_three() {
        assert_eq!(compute_chunk_sizes(2500, 1000), vec![1000, 1000, 500]);
    }

    #[test]
    fn hydration_matches_forward_computation() {
        let sizes = compute_chunk_sizes(2500, 1000);
        let hydrated = hydrate_chunk_sizes(2500, sizes.len(), 1000);
        assert_eq!(sizes, hydrated);
    }

    #[test]
    fn hydration_special_cases_single_chunk() {
        assert_eq!(hydrate_chunk_sizes(437, 1, 1000), vec![437]);
    }
}
