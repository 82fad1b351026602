use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Randomly assigns `nrows` rows to `nfolds` holdouts of near-equal size.
///
/// Returns one sorted list of holdout rows per fold. The assignment only
/// depends on `seed`.
pub fn assign_folds(nrows: usize, nfolds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..nrows).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut holdouts = vec![Vec::with_capacity(nrows / nfolds.max(1) + 1); nfolds];
    for (pos, row) in order.into_iter().enumerate() {
        holdouts[pos % nfolds].push(row);
    }
    for holdout in &mut holdouts {
        holdout.sort_unstable();
    }

    holdouts
}

/// Rows of `0..nrows` that are not in the sorted `holdout`.
pub fn complement(nrows: usize, holdout: &[usize]) -> Vec<usize> {
    (0..nrows)
        .filter(|r| holdout.binary_search(r).is_err())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_partition_the_rows() {
        let folds = assign_folds(10, 3, 42);
        assert_eq!(folds.len(), 3);

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn folds_depend_only_on_the_seed() {
        assert_eq!(assign_folds(20, 4, 7), assign_folds(20, 4, 7));
        assert_ne!(assign_folds(20, 4, 7), assign_folds(20, 4, 8));
    }

    #[test]
    fn complement_excludes_the_holdout() {
        assert_eq!(complement(5, &[1, 3]), vec![0, 2, 4]);
    }
}
