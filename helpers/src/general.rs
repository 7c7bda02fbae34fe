use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The sort is stable, i.e. equal values
/// keep their original index order. Incomparable values (NaN) are treated as equal.
pub fn argsort<T: PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => {
            indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal))
        }
        SortOrder::Descending => {
            indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal))
        }
    }
    indices
}

/// clamp_unit limits a probability-like value to [0.0, 1.0].
pub fn clamp_unit(x: f64) -> f64 {
    x.max(0.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort_descending_keeps_ties_in_index_order() {
        let x = [3.0, 7.0, 3.0, 1.0];
        assert_eq!(argsort(&x, SortOrder::Descending), vec![1, 0, 2, 3]);
    }

    #[test]
    fn argsort_ascending() {
        let x = [3.0, 7.0, -1.0];
        assert_eq!(argsort(&x, SortOrder::Ascending), vec![2, 0, 1]);
    }

    #[test]
    fn clamp_unit_limits_range() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(1.5), 1.0);
    }
}
