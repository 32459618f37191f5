use crate::intervals::Interval;
use qtty::Unit;

/// Computes the intersection of two sorted interval sets.
///
/// # Arguments
///
/// * `a` - First set of sorted, non-overlapping intervals
/// * `b` - Second set of sorted, non-overlapping intervals
///
/// # Returns
///
/// A vector of intervals representing the intersection, sorted and non-overlapping.
pub fn compute_intersection<U: Unit>(a: &[Interval<U>], b: &[Interval<U>]) -> Vec<Interval<U>> {
    debug_assert!(super::assertions::is_canonical(a));
    debug_assert!(super::assertions::is_canonical(b));

    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let mut i = 0usize;
    let mut j = 0usize;

    while i < a.len() && j < b.len() {
        let ia = &a[i];
        let ib = &b[j];

        if let Some(overlap) = ia.intersection(ib) {
            result.push(overlap);
        }

        match ia.end().value().partial_cmp(&ib.end().value()) {
            Some(std::cmp::Ordering::Less) => i += 1,
            Some(std::cmp::Ordering::Greater) => j += 1,
            _ => {
                i += 1;
                j += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtty::Second;

    fn iv(start: f64, end: f64) -> Interval<Second> {
        Interval::from_f64(start, end)
    }

    #[test]
    fn intersection_disjoint_sets() {
        let result = compute_intersection(&[iv(0.0, 10.0)], &[iv(20.0, 30.0)]);
        assert!(result.is_empty());
    }

    #[test]
    fn intersection_fully_overlapping() {
        let result = compute_intersection(&[iv(0.0, 100.0)], &[iv(20.0, 80.0)]);
        assert_eq!(result, vec![iv(20.0, 80.0)]);
    }

    #[test]
    fn intersection_one_empty() {
        let b: Vec<Interval<Second>> = vec![];
        assert!(compute_intersection(&[iv(0.0, 50.0)], &b).is_empty());
    }

    #[test]
    fn intersection_multiple_intervals() {
        // A: [0, 30), [50, 80)
        // B: [10, 60)
        // Result: [10, 30), [50, 60)
        let a = vec![iv(0.0, 30.0), iv(50.0, 80.0)];
        let b = vec![iv(10.0, 60.0)];
        let result = compute_intersection(&a, &b);
        assert_eq!(result, vec![iv(10.0, 30.0), iv(50.0, 60.0)]);
    }

    #[test]
    fn intersection_touching_endpoints_is_empty() {
        // Half-open: [0, 50) and [50, 100) share no point.
        let result = compute_intersection(&[iv(0.0, 50.0)], &[iv(50.0, 100.0)]);
        assert!(result.is_empty());
    }
}
