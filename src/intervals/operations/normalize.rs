use crate::intervals::Interval;
use qtty::Unit;

/// Sorts `intervals` by start and merges every overlapping or touching run.
///
/// The input need not be sorted. The output is sorted, pairwise disjoint and
/// no two consecutive intervals touch.
pub fn normalize<U: Unit>(mut intervals: Vec<Interval<U>>) -> Vec<Interval<U>> {
    if intervals.len() <= 1 {
        return intervals;
    }
    intervals.sort_by(|a, b| a.start().value().total_cmp(&b.start().value()));

    let mut merged: Vec<Interval<U>> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if last.end().value() >= interval.start().value() => {
                // Overlapping or touching – extend the current run.
                if interval.end().value() > last.end().value() {
                    *last = Interval::new(last.start(), interval.end());
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtty::Second;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn iv(start: f64, end: f64) -> Interval<Second> {
        Interval::from_f64(start, end)
    }

    fn random_intervals(rng: &mut StdRng, n: usize) -> Vec<Interval<Second>> {
        (0..n)
            .map(|_| {
                let start = rng.gen_range(0..500) as f64;
                let len = rng.gen_range(1..60) as f64;
                iv(start, start + len)
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize::<Second>(Vec::new()).is_empty());
    }

    #[test]
    fn unsorted_disjoint_input_is_sorted() {
        let out = normalize(vec![iv(20.0, 30.0), iv(0.0, 10.0)]);
        assert_eq!(out, vec![iv(0.0, 10.0), iv(20.0, 30.0)]);
    }

    #[test]
    fn touching_intervals_merge() {
        let out = normalize(vec![iv(50.0, 100.0), iv(0.0, 50.0)]);
        assert_eq!(out, vec![iv(0.0, 100.0)]);
    }

    #[test]
    fn contained_interval_is_absorbed() {
        let out = normalize(vec![iv(0.0, 100.0), iv(10.0, 20.0), iv(90.0, 120.0)]);
        assert_eq!(out, vec![iv(0.0, 120.0)]);
    }

    #[test]
    fn normalize_is_idempotent_on_random_input() {
        let mut rng = StdRng::seed_from_u64(0x5107);
        for round in 0..200 {
            let input = random_intervals(&mut rng, round % 25);
            let once = normalize(input);
            let twice = normalize(once.clone());
            assert_eq!(once, twice);
            assert!(super::super::assertions::is_canonical(&once));
        }
    }
}
