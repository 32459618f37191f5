use crate::intervals::Interval;
use qtty::Unit;

/// Removes every point covered by `negative` from `positive`.
///
/// Both inputs must be sorted by start and internally normalized; this
/// function does not normalize them. The walk is a single left-to-right
/// sweep over both sequences, O(|positive| + |negative|).
///
/// For each positive piece `p` against the current mask `m`:
///
/// | Case                                     | Effect                                  |
/// |------------------------------------------|-----------------------------------------|
/// | `p.end <= m.start`                       | emit `p`, next `p`                      |
/// | `p.start >= m.end`                       | next `m`, retest `p`                    |
/// | `p.start < m.start`, `p.end <= m.end`    | emit `[p.start, m.start)`               |
/// | `p.start < m.start`, `p.end > m.end`     | emit `[p.start, m.start)`, keep `[m.end, p.end)` |
/// | `p.start >= m.start`, `p.end > m.end`    | keep `[m.end, p.end)`                   |
/// | `p` inside `m`                           | nothing                                 |
pub fn subtract<U: Unit>(positive: &[Interval<U>], negative: &[Interval<U>]) -> Vec<Interval<U>> {
    debug_assert!(super::assertions::is_sorted_by_start(positive));
    debug_assert!(super::assertions::is_sorted_by_start(negative));

    if negative.is_empty() {
        return positive.to_vec();
    }

    let mut result = Vec::with_capacity(positive.len());
    let mut j = 0usize;

    for p in positive {
        let mut piece = Some(*p);
        while let Some(current) = piece {
            let Some(mask) = negative.get(j) else {
                result.push(current);
                break;
            };

            if current.end().value() <= mask.start().value() {
                result.push(current);
                piece = None;
            } else if current.start().value() >= mask.end().value() {
                j += 1;
            } else {
                if current.start().value() < mask.start().value() {
                    result.push(Interval::new(current.start(), mask.start()));
                }
                // The remainder past the mask, if any, is retested; the mask
                // itself is skipped on that pass because remainder.start == mask.end.
                piece = Interval::checked(mask.end(), current.end());
            }
        }
    }

    result
}
