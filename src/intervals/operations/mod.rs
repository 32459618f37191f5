mod intersection;
mod normalize;
mod subtract;

pub use intersection::compute_intersection;
pub use normalize::normalize;
pub use subtract::subtract;

#[cfg(debug_assertions)]
pub mod assertions;

#[cfg(not(debug_assertions))]
pub mod assertions {
    use crate::intervals::Interval;
    use qtty::Unit;

    pub fn is_canonical<U: Unit>(_intervals: &[Interval<U>]) -> bool {
        true
    }

    pub fn is_sorted_by_start<U: Unit>(_intervals: &[Interval<U>]) -> bool {
        true
    }
}
