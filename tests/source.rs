//! Buffer growth policy.

use jindo_syntax::source::{MAX_DOUBLING_SIZE, MIN_BUFFER_SIZE, grow, next_size};
use proptest::prelude::*;

#[test]
fn growth_steps() {
    assert_eq!(next_size(0), MIN_BUFFER_SIZE);
    assert_eq!(next_size(MIN_BUFFER_SIZE), 2 * MIN_BUFFER_SIZE);
    assert_eq!(next_size(MAX_DOUBLING_SIZE), 2 * MAX_DOUBLING_SIZE);
    assert_eq!(
        next_size(2 * MAX_DOUBLING_SIZE),
        3 * MAX_DOUBLING_SIZE
    );
}

proptest! {
    /// The buffer always grows, by the documented step.
    #[test]
    fn grow_policy(size in 0usize..1 << 24, min in 1usize..1 << 12, extra in 0usize..1 << 16) {
        let max = min + extra;
        let n = grow(size, min, max);
        prop_assert!(n > size);
        prop_assert!(n >= min);
        if size < min {
            prop_assert_eq!(n, min);
        } else if size <= max {
            prop_assert_eq!(n, 2 * size);
        } else {
            prop_assert_eq!(n, size + max);
        }
    }
}
