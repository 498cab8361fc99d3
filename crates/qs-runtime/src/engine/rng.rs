fn next_random_u32(state: &mut u32) -> u32 {
    let mut next = state.wrapping_add(0x6d2b79f5);
    *state = next;
    next = (next ^ (next >> 15)).wrapping_mul(next | 1);
    next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
    next ^ (next >> 14)
}

fn next_random_bounded_with<F>(state: &mut u32, bound: u32, mut next: F) -> u32
where
    F: FnMut(&mut u32) -> u32,
{
    let threshold = (u64::from(u32::MAX) + 1) / u64::from(bound) * u64::from(bound);
    let mut candidate = next(state);
    while u64::from(candidate) >= threshold {
        candidate = next(state);
    }
    candidate % bound
}

/// Uniform value in `min..=max`; the bounds may come in either order.
pub(crate) fn next_random_in_range(state: &mut u32, min: i32, max: i32) -> i32 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    let span = i64::from(high) - i64::from(low) + 1;
    if span > i64::from(u32::MAX) {
        return low.wrapping_add(next_random_u32(state) as i32);
    }
    let offset = next_random_bounded_with(state, span as u32, next_random_u32);
    (i64::from(low) + i64::from(offset)) as i32
}
