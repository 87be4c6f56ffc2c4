use rand::Rng;

/// Uniform index in `[0, n)`.
///
/// Draws from the calling thread's own generator, so producers on different
/// threads never contend on shared generator state. `n` must be positive.
#[inline]
pub fn next_index(n: u64) -> u64 {
    debug_assert!(n > 0, "next_index called with n = 0");
    rand::thread_rng().gen_range(0..n)
}
