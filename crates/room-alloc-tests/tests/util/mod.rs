use nanorand::{Rng, WyRand};
use room_alloc_core::Request;
use room_alloc_tests::{primary, secondary};

/// `primaries` primary requests with ids from 1, followed by `secondaries`
/// secondary requests
#[allow(unused)]
pub fn batch(primaries: u32, secondaries: u32) -> Vec<Request> {
    (1..=primaries)
        .map(primary)
        .chain((primaries + 1..=primaries + secondaries).map(secondary))
        .collect()
}

/// Random mix of primary and secondary requests with ids `1..=len`, about
/// one in `reject_one_in` carrying a rejection flag
#[allow(unused)]
pub fn random_batch(rng: &mut WyRand, len: u32, reject_one_in: u32) -> Vec<Request> {
    (1..=len)
        .map(|id| {
            let request = if rng.generate_range(0_u32..2) == 0 {
                primary(id)
            } else {
                secondary(id)
            };
            request.with_rejections(
                rng.generate_range(0..reject_one_in) == 0,
                rng.generate_range(0..reject_one_in) == 0,
            )
        })
        .collect()
}
