// * Request Pacing
// * Local token-bucket pacing for outgoing platform requests. One pacer per
// * client; a run is sequential so this bounds the request rate end to end.

use governor::{Quota, RateLimiter as GovernorLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;

pub struct RequestPacer {
    limiter: GovernorLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl RequestPacer {
    pub fn new(requests_per_second: u32) -> Self {
        let quota =
            Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32)));
        Self {
            limiter: GovernorLimiter::direct(quota),
        }
    }

    // * Checks the bucket without consuming a slot wait
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }

    // * Waits until the next request slot is available
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}
