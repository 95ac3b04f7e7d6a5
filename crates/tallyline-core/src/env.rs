//! Environment abstraction for deterministic testing.
//!
//! Decouples engine logic from system resources (time, randomness). The
//! engine's anonymous nicknames and backoff jitter draw from here, so tests
//! can supply a seeded source and assert exact values.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards within one execution context
/// - `random_bytes()` is uniformly distributed (cryptographic strength is
///   not required here; nothing secret derives from it)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; simulated
    /// environments may substitute virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// The only async method in the trait; only driver code should call it.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for nickname digits and jitter draws.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Production environment: system clock, thread-local RNG, tokio sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        use rand::RngCore;
        rand::thread_rng().fill_bytes(buffer);
    }
}

pub mod test_utils {
    //! Deterministic environment for tests.

    use std::{
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    };

    use rand::{RngCore, SeedableRng, rngs::StdRng};

    use super::Environment;

    /// Deterministic environment: seeded RNG and a manually advanced clock.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        rng: Arc<Mutex<StdRng>>,
        epoch: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl MockEnv {
        /// Environment with a fixed default seed.
        #[must_use]
        pub fn new() -> Self {
            Self::with_seed(0)
        }

        /// Environment seeded with `seed`.
        #[must_use]
        pub fn with_seed(seed: u64) -> Self {
            Self {
                rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
                epoch: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the virtual clock.
        pub fn advance(&self, by: Duration) {
            let mut offset = self.offset.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            *offset += by;
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            let offset = *self.offset.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            self.epoch + offset
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            async {}
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            rng.fill_bytes(buffer);
        }
    }
}
