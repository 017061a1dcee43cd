//! Shared counter cells backing a [`Ledger`](crate::Ledger).
//!
//! The default, [`RelaxedCounter`], is suitable in most circumstances.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicI64, Ordering};

/// A type suitable as one field of a shared lifecycle ledger.
///
/// Every operation on a single cell is atomic. A lifecycle event touches many
/// cells, and those updates are not atomic as a group.
pub trait Counter: Send + Sync + 'static {
    /// A fresh instance of this counter holding the value of `0`.
    const ZERO: Self;

    /// Increase the value of this counter by `n`.
    fn add_assign(&self, n: i64);

    /// Decrease the value of this counter by `n`.
    fn sub_assign(&self, n: i64);

    /// Retrieve the value of this counter.
    fn fetch(&self) -> i64;

    /// Lower the value of this counter to `n` if `n` is smaller.
    fn widen_min(&self, n: i64);

    /// Raise the value of this counter to `n` if `n` is larger.
    fn widen_max(&self, n: i64);

    /// Retrieve the value of this counter and reset it to `0`.
    fn take(&self) -> i64;

    /// Reset this counter to `0`.
    fn clear(&self);
}

macro_rules! padded_counter {
    ($(#[$attr:meta])* $name:ident, $ordering:expr) => {
        $(#[$attr])*
        #[repr(transparent)]
        pub struct $name {
            counter: CachePadded<AtomicI64>,
        }

        impl Counter for $name {
            const ZERO: Self = Self {
                counter: CachePadded::new(AtomicI64::new(0)),
            };

            #[inline(always)]
            fn add_assign(&self, n: i64) {
                let _ = self.counter.fetch_add(n, $ordering);
            }

            #[inline(always)]
            fn sub_assign(&self, n: i64) {
                let _ = self.counter.fetch_sub(n, $ordering);
            }

            #[inline(always)]
            fn fetch(&self) -> i64 {
                self.counter.load($ordering)
            }

            #[inline(always)]
            fn widen_min(&self, n: i64) {
                let _ = self.counter.fetch_min(n, $ordering);
            }

            #[inline(always)]
            fn widen_max(&self, n: i64) {
                let _ = self.counter.fetch_max(n, $ordering);
            }

            #[inline(always)]
            fn take(&self) -> i64 {
                self.counter.swap(0, $ordering)
            }

            #[inline(always)]
            fn clear(&self) {
                self.counter.store(0, $ordering);
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.fetch()).finish()
            }
        }
    };
}

padded_counter!(
    /// An [`AtomicI64`] padded and aligned to the cache line size to combat
    /// [false sharing].
    ///
    /// As a [`Counter`], this type uses [`Ordering::Relaxed`] for every
    /// operation.
    ///
    /// [false sharing]: https://en.wikipedia.org/wiki/False_sharing
    RelaxedCounter,
    Ordering::Relaxed
);

padded_counter!(
    /// A [`Counter`] useful for testing.
    ///
    /// This counter uses [`Ordering::SeqCst`] for every operation.
    SeqCstCounter,
    Ordering::SeqCst
);
