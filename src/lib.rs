//! Count the constructions, copies, moves and drops of a wrapped value.
//!
//! Wrap the value your code under test handles in a [`Probe`], exercise the
//! code, then assert on what happened to it.
//!
//! ## Example
//! ```
//! use lifecycle_probe::Probe;
//!
//! #[derive(Clone, Default)]
//! struct Payload(u32);
//!
//! type P = Probe<Payload>;
//! P::reset();
//!
//! {
//!     let mut a = P::new(Payload(7));
//!     let b = a.clone();
//!     let c = P::move_from(&mut a);
//!
//!     assert!(!a.is_active());
//!     assert_eq!(b.0, 7);
//!     assert_eq!(c.0, 7);
//!     assert_eq!(P::state().existing, 3);
//!     assert_eq!(P::state().active, 2);
//! }
//!
//! let total = P::total();
//! assert_eq!((total.valco, total.copies, total.moves), (1, 1, 1));
//! assert_eq!(total.max_existing, 3);
//! assert!(P::clean(), "{}", P::report());
//! ```
//!
//! ## Mapping of lifecycle events
//! | event              | operation                    |
//! |--------------------|------------------------------|
//! | default-construct  | [`Default::default`]         |
//! | value-construct    | [`Probe::new`], [`From`]     |
//! | copy-construct     | [`Clone::clone`]             |
//! | move-construct     | [`Probe::move_from`]         |
//! |                    | [`Probe::move_from_with`]    |
//! | copy-assign        | [`Clone::clone_from`]        |
//! | move-assign        | [`Probe::move_assign`]       |
//! |                    | [`Probe::move_assign_with`]  |
//! | destroy            | [`Drop`]                     |
//!
//! Rust's own moves are bitwise copies and are not observed. A probe that is
//! pushed into a `Vec` or returned from a function is the same instance.
//!
//! ## Separate books
//! By default all probes wrapping the same `T` share one process-wide
//! [`Ledger`]. Tests that run in parallel and wrap the same type should give
//! each test its own books. Each wrapped type still gets its own ledger under
//! those books:
//! ```
//! use lifecycle_probe::{Probe, Tabulate};
//!
//! #[derive(Tabulate)]
//! struct ThisTest;
//!
//! let a: Probe<u8, ThisTest> = Probe::new(1);
//! drop(a);
//! assert_eq!(Probe::<u8, ThisTest>::total().destr, 1);
//! assert_eq!(Probe::<u8>::total().destr, 0);
//! assert_eq!(Probe::<u16, ThisTest>::total().destr, 0);
//! ```
#![deny(missing_docs)]

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

pub mod counter;
mod counts;
mod ledger;
mod state;

use counter::{Counter, RelaxedCounter};

pub use counts::{update_count_min_max, Event, ProbeCounts};
pub use ledger::{ledger_for, Ledger};
pub use state::ProbeState;

/// Automatically derive an implementation of [`Tabulate`] for a marker type.
///
/// The marker keeps a separate [`Ledger`] for every wrapped type, obtained
/// from [`ledger_for`] with the key `(Marker, T)`. By default, this uses
/// [`counter::RelaxedCounter`] cells.
/// You can use a different counter type like so:
/// ```
/// use lifecycle_probe::{Probe, Tabulate};
///
/// #[derive(Tabulate)]
/// #[Tabulate(Counter = "lifecycle_probe::counter::SeqCstCounter")]
/// struct Strict;
///
/// let _probe: Probe<String, Strict> = Probe::default();
/// assert_eq!(Probe::<String, Strict>::state().active, 1);
/// ```
pub use lifecycle_probe_derive::Tabulate;

/// Selects the [`Ledger`] that records the lifecycle of `Probe<T, Self>`.
pub trait Tabulate<T>: 'static {
    /// The type of the counter cells in the ledger.
    type Counter: Counter;

    /// Produces a reference to the ledger for probes of `T`.
    fn ledger() -> &'static Ledger<Self::Counter>;
}

/// The default books: one process-wide [`Ledger`] per wrapped type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PerType;

impl<T: 'static> Tabulate<T> for PerType {
    type Counter = RelaxedCounter;

    fn ledger() -> &'static Ledger {
        ledger_for::<T, RelaxedCounter>()
    }
}

/// A value of `T` whose lifecycle is recorded in the books `B`.
///
/// A probe is *active* until it is moved from with [`Probe::move_from`] or
/// [`Probe::move_assign`]. A moved-from probe still holds a value: `T::default()`
/// for those two, or the remainder passed to [`Probe::move_from_with`] and
/// [`Probe::move_assign_with`], which need no `Default`.
pub struct Probe<T, B = PerType>
where
    B: Tabulate<T>,
{
    value: T,
    active: bool,
    ledger: &'static Ledger<B::Counter>,
    _books: PhantomData<fn() -> B>,
}

impl<T, B> Probe<T, B>
where
    B: Tabulate<T>,
{
    fn with_event(value: T, active: bool, event: Event) -> Self {
        let ledger = B::ledger();
        ledger.record(event, i64::from(active));
        Self {
            value,
            active,
            ledger,
            _books: PhantomData,
        }
    }

    /// Wraps `value`, recording a value construction.
    pub fn new(value: T) -> Self {
        Self::with_event(value, true, Event::ValueConstruct)
    }

    /// Takes the value out of `source`, recording a move construction.
    ///
    /// The new probe is active iff `source` was. `source` becomes inactive and
    /// is left holding `T::default()`. Use [`Probe::move_from_with`] when `T`
    /// has no default.
    pub fn move_from(source: &mut Self) -> Self
    where
        T: Default,
    {
        Self::move_from_with(source, T::default())
    }

    /// Takes the value out of `source`, leaving `remainder` in its place, and
    /// records a move construction.
    pub fn move_from_with(source: &mut Self, remainder: T) -> Self {
        let value = std::mem::replace(&mut source.value, remainder);
        let active = std::mem::replace(&mut source.active, false);
        let ledger = B::ledger();
        ledger.record(Event::MoveConstruct, 0);
        Self {
            value,
            active,
            ledger,
            _books: PhantomData,
        }
    }

    /// Takes the value out of `source` into `self`, recording a move
    /// assignment.
    ///
    /// `self` becomes active iff `source` was. `source` becomes inactive and
    /// is left holding `T::default()`. Use [`Probe::move_assign_with`] when
    /// `T` has no default.
    pub fn move_assign(&mut self, source: &mut Self) -> &mut Self
    where
        T: Default,
    {
        self.move_assign_with(source, T::default())
    }

    /// Takes the value out of `source` into `self`, leaving `remainder` in
    /// `source`, and records a move assignment.
    pub fn move_assign_with(&mut self, source: &mut Self, remainder: T) -> &mut Self {
        let before = i64::from(self.active) + i64::from(source.active);
        self.active = source.active;
        source.active = false;
        let after = i64::from(self.active) + i64::from(source.active);
        self.ledger.record(Event::MoveAssign, after - before);

        self.value = std::mem::replace(&mut source.value, remainder);
        self
    }

    /// Whether this probe has not been moved from.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The wrapped value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// The wrapped value, mutably. Mutation is not a lifecycle event.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Zeroes the liveness snapshot and both counter sets of `B`'s ledger.
    pub fn reset() {
        B::ledger().reset();
    }

    /// The current liveness snapshot.
    pub fn state() -> ProbeState {
        B::ledger().state()
    }

    /// The cumulative counter set.
    pub fn total() -> ProbeCounts {
        B::ledger().total()
    }

    /// The counter set accumulated since the previous call, which is then
    /// zeroed.
    pub fn last() -> ProbeCounts {
        B::ledger().last()
    }

    /// Whether no probes of this ledger are alive.
    pub fn clean() -> bool {
        B::ledger().clean()
    }

    /// Renders all three records; drains the since-last-read set.
    pub fn report() -> String {
        B::ledger().report()
    }
}

impl<T, B> Default for Probe<T, B>
where
    T: Default,
    B: Tabulate<T>,
{
    fn default() -> Self {
        Self::with_event(T::default(), true, Event::DefaultConstruct)
    }
}

impl<T, B> From<T> for Probe<T, B>
where
    B: Tabulate<T>,
{
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T, B> Clone for Probe<T, B>
where
    T: Clone,
    B: Tabulate<T>,
{
    fn clone(&self) -> Self {
        Self::with_event(self.value.clone(), self.active, Event::CopyConstruct)
    }

    fn clone_from(&mut self, source: &Self) {
        let before = i64::from(self.active) + i64::from(source.active);
        self.active = source.active;
        let after = i64::from(self.active) + i64::from(source.active);
        self.ledger.record(Event::CopyAssign, after - before);

        self.value.clone_from(&source.value);
    }
}

impl<T, B> Drop for Probe<T, B>
where
    B: Tabulate<T>,
{
    fn drop(&mut self) {
        self.ledger.record(Event::Destroy, -i64::from(self.active));
    }
}

impl<T, B> Deref for Probe<T, B>
where
    B: Tabulate<T>,
{
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, B> DerefMut for Probe<T, B>
where
    B: Tabulate<T>,
{
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T, B> fmt::Debug for Probe<T, B>
where
    T: fmt::Debug,
    B: Tabulate<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("value", &self.value)
            .field("active", &self.active)
            .finish()
    }
}

impl<T, B> Hash for Probe<T, B>
where
    T: Hash,
    B: Tabulate<T>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T, B> PartialEq for Probe<T, B>
where
    T: PartialEq,
    B: Tabulate<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T, B> Eq for Probe<T, B>
where
    T: Eq,
    B: Tabulate<T>,
{
}

impl<T, B> PartialOrd for Probe<T, B>
where
    T: PartialOrd,
    B: Tabulate<T>,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<T, B> Ord for Probe<T, B>
where
    T: Ord,
    B: Tabulate<T>,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}
