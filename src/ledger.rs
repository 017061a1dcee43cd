//! The accounting records shared by every probe that writes to the same books.

use crate::counter::{Counter, RelaxedCounter};
use crate::{Event, ProbeCounts, ProbeState};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};

struct StateCells<C> {
    active: C,
    existing: C,
}

impl<C: Counter> StateCells<C> {
    const fn new() -> Self {
        Self {
            active: C::ZERO,
            existing: C::ZERO,
        }
    }

    fn snapshot(&self) -> ProbeState {
        ProbeState {
            active: self.active.fetch(),
            existing: self.existing.fetch(),
        }
    }

    fn clear(&self) {
        self.active.clear();
        self.existing.clear();
    }
}

struct CountCells<C> {
    defco: C,
    valco: C,
    copco: C,
    movco: C,
    copas: C,
    movas: C,
    destr: C,
    copies: C,
    moves: C,
    min_active: C,
    max_active: C,
    min_existing: C,
    max_existing: C,
}

impl<C: Counter> CountCells<C> {
    const fn new() -> Self {
        Self {
            defco: C::ZERO,
            valco: C::ZERO,
            copco: C::ZERO,
            movco: C::ZERO,
            copas: C::ZERO,
            movas: C::ZERO,
            destr: C::ZERO,
            copies: C::ZERO,
            moves: C::ZERO,
            min_active: C::ZERO,
            max_active: C::ZERO,
            min_existing: C::ZERO,
            max_existing: C::ZERO,
        }
    }

    fn bump(&self, event: Event) {
        let cell = match event {
            Event::DefaultConstruct => &self.defco,
            Event::ValueConstruct => &self.valco,
            Event::CopyConstruct => &self.copco,
            Event::MoveConstruct => &self.movco,
            Event::CopyAssign => &self.copas,
            Event::MoveAssign => &self.movas,
            Event::Destroy => &self.destr,
        };
        cell.add_assign(1);

        if event.is_copy() {
            self.copies.add_assign(1);
        } else if event.is_move() {
            self.moves.add_assign(1);
        }
    }

    fn widen(&self, state: ProbeState) {
        self.min_existing.widen_min(state.existing);
        self.max_existing.widen_max(state.existing);
        self.min_active.widen_min(state.active);
        self.max_active.widen_max(state.active);
    }

    fn read(&self, read: impl Fn(&C) -> i64) -> ProbeCounts {
        ProbeCounts {
            defco: read(&self.defco),
            valco: read(&self.valco),
            copco: read(&self.copco),
            movco: read(&self.movco),
            copas: read(&self.copas),
            movas: read(&self.movas),
            destr: read(&self.destr),
            copies: read(&self.copies),
            moves: read(&self.moves),
            min_active: read(&self.min_active),
            max_active: read(&self.max_active),
            min_existing: read(&self.min_existing),
            max_existing: read(&self.max_existing),
        }
    }

    fn snapshot(&self) -> ProbeCounts {
        self.read(C::fetch)
    }

    fn drain(&self) -> ProbeCounts {
        self.read(C::take)
    }

    fn clear(&self) {
        let _ = self.drain();
    }
}

/// The liveness snapshot, the cumulative counter set and the since-last-read
/// counter set of one group of probes.
///
/// A ledger is usually reached through [`Tabulate::ledger`](crate::Tabulate::ledger),
/// but it can also be declared directly:
/// ```
/// use lifecycle_probe::Ledger;
///
/// static LEDGER: Ledger = Ledger::new();
///
/// assert!(LEDGER.clean());
/// assert!(LEDGER.last().is_zero());
/// ```
pub struct Ledger<C = RelaxedCounter> {
    state: StateCells<C>,
    total: CountCells<C>,
    last: CountCells<C>,
}

impl<C: Counter> Ledger<C> {
    /// An empty ledger.
    pub const fn new() -> Self {
        Self {
            state: StateCells::new(),
            total: CountCells::new(),
            last: CountCells::new(),
        }
    }

    /// Zeroes the liveness snapshot and both counter sets.
    ///
    /// Call this between independent test cases. Resetting while probes are
    /// alive makes the snapshot disagree with them once they are dropped.
    pub fn reset(&self) {
        self.state.clear();
        self.total.clear();
        self.last.clear();
        tracing::debug!("probe ledger reset");
    }

    /// The current liveness snapshot.
    pub fn state(&self) -> ProbeState {
        self.state.snapshot()
    }

    /// The cumulative counter set.
    pub fn total(&self) -> ProbeCounts {
        self.total.snapshot()
    }

    /// The counter set accumulated since the previous call, which is then
    /// zeroed.
    pub fn last(&self) -> ProbeCounts {
        self.last.drain()
    }

    /// Whether no probes of this ledger are alive.
    pub fn clean(&self) -> bool {
        let state = self.state();
        state.active == 0 && state.existing == 0
    }

    /// Renders the `LAST`, `TOTAL` and `STATE` records for a failure message.
    ///
    /// Drains the since-last-read counter set, like [`Ledger::last`].
    pub fn report(&self) -> String {
        let last = self.last();
        format!(
            "===LAST===\n{last}\n===TOTAL===\n{}\n===STATE===\n{}",
            self.total(),
            self.state()
        )
    }

    /// Records `event`, moving `active` by `active_delta`.
    pub(crate) fn record(&self, event: Event, active_delta: i64) {
        self.total.bump(event);
        self.last.bump(event);

        match event {
            Event::DefaultConstruct
            | Event::ValueConstruct
            | Event::CopyConstruct
            | Event::MoveConstruct => self.state.existing.add_assign(1),
            Event::Destroy => self.state.existing.sub_assign(1),
            Event::CopyAssign | Event::MoveAssign => {}
        }
        self.state.active.add_assign(active_delta);

        let state = self.state();
        self.total.widen(state);
        self.last.widen(state);

        tracing::trace!(
            event = event.name(),
            active = state.active,
            existing = state.existing,
            "probe lifecycle event"
        );
    }
}

impl<C: Counter> Default for Ledger<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Counter> fmt::Debug for Ledger<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("state", &self.state())
            .field("total", &self.total())
            .finish_non_exhaustive()
    }
}

type Entry = &'static (dyn Any + Send + Sync);

// Entries are leaked and never removed, so every lookup after the first can be
// served from the per-thread cache without touching the lock.
static LEDGERS: LazyLock<Mutex<HashMap<TypeId, Entry>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

thread_local! {
    static CACHED: RefCell<HashMap<TypeId, Entry>> = RefCell::new(HashMap::new());
}

/// The process-wide ledger registered under the key type `K`.
///
/// Each distinct `K` gets its own ledger, created on first use and kept for
/// the rest of the process. [`PerType`](crate::PerType) keys ledgers on the
/// wrapped type and `#[derive(Tabulate)]` keys them on `(Marker, T)`, so two
/// wrapped types never share counters.
/// ```
/// use lifecycle_probe::counter::RelaxedCounter;
/// use lifecycle_probe::ledger_for;
///
/// let a = ledger_for::<(u8, u16), RelaxedCounter>();
/// let b = ledger_for::<(u8, u32), RelaxedCounter>();
/// assert!(std::ptr::eq(a, ledger_for::<(u8, u16), RelaxedCounter>()));
/// assert!(!std::ptr::eq(a, b));
/// ```
pub fn ledger_for<K: 'static, C: Counter>() -> &'static Ledger<C> {
    let key = TypeId::of::<(K, C)>();
    let cached = CACHED
        .try_with(|cache| cache.borrow().get(&key).copied())
        .ok()
        .flatten();

    let entry = match cached {
        Some(entry) => entry,
        None => {
            let entry = register::<C>(key);
            // Fails only while the thread is being torn down.
            let _ = CACHED.try_with(|cache| cache.borrow_mut().insert(key, entry));
            entry
        }
    };

    entry
        .downcast_ref::<Ledger<C>>()
        .expect("registry keys include the counter type of the ledger")
}

fn register<C: Counter>(key: TypeId) -> Entry {
    // Insert-only, so a poisoned map is still consistent.
    let mut ledgers = LEDGERS.lock().unwrap_or_else(PoisonError::into_inner);
    *ledgers.entry(key).or_insert_with(|| {
        let ledger: Entry = Box::leak(Box::new(Ledger::<C>::new()));
        ledger
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::SeqCstCounter;

    #[test]
    fn construction_and_destruction() {
        let ledger = Ledger::<SeqCstCounter>::new();
        ledger.record(Event::DefaultConstruct, 1);
        ledger.record(Event::CopyConstruct, 1);
        assert_eq!(
            ledger.state(),
            ProbeState {
                active: 2,
                existing: 2
            }
        );

        ledger.record(Event::Destroy, -1);
        ledger.record(Event::Destroy, -1);
        assert!(ledger.clean());

        let total = ledger.total();
        assert_eq!(total.defco, 1);
        assert_eq!(total.copco, 1);
        assert_eq!(total.copies, 1);
        assert_eq!(total.destr, 2);
        assert_eq!(total.max_existing, 2);
        assert_eq!(total.max_active, 2);
        assert_eq!(total.min_existing, 0);
    }

    #[test]
    fn assignment_leaves_existing_alone() {
        let ledger = Ledger::<RelaxedCounter>::new();
        ledger.record(Event::ValueConstruct, 1);
        ledger.record(Event::MoveConstruct, 0);
        ledger.record(Event::MoveAssign, -1);
        assert_eq!(
            ledger.state(),
            ProbeState {
                active: 0,
                existing: 2
            }
        );
        let total = ledger.total();
        assert_eq!(total.moves, 2);
        assert_eq!(total.copies, 0);
    }

    #[test]
    fn last_drains_but_total_keeps() {
        let ledger = Ledger::<RelaxedCounter>::new();
        ledger.record(Event::DefaultConstruct, 1);

        let last = ledger.last();
        assert_eq!(last.defco, 1);
        assert_eq!(last.max_existing, 1);
        assert!(ledger.last().is_zero());
        assert_eq!(ledger.total().defco, 1);
    }

    #[test]
    fn drained_extremes_restart_at_zero() {
        let ledger = Ledger::<RelaxedCounter>::new();
        ledger.record(Event::DefaultConstruct, 1);
        ledger.record(Event::DefaultConstruct, 1);
        let _ = ledger.last();

        ledger.record(Event::Destroy, -1);
        let last = ledger.last();
        assert_eq!(last.max_existing, 1);
        assert_eq!(ledger.total().max_existing, 2);
    }

    #[test]
    fn reset_zeroes_everything() {
        let ledger = Ledger::<RelaxedCounter>::new();
        ledger.record(Event::DefaultConstruct, 1);
        ledger.reset();
        assert!(ledger.clean());
        assert!(ledger.total().is_zero());
        assert!(ledger.last().is_zero());
    }

    #[test]
    fn report_layout() {
        let ledger = Ledger::<RelaxedCounter>::new();
        ledger.record(Event::DefaultConstruct, 1);

        let report = ledger.report();
        assert!(report.starts_with("===LAST===\n-calls-\n default constructor: 1\n"));
        assert!(report.ends_with("===STATE===\nactive:   1\nexisting: 1"));
        let total_at = report.find("===TOTAL===").unwrap();
        assert!(report[total_at..].contains(" default constructor: 1"));

        assert!(ledger.last().is_zero());
        assert_eq!(ledger.total().defco, 1);
    }

    #[test]
    fn registry_partitions_by_key() {
        struct A;
        struct B;
        let a = ledger_for::<A, RelaxedCounter>();
        assert!(std::ptr::eq(a, ledger_for::<A, RelaxedCounter>()));
        assert!(!std::ptr::eq(a, ledger_for::<B, RelaxedCounter>()));
        assert!(!std::ptr::eq(
            ledger_for::<(A, u8), RelaxedCounter>(),
            ledger_for::<(A, u16), RelaxedCounter>()
        ));
    }

    #[test]
    fn registry_counter_type_is_part_of_the_key() {
        struct A;
        ledger_for::<A, RelaxedCounter>().record(Event::DefaultConstruct, 1);
        assert_eq!(ledger_for::<A, RelaxedCounter>().state().existing, 1);
        assert!(ledger_for::<A, SeqCstCounter>().clean());
    }

    #[test]
    fn repeat_lookups_come_from_the_thread_cache() {
        struct A;
        let key = TypeId::of::<(A, RelaxedCounter)>();
        assert!(!CACHED.with(|cache| cache.borrow().contains_key(&key)));

        let first = ledger_for::<A, RelaxedCounter>();
        assert!(CACHED.with(|cache| cache.borrow().contains_key(&key)));

        // Holding the lock shows the cached path never takes it.
        let _held = LEDGERS.lock().unwrap();
        assert!(std::ptr::eq(first, ledger_for::<A, RelaxedCounter>()));
    }

    #[test]
    fn registry_is_shared_across_threads() {
        struct A;
        fn address() -> usize {
            ledger_for::<A, RelaxedCounter>() as *const Ledger as usize
        }
        let there = std::thread::spawn(address).join().unwrap();
        let here = address();
        assert_eq!(here, there);
    }

    #[test]
    fn debug_does_not_drain() {
        let ledger = Ledger::<RelaxedCounter>::new();
        ledger.record(Event::ValueConstruct, 1);
        let rendered = format!("{ledger:?}");
        assert!(rendered.starts_with("Ledger { state: ProbeState { active: 1, existing: 1 }"));
        assert_eq!(ledger.last().valco, 1);
    }
}
