use lifecycle_probe::counter::{RelaxedCounter, SeqCstCounter};
use lifecycle_probe::{Ledger, PerType, Probe, ProbeCounts, ProbeState, Tabulate};
use static_assertions::{assert_impl_all, assert_not_impl_any};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Tabulate)]
struct Books;

assert_impl_all!(Ledger<RelaxedCounter>: Send, Sync);
assert_impl_all!(Ledger<SeqCstCounter>: Send, Sync);
assert_impl_all!(Probe<u32>: Send, Sync, Clone, Default);
assert_impl_all!(Probe<u32, Books>: Send, Sync, Clone, Default);
assert_impl_all!(ProbeState: Copy, Send, Sync);
assert_impl_all!(ProbeCounts: Copy, Send, Sync);
assert_impl_all!(PerType: Tabulate<String>);

// The wrapped value alone decides the auto traits of a probe.
assert_not_impl_any!(Probe<Rc<u32>>: Send, Sync);
assert_not_impl_any!(Probe<Cell<u32>>: Sync);

#[test]
fn moves_between_threads() {
    let probe: Probe<u32, Books> = Probe::new(4);
    let handle = std::thread::spawn(move || *probe + 1);
    assert_eq!(handle.join().unwrap(), 5);
    assert!(Probe::<u32, Books>::clean());
    assert_eq!(Probe::<u32, Books>::total().destr, 1);
}
