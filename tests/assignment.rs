//! Every combination of active and moved-from operands for both assignments.

use lifecycle_probe::{Probe, Tabulate};

#[derive(Tabulate)]
struct CopyBooks;

#[derive(Tabulate)]
struct MoveBooks;

/// Builds a probe in the requested state. An inactive probe is produced by
/// moving out of it into a temporary that is dropped right away.
fn make<B: Tabulate<u32>>(value: u32, active: bool) -> Probe<u32, B> {
    let mut probe = Probe::new(value);
    if !active {
        drop(Probe::move_from(&mut probe));
        *probe = value;
    }
    probe
}

// (target active, source active, delta of `active`, target active afterwards)
const COPY_TABLE: [(bool, bool, i64, bool); 4] = [
    (true, true, 0, true),
    (true, false, -1, false),
    (false, true, 1, true),
    (false, false, 0, false),
];

const MOVE_TABLE: [(bool, bool, i64, bool); 4] = [
    (true, true, -1, true),
    (true, false, -1, false),
    (false, true, 0, true),
    (false, false, 0, false),
];

#[test]
fn copy_assignment_truth_table() {
    type P = Probe<u32, CopyBooks>;

    for (target_active, source_active, delta, expected) in COPY_TABLE {
        let mut target: P = make(1, target_active);
        let source: P = make(2, source_active);
        let before = P::state();
        let copas_before = P::total().copas;

        target.clone_from(&source);

        let case = format!("target {target_active}, source {source_active}");
        assert_eq!(target.is_active(), expected, "{case}");
        assert_eq!(source.is_active(), source_active, "{case}");
        assert_eq!(P::state().active - before.active, delta, "{case}");
        assert_eq!(P::state().existing, before.existing, "{case}");
        assert_eq!(P::total().copas, copas_before + 1, "{case}");
        assert_eq!(*target, *source, "{case}");
    }

    assert!(P::clean(), "{}", P::report());
    assert_eq!(P::total().copies, 4);
}

#[test]
fn move_assignment_truth_table() {
    type P = Probe<u32, MoveBooks>;

    for (target_active, source_active, delta, expected) in MOVE_TABLE {
        let mut target: P = make(1, target_active);
        let mut source: P = make(2, source_active);
        let before = P::state();
        let movas_before = P::total().movas;

        target.move_assign(&mut source);

        let case = format!("target {target_active}, source {source_active}");
        assert_eq!(target.is_active(), expected, "{case}");
        assert!(!source.is_active(), "{case}");
        assert_eq!(P::state().active - before.active, delta, "{case}");
        assert_eq!(P::state().existing, before.existing, "{case}");
        assert_eq!(P::total().movas, movas_before + 1, "{case}");
        assert_eq!(*target, 2, "{case}");
        assert_eq!(*source, 0, "{case}");
    }

    assert!(P::clean(), "{}", P::report());
}
