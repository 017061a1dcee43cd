// 1. import these two items:
use lifecycle_probe::{Probe, Tabulate};

// 2. Derive `Tabulate` on a marker type.
// This will count with `SeqCstCounter` cells.
#[derive(Tabulate)]
#[Tabulate(Counter = "lifecycle_probe::counter::SeqCstCounter")]
pub struct Books;

// 3. name the marker as the books of your probes:
type Counted<T> = Probe<T, Books>;

fn main() {
    // every wrapped type gets its own ledger under `Books`
    let a: Counted<u8> = Probe::new(1);
    let b: Counted<String> = Probe::default();

    assert_eq!(Counted::<u8>::state().existing, 1);
    assert_eq!(Counted::<String>::state().existing, 1);
    assert_eq!(Counted::<String>::total().defco, 1);
    assert_eq!(Counted::<u8>::total().defco, 0);

    // and those ledgers are apart from the default books of the same type
    let c: Probe<u8> = Probe::new(2);
    assert_eq!(Probe::<u8>::state().existing, 1);
    assert_eq!(Counted::<u8>::total().valco, 1);

    drop((a, b, c));
    assert!(Counted::<u8>::clean());
    assert!(Counted::<String>::clean());
    assert!(Probe::<u8>::clean());
}
