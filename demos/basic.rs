// 1. import the wrapper:
use lifecycle_probe::Probe;

#[derive(Clone, Default)]
pub struct Foo {
    v: u32,
}

// 2. wrap the value your code under test handles:
type ProbedFoo = Probe<Foo>;

fn main() {
    // 3. start from a clean slate:
    ProbedFoo::reset();

    // 4. exercise the code under test
    let seed = ProbedFoo::new(Foo { v: 7 });
    let mut bar: Vec<ProbedFoo> = (0..10).map(|_| seed.clone()).collect();
    drop(seed);

    assert_eq!(ProbedFoo::state().existing, 10);
    assert_eq!(ProbedFoo::last().copies, 10);

    let _ = bar.drain(0..5);
    assert_eq!(ProbedFoo::state().existing, 5);

    let mut moved_into = ProbedFoo::default();
    moved_into.move_assign(&mut bar[0]);
    assert_eq!(moved_into.v, 7);
    assert_eq!(ProbedFoo::state().active, 5);
    assert_eq!(ProbedFoo::state().existing, 6);

    drop(bar);
    drop(moved_into);

    // 5. assert that nothing leaked, printing the books if something did
    assert!(ProbedFoo::clean(), "{}", ProbedFoo::report());
    println!("{}", ProbedFoo::report());
}
