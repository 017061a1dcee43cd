use std::fmt;

/// How many probes of one ledger are alive right now.
///
/// `0 <= active <= existing` holds whenever no lifecycle operation is in
/// progress.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ProbeState {
    /// Live probes that have not been moved from.
    pub active: i64,
    /// All live probes, moved-from or not.
    pub existing: i64,
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "active:   {}", self.active)?;
        write!(f, "existing: {}", self.existing)
    }
}
