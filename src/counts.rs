use std::fmt;

/// The kinds of lifecycle events a [`Probe`](crate::Probe) reports.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Event {
    /// Built with [`Default`].
    DefaultConstruct,
    /// Built from a value with [`Probe::new`](crate::Probe::new).
    ValueConstruct,
    /// Built with [`Clone::clone`].
    CopyConstruct,
    /// Built with [`Probe::move_from`](crate::Probe::move_from).
    MoveConstruct,
    /// Overwritten with [`Clone::clone_from`].
    CopyAssign,
    /// Overwritten with [`Probe::move_assign`](crate::Probe::move_assign).
    MoveAssign,
    /// Dropped.
    Destroy,
}

impl Event {
    /// A short, stable name for this event.
    pub fn name(self) -> &'static str {
        match self {
            Event::DefaultConstruct => "default_construct",
            Event::ValueConstruct => "value_construct",
            Event::CopyConstruct => "copy_construct",
            Event::MoveConstruct => "move_construct",
            Event::CopyAssign => "copy_assign",
            Event::MoveAssign => "move_assign",
            Event::Destroy => "destroy",
        }
    }

    /// Whether this event duplicates a value.
    pub fn is_copy(self) -> bool {
        matches!(self, Event::CopyConstruct | Event::CopyAssign)
    }

    /// Whether this event transfers a value out of another probe.
    pub fn is_move(self) -> bool {
        matches!(self, Event::MoveConstruct | Event::MoveAssign)
    }
}

/// Event counts of one counter set, plus the extremes of the liveness
/// snapshot observed since that set was last reset.
///
/// The extremes start at `0` rather than at the first observation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ProbeCounts {
    /// Default constructions.
    pub defco: i64,
    /// Value constructions.
    pub valco: i64,
    /// Copy constructions.
    pub copco: i64,
    /// Move constructions.
    pub movco: i64,
    /// Copy assignments.
    pub copas: i64,
    /// Move assignments.
    pub movas: i64,
    /// Destructions.
    pub destr: i64,

    /// `copco + copas`.
    pub copies: i64,
    /// `movco + movas`.
    pub moves: i64,

    /// Smallest `active` observed.
    pub min_active: i64,
    /// Largest `active` observed.
    pub max_active: i64,
    /// Smallest `existing` observed.
    pub min_existing: i64,
    /// Largest `existing` observed.
    pub max_existing: i64,
}

impl ProbeCounts {
    /// The number of times `event` was recorded.
    pub fn calls(&self, event: Event) -> i64 {
        match event {
            Event::DefaultConstruct => self.defco,
            Event::ValueConstruct => self.valco,
            Event::CopyConstruct => self.copco,
            Event::MoveConstruct => self.movco,
            Event::CopyAssign => self.copas,
            Event::MoveAssign => self.movas,
            Event::Destroy => self.destr,
        }
    }

    /// Whether every field is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Widens the extremes of `counts` to include the given liveness values.
pub fn update_count_min_max(counts: &mut ProbeCounts, existing: i64, active: i64) {
    counts.min_existing = counts.min_existing.min(existing);
    counts.max_existing = counts.max_existing.max(existing);
    counts.min_active = counts.min_active.min(active);
    counts.max_active = counts.max_active.max(active);
}

impl fmt::Display for ProbeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections: [(&str, &[(&str, i64)]); 3] = [
            (
                "-calls-",
                &[
                    ("default constructor", self.defco),
                    ("value constructor", self.valco),
                    ("copy constructor", self.copco),
                    ("move constructor", self.movco),
                    ("copy assignment", self.copas),
                    ("move assignment", self.movas),
                    ("destructor", self.destr),
                ],
            ),
            (
                "-semantics-",
                &[("copies", self.copies), ("moves", self.moves)],
            ),
            (
                "-min/max-",
                &[
                    ("min active", self.min_active),
                    ("max active", self.max_active),
                    ("min existing", self.min_existing),
                    ("max existing", self.max_existing),
                ],
            ),
        ];

        let mut first = true;
        for (header, lines) in sections {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{header}")?;
            for (label, value) in lines {
                let label = format!("{label}:");
                write!(f, "\n {label:<21}{value}")?;
            }
        }
        Ok(())
    }
}
