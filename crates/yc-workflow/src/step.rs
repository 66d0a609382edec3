//! Step nodes of a workflow arena.

use std::fmt;

use yc_core::Axis;
use yc_motion::{LoadState, Motion};

/// Index of a step inside its `Workflow` arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct StepId(pub u32);

impl StepId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step({})", self.0)
    }
}

/// What a step does.  `E` is the payload of callback steps, opaque to the
/// workflow and handed to the callback sink on commit.
#[derive(Clone, Debug, PartialEq)]
pub enum StepKind<E> {
    /// Move one axis from `from` to `to` (absolute positions).
    Move {
        axis:          Axis,
        from:          f64,
        to:            f64,
        interruptible: bool,
        load:          LoadState,
    },
    /// Pass time.  With `hold` set, the wait is also committed as a
    /// standstill segment on that axis, so nothing else can use it meanwhile.
    Wait { duration: f64, hold: Option<Axis> },
    /// Fire `E` at the step's start time.
    Callback(E),
    /// Children run one after another, each starting when the previous one
    /// is ready.
    Seq(Vec<StepId>),
    /// Children start together; finished and ready when all are.
    All(Vec<StepId>),
    /// Children start together; finished when all are, ready as soon as the
    /// first one is.
    AnyOf(Vec<StepId>),
}

impl<E> StepKind<E> {
    pub fn children(&self) -> &[StepId] {
        match self {
            StepKind::Seq(c) | StepKind::All(c) | StepKind::AnyOf(c) => c,
            _ => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Move { .. } => "move",
            StepKind::Wait { .. } => "wait",
            StepKind::Callback(_) => "callback",
            StepKind::Seq(_) => "seq",
            StepKind::All(_) => "all",
            StepKind::AnyOf(_) => "any-of",
        }
    }
}

/// One step plus the timing resolved by the last dry run.
#[derive(Clone, Debug)]
pub struct StepNode<E> {
    pub kind:       StepKind<E>,
    /// Steps that must be ready before this one starts.
    pub preds:      Vec<StepId>,
    pub start:      f64,
    pub finish:     f64,
    /// Earliest start of whatever follows this step.
    pub next_ready: f64,
    pub motions:    Vec<Motion>,
    pub executed:   bool,
    pub committed:  bool,
}

impl<E> StepNode<E> {
    pub(crate) fn new(kind: StepKind<E>) -> Self {
        Self {
            kind,
            preds:      Vec::new(),
            start:      0.0,
            finish:     0.0,
            next_ready: 0.0,
            motions:    Vec::new(),
            executed:   false,
            committed:  false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.executed = false;
        self.committed = false;
        self.motions.clear();
    }
}
