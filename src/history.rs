use std::fmt;

use log::debug;

use crate::board::{Board, BoardError};
use crate::movement::Step;

/// How [`UndoLog::undo_last`] reverses a recorded move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoMode {
    /// Walk the player one step in the opposite direction. A box pushed by
    /// the undone move is left where it is.
    #[default]
    Replay,
    /// Put every displaced piece back exactly where it was.
    Restore,
}

impl fmt::Display for UndoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoMode::Replay => write!(f, "replay"),
            UndoMode::Restore => write!(f, "restore"),
        }
    }
}

/// Ordered history of the player move commands on the current level.
///
/// Every direction command is recorded, including ones that moved nothing,
/// so each undo always has an entry to consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoLog {
    steps: Vec<Step>,
}

impl UndoLog {
    pub fn new() -> Self {
        UndoLog { steps: Vec::new() }
    }

    pub fn record(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Pop the newest entry and apply its inverse to `board`.
    ///
    /// The entry is discarded even when the inverse turns out to be blocked.
    /// Returns the popped entry, or `None` if the log was empty.
    pub fn undo_last(
        &mut self,
        board: &mut Board,
        mode: UndoMode,
    ) -> Result<Option<Step>, BoardError> {
        let Some(step) = self.steps.pop() else {
            return Ok(None);
        };

        match mode {
            UndoMode::Replay => {
                let inverse = board.move_player(step.direction().opposite())?;
                debug!(
                    "undo {} by moving {} (moved: {})",
                    step.direction(),
                    inverse.direction(),
                    inverse.moved()
                );
            }
            UndoMode::Restore => {
                board.revert_step(&step)?;
                debug!(
                    "undo {} by restoring {} displacements",
                    step.direction(),
                    step.displacements().len()
                );
            }
        }

        Ok(Some(step))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The recorded directions as a string of `N`, `S`, `E`, `W` letters.
    pub fn moves(&self) -> String {
        self.steps.iter().map(|step| step.direction().letter()).collect()
    }

    /// Number of recorded commands that pushed a box.
    pub fn pushes(&self) -> usize {
        self.steps.iter().filter(|step| step.is_push()).count()
    }
}
