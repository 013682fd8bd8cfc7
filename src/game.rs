use log::{debug, info, warn};
use thiserror::Error;

use crate::board::{Board, BoardError};
use crate::history::{UndoLog, UndoMode};
use crate::levels::{LevelError, LevelSource, load_level};
use crate::movement::Direction;

/// Highest level index reachable by navigation or completion.
pub const MAX_LEVEL: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub start_level: usize,
    pub max_level: usize,
    pub undo_mode: UndoMode,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            start_level: 0,
            max_level: MAX_LEVEL,
            undo_mode: UndoMode::default(),
        }
    }
}

/// Logical commands accepted by a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Undo,
    NextLevel,
    PreviousLevel,
    /// Reload the current level from its source, dropping the history.
    Restart,
}

/// What a command led to, beyond the board changes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Still on the same level.
    Playing,
    /// Navigated to (or restarted) `level`.
    LevelChanged { level: usize },
    /// `level` was completed and `next` has been loaded.
    Completed { level: usize, next: usize },
    /// The last level was completed; there is nothing left to load.
    Finished { level: usize },
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// A play session: the current level, its board and its undo history.
///
/// One command is processed at a time. After every command the board is
/// checked for completion, and a completed level is replaced by the next one.
/// Boards are only ever replaced as a whole: when a level fails to load, the
/// session stays on the level, board and history it had.
pub struct Game {
    source: Box<dyn LevelSource>,
    config: GameConfig,
    level: usize,
    board: Board,
    history: UndoLog,
}

impl Game {
    pub fn new(source: Box<dyn LevelSource>, config: GameConfig) -> Result<Self, LevelError> {
        let level = config.start_level.min(config.max_level);
        let board = load_level(source.as_ref(), level)?;
        Ok(Game {
            source,
            config,
            level,
            board,
            history: UndoLog::new(),
        })
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &UndoLog {
        &self.history
    }

    pub fn undo_mode(&self) -> UndoMode {
        self.config.undo_mode
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome, GameError> {
        let mut outcome = Outcome::Playing;

        match command {
            Command::Move(direction) => {
                let step = self.board.move_player(direction)?;
                debug!(
                    "move {}: {} piece(s) displaced, player at {:?}",
                    direction,
                    step.displacements().len(),
                    self.board.player_position()
                );
                self.history.record(step);
            }
            Command::Undo => {
                if self
                    .history
                    .undo_last(&mut self.board, self.config.undo_mode)?
                    .is_none()
                {
                    debug!("nothing to undo");
                }
            }
            Command::NextLevel => {
                if self.level < self.config.max_level {
                    self.switch_to(self.level + 1)?;
                    outcome = Outcome::LevelChanged { level: self.level };
                } else {
                    debug!("already at the last level {}", self.level);
                }
            }
            Command::PreviousLevel => {
                if self.level > 0 {
                    self.switch_to(self.level - 1)?;
                    outcome = Outcome::LevelChanged { level: self.level };
                } else {
                    debug!("already at the first level");
                }
            }
            Command::Restart => {
                self.switch_to(self.level)?;
                outcome = Outcome::LevelChanged { level: self.level };
            }
        }

        debug_assert!(self.board.links_consistent());

        if self.board.is_complete() {
            let level = self.level;
            if level >= self.config.max_level {
                info!("completed final level {}", level);
                return Ok(Outcome::Finished { level });
            }
            info!(
                "completed level {} in {} moves ({} pushes): {}",
                level,
                self.history.len(),
                self.history.pushes(),
                self.history.moves()
            );
            self.switch_to(level + 1)?;
            return Ok(Outcome::Completed {
                level,
                next: level + 1,
            });
        }

        Ok(outcome)
    }

    /// Load `level` and install it with an empty history.
    fn switch_to(&mut self, level: usize) -> Result<(), LevelError> {
        let board = load_level(self.source.as_ref(), level).inspect_err(|err| {
            warn!("cannot switch to level {}: {}", level, err);
        })?;
        self.level = level;
        self.board = board;
        // Undo history never carries over between boards
        self.history = UndoLog::new();
        Ok(())
    }
}
