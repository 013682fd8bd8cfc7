//! Sokoban puzzle engine: level loading, box pushing, undo and level
//! progression. Start with [`Game`], or drive a [`Board`] directly.

pub mod board;
pub mod game;
pub mod history;
pub mod levels;
pub mod movement;

pub use board::{Board, BoardError, Cell, CellView, Piece, PieceId, PieceKind, Position};
pub use game::{Command, Game, GameConfig, GameError, MAX_LEVEL, Outcome};
pub use history::{UndoLog, UndoMode};
pub use levels::{
    DEFAULT_LEVEL_DIR, LevelCollection, LevelDirectory, LevelError, LevelSource, level_file_name,
    load_level, parse_level,
};
pub use movement::{ALL_DIRECTIONS, Direction, Displacement, Step};
