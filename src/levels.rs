use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::board::{
    BOX, BOX_ON_GOAL, Board, BoardError, Cell, GOAL, OPEN, PLAYER, PLAYER_ON_GOAL, PieceKind,
    Position, WALL,
};

/// Directory searched for `level.NN.txt` files when none is configured.
pub const DEFAULT_LEVEL_DIR: &str = "levels";

/// Error type for level loading and parsing.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {index} not found")]
    NotFound { index: usize },
    #[error("cannot read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no player found on board")]
    MissingPlayer,
    #[error("multiple players found at {first} and {second}")]
    MultiplePlayers { first: Position, second: Position },
    #[error("board of {width}x{height} cells is too large")]
    TooLarge { width: usize, height: usize },
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Somewhere level descriptions can be fetched from by index.
pub trait LevelSource {
    /// The raw text of level `index`, or [`LevelError::NotFound`].
    fn level_text(&self, index: usize) -> Result<String, LevelError>;
}

/// File name of level `index`: `level.03.txt` for level 3.
pub fn level_file_name(index: usize) -> String {
    format!("level.{:02}.txt", index)
}

/// Parse a board from level text.
///
/// Characters:
/// - `#` = Wall
/// - ` `, `-`, `_` = Floor (empty space)
/// - `.` = Goal
/// - `$` = Box
/// - `@` = Player
/// - `*` = Box on goal
/// - `+` = Player on goal
///
/// Any other character is read as floor too. Rows shorter than the widest
/// one are padded with floor.
pub fn parse_level(text: &str) -> Result<Board, LevelError> {
    let lines: Vec<&str> = text.lines().collect();
    let height = lines.len();
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let (Ok(width16), Ok(height16)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(LevelError::TooLarge { width, height });
    };

    let mut cells = Vec::with_capacity(width * height);
    let mut player: Option<Position> = None;
    let mut boxes = Vec::new();

    for (y, line) in lines.iter().enumerate() {
        let mut chars = line.chars();
        for x in 0..width {
            let ch = chars.next().unwrap_or(OPEN);
            let pos = Position::new(x as u16, y as u16);
            let cell = match ch {
                WALL => Cell::wall(),
                OPEN | '-' | '_' => Cell::open(false),
                GOAL => Cell::open(true),
                BOX | BOX_ON_GOAL => {
                    boxes.push(pos);
                    Cell::open(ch == BOX_ON_GOAL)
                }
                PLAYER | PLAYER_ON_GOAL => {
                    if let Some(first) = player {
                        return Err(LevelError::MultiplePlayers { first, second: pos });
                    }
                    player = Some(pos);
                    Cell::open(ch == PLAYER_ON_GOAL)
                }
                _ => {
                    debug!("reading '{}' at {} as floor", ch.escape_debug(), pos);
                    Cell::open(false)
                }
            };
            cells.push(cell);
        }
    }

    let player = player.ok_or(LevelError::MissingPlayer)?;

    let mut board = Board::from_cells(width16, height16, cells);
    board.spawn(PieceKind::Player, player)?;
    for pos in boxes {
        board.spawn(PieceKind::Box, pos)?;
    }
    Ok(board)
}

/// Fetch level `index` from `source` and build a fresh board for it.
pub fn load_level(source: &dyn LevelSource, index: usize) -> Result<Board, LevelError> {
    let text = source.level_text(index)?;
    let board = parse_level(&text)?;
    info!(
        "loaded level {}: {}x{} with {} boxes",
        index,
        board.width(),
        board.height(),
        board.boxes().len()
    );
    Ok(board)
}

/// A directory holding one `level.NN.txt` file per level.
#[derive(Debug, Clone)]
pub struct LevelDirectory {
    root: PathBuf,
}

impl LevelDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LevelDirectory { root: root.into() }
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.root.join(level_file_name(index))
    }
}

impl LevelSource for LevelDirectory {
    fn level_text(&self, index: usize) -> Result<String, LevelError> {
        let path = self.path_for(index);
        debug!("reading {}", path.display());
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(LevelError::NotFound { index })
            }
            Err(source) => Err(LevelError::Io { path, source }),
        }
    }
}

/// A collection of levels in XSB format, all held in memory.
///
/// Levels are separated by empty lines or by lines starting with `;`
/// (titles and comments). Level `0` is the first one in the text.
#[derive(Debug, Clone, Default)]
pub struct LevelCollection {
    levels: Vec<String>,
}

impl LevelCollection {
    pub fn from_text(contents: &str) -> Self {
        let mut levels = Vec::new();
        let mut current_level = String::new();

        for line in contents.lines() {
            // Comment lines and blank lines both end the level being read
            if line.trim_start().starts_with(';') || line.is_empty() {
                if !current_level.is_empty() {
                    levels.push(std::mem::take(&mut current_level));
                }
                continue;
            }

            current_level.push_str(line);
            current_level.push('\n');
        }

        // Don't forget the last level if file doesn't end with empty line
        if !current_level.is_empty() {
            levels.push(current_level);
        }

        LevelCollection { levels }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&contents))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl LevelSource for LevelCollection {
    fn level_text(&self, index: usize) -> Result<String, LevelError> {
        self.levels
            .get(index)
            .cloned()
            .ok_or(LevelError::NotFound { index })
    }
}
