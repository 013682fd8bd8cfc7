use std::fmt;

use thiserror::Error;

use crate::movement::Direction;

pub const OPEN: char = ' ';
pub const WALL: char = '#';
pub const PLAYER: char = '@';
pub const PLAYER_ON_GOAL: char = '+';
pub const BOX: char = '$';
pub const GOAL: char = '.';
pub const BOX_ON_GOAL: char = '*';

/// Grid coordinates of a cell. `x` grows eastwards, `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub const fn new(x: u16, y: u16) -> Self {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Handle of a piece in the board's piece arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(usize);

impl PieceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Player,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    cell: Option<Position>,
}

impl Piece {
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// The cell this piece stands on, `None` while it is detached.
    pub fn cell(&self) -> Option<Position> {
        self.cell
    }
}

/// A single grid square. Walls never hold an occupant and are never goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    passable: bool,
    goal: bool,
    occupant: Option<PieceId>,
}

impl Cell {
    pub fn wall() -> Self {
        Cell {
            passable: false,
            goal: false,
            occupant: None,
        }
    }

    pub fn open(goal: bool) -> Self {
        Cell {
            passable: true,
            goal,
            occupant: None,
        }
    }

    pub fn is_passable(&self) -> bool {
        self.passable
    }

    pub fn is_wall(&self) -> bool {
        !self.passable
    }

    pub fn is_goal(&self) -> bool {
        self.goal
    }

    pub fn occupant(&self) -> Option<PieceId> {
        self.occupant
    }

    /// A piece could be moved onto this cell.
    pub fn is_free(&self) -> bool {
        self.passable && self.occupant.is_none()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("cannot place piece #{piece} at {position}: cell is not free or piece is still placed")]
    InvalidPlacement { piece: usize, position: Position },
    #[error("piece #{piece} is not at {position}")]
    PieceMissing { piece: usize, position: Position },
}

/// Read-only classification of one cell, handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub position: Position,
    pub wall: bool,
    pub goal: bool,
    pub occupant: Option<PieceKind>,
}

impl CellView {
    /// The level-file symbol for this cell.
    pub fn symbol(&self) -> char {
        if self.wall {
            return WALL;
        }
        match (self.occupant, self.goal) {
            (Some(PieceKind::Player), true) => PLAYER_ON_GOAL,
            (Some(PieceKind::Player), false) => PLAYER,
            (Some(PieceKind::Box), true) => BOX_ON_GOAL,
            (Some(PieceKind::Box), false) => BOX,
            (None, true) => GOAL,
            (None, false) => OPEN,
        }
    }
}

/// The cell grid together with every piece standing on it.
///
/// Cells and pieces live in flat arenas and refer to each other through
/// [`Position`] and [`PieceId`] handles. The two-way link between a cell and
/// its occupant is only ever changed by [`Board::place_occupant`] and
/// [`Board::remove_occupant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    pieces: Vec<Piece>,
    player: Option<PieceId>,
    boxes: Vec<PieceId>,
}

impl Board {
    /// Build an empty board from a row-major cell grid.
    pub(crate) fn from_cells(width: u16, height: u16, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        Board {
            width,
            height,
            cells,
            pieces: Vec::new(),
            player: None,
            boxes: Vec::new(),
        }
    }

    /// Create a new piece and place it at `pos`.
    pub(crate) fn spawn(&mut self, kind: PieceKind, pos: Position) -> Result<PieceId, BoardError> {
        let id = PieceId(self.pieces.len());
        self.pieces.push(Piece { kind, cell: None });
        self.place_occupant(pos, id)?;
        match kind {
            PieceKind::Player => {
                debug_assert!(self.player.is_none(), "board already has a player");
                self.player = Some(id);
            }
            PieceKind::Box => self.boxes.push(id),
        }
        Ok(id)
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    fn position_of(&self, index: usize) -> Position {
        let width = self.width as usize;
        Position::new((index % width) as u16, (index / width) as u16)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn player(&self) -> Option<PieceId> {
        self.player
    }

    pub fn player_position(&self) -> Option<Position> {
        self.player.and_then(|id| self.piece(id).cell)
    }

    /// Box handles in the order they were read from the level.
    pub fn boxes(&self) -> &[PieceId] {
        &self.boxes
    }

    pub fn box_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.boxes.iter().filter_map(move |&id| self.piece(id).cell)
    }

    /// True iff `pos` is inside the grid, passable and unoccupied.
    pub fn is_free(&self, pos: Position) -> bool {
        self.cell(pos).is_some_and(Cell::is_free)
    }

    /// Detach the occupant of `pos`, clearing both sides of the link.
    pub fn remove_occupant(&mut self, pos: Position) -> Option<PieceId> {
        let index = self.index(pos)?;
        let piece = self.cells[index].occupant.take()?;
        self.pieces[piece.0].cell = None;
        Some(piece)
    }

    /// Put a detached piece on a free cell, linking both sides.
    ///
    /// Placing onto an occupied cell, a wall, or outside the grid would break
    /// the cell/piece link and is rejected. Debug builds panic instead.
    pub fn place_occupant(&mut self, pos: Position, piece: PieceId) -> Result<(), BoardError> {
        let detached = self.pieces.get(piece.0).is_some_and(|p| p.cell.is_none());
        let valid = detached && self.is_free(pos);
        debug_assert!(valid, "invalid placement of piece #{} at {}", piece.0, pos);
        let index = match self.index(pos) {
            Some(index) if valid => index,
            _ => {
                return Err(BoardError::InvalidPlacement {
                    piece: piece.0,
                    position: pos,
                });
            }
        };

        self.cells[index].occupant = Some(piece);
        self.pieces[piece.0].cell = Some(pos);
        Ok(())
    }

    /// The adjacent cell in `dir`, or `None` past the grid edge.
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let next = Position::new(pos.x.checked_add_signed(dx)?, pos.y.checked_add_signed(dy)?);
        self.contains(next).then_some(next)
    }

    /// Check if all boxes are on goals (win condition). Vacuously true
    /// without boxes.
    pub fn is_complete(&self) -> bool {
        self.boxes.iter().all(|&id| {
            self.piece(id)
                .cell
                .and_then(|pos| self.cell(pos))
                .is_some_and(Cell::is_goal)
        })
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellView> + '_ {
        self.cells.iter().enumerate().map(move |(index, cell)| CellView {
            position: self.position_of(index),
            wall: cell.is_wall(),
            goal: cell.goal,
            occupant: cell.occupant.map(|id| self.piece(id).kind()),
        })
    }

    /// Check that every occupant points back at its cell and every placed
    /// piece is the occupant of its cell.
    pub fn links_consistent(&self) -> bool {
        let cells_ok = self.cells.iter().enumerate().all(|(index, cell)| match cell.occupant {
            Some(id) => cell.passable && self.piece(id).cell == Some(self.position_of(index)),
            None => true,
        });
        let pieces_ok = self.pieces.iter().enumerate().all(|(i, piece)| match piece.cell {
            Some(pos) => self.cell(pos).and_then(Cell::occupant) == Some(PieceId(i)),
            None => true,
        });
        let walls_ok = self.cells.iter().all(|cell| cell.passable || !cell.goal);
        cells_ok && pieces_ok && walls_ok
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = String::with_capacity(self.width());
        for view in self.cells() {
            line.push(view.symbol());
            if view.position.x + 1 == self.width {
                // Rows are written without trailing spaces
                writeln!(f, "{}", line.trim_end())?;
                line.clear();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::parse_level;

    #[test]
    fn test_parse_dimensions() {
        let board = parse_level("####\n# .#\n#  ###\n#*@  #\n#  $ #\n#  ###\n####").unwrap();
        assert_eq!(board.width(), 6);
        assert_eq!(board.height(), 7);
        assert_eq!(board.player_position(), Some(Position::new(2, 3)));
        assert_eq!(board.boxes().len(), 2);
    }

    #[test]
    fn test_is_free() {
        let board = parse_level("#@$ .").unwrap();
        assert!(!board.is_free(Position::new(0, 0)));
        assert!(!board.is_free(Position::new(1, 0)));
        assert!(!board.is_free(Position::new(2, 0)));
        assert!(board.is_free(Position::new(3, 0)));
        assert!(board.is_free(Position::new(4, 0)));
        assert!(!board.is_free(Position::new(5, 0)));
    }

    #[test]
    fn test_remove_occupant() {
        let mut board = parse_level("@$ ").unwrap();
        let box_id = board.boxes()[0];

        assert_eq!(board.remove_occupant(Position::new(1, 0)), Some(box_id));
        assert_eq!(board.piece(box_id).cell(), None);
        assert_eq!(board.cell(Position::new(1, 0)).unwrap().occupant(), None);
        assert!(board.links_consistent());

        // Empty cell is a no-op
        assert_eq!(board.remove_occupant(Position::new(2, 0)), None);
        assert_eq!(board.remove_occupant(Position::new(9, 9)), None);
    }

    #[test]
    fn test_place_occupant() {
        let mut board = parse_level("@$ ").unwrap();
        let box_id = board.boxes()[0];

        board.remove_occupant(Position::new(1, 0));
        board.place_occupant(Position::new(2, 0), box_id).unwrap();
        assert_eq!(board.piece(box_id).cell(), Some(Position::new(2, 0)));
        assert_eq!(
            board.cell(Position::new(2, 0)).unwrap().occupant(),
            Some(box_id)
        );
        assert!(board.links_consistent());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "invalid placement"))]
    fn test_place_on_occupied_cell() {
        let mut board = parse_level("@$ ").unwrap();
        let box_id = board.boxes()[0];
        board.remove_occupant(Position::new(1, 0));

        let result = board.place_occupant(Position::new(0, 0), box_id);
        assert_eq!(
            result,
            Err(BoardError::InvalidPlacement {
                piece: box_id.index(),
                position: Position::new(0, 0),
            })
        );
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "invalid placement"))]
    fn test_place_on_wall() {
        let mut board = parse_level("@$#").unwrap();
        let box_id = board.boxes()[0];
        board.remove_occupant(Position::new(1, 0));

        assert!(board.place_occupant(Position::new(2, 0), box_id).is_err());
    }

    #[test]
    fn test_neighbor() {
        let board = parse_level("   \n @ \n   ").unwrap();
        let center = Position::new(1, 1);
        assert_eq!(board.neighbor(center, Direction::North), Some(Position::new(1, 0)));
        assert_eq!(board.neighbor(center, Direction::South), Some(Position::new(1, 2)));
        assert_eq!(board.neighbor(center, Direction::East), Some(Position::new(2, 1)));
        assert_eq!(board.neighbor(center, Direction::West), Some(Position::new(0, 1)));
    }

    #[test]
    fn test_neighbor_does_not_wrap() {
        let board = parse_level("@  \n   ").unwrap();
        assert_eq!(board.neighbor(Position::new(0, 0), Direction::West), None);
        assert_eq!(board.neighbor(Position::new(0, 0), Direction::North), None);
        assert_eq!(board.neighbor(Position::new(2, 1), Direction::East), None);
        assert_eq!(board.neighbor(Position::new(2, 1), Direction::South), None);
    }

    #[test]
    fn test_is_complete() {
        let solved = parse_level("####\n#*@#\n####").unwrap();
        assert!(solved.is_complete());

        let unsolved = parse_level("####\n#$.#\n# @#\n####").unwrap();
        assert!(!unsolved.is_complete());

        let partial = parse_level("#*$.@#").unwrap();
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_is_complete_without_boxes() {
        let board = parse_level("#@ .#").unwrap();
        assert!(board.boxes().is_empty());
        assert!(board.is_complete());
    }

    #[test]
    fn test_cells_row_major() {
        let board = parse_level("#@\n*.").unwrap();
        let views: Vec<CellView> = board.cells().collect();
        assert_eq!(views.len(), 4);
        assert_eq!(views[0].position, Position::new(0, 0));
        assert!(views[0].wall);
        assert_eq!(views[1].occupant, Some(PieceKind::Player));
        assert_eq!(views[2].position, Position::new(0, 1));
        assert_eq!(views[2].occupant, Some(PieceKind::Box));
        assert!(views[2].goal);
        assert!(views[3].goal);
        assert_eq!(views[3].occupant, None);
    }

    #[test]
    fn test_display() {
        let input = "####\n# .#\n#  ###\n#*@  #\n#  $ #\n#  ###\n####";
        let board = parse_level(input).unwrap();
        assert_eq!(board.to_string().trim_end(), input);
    }

    #[test]
    fn test_display_player_on_goal() {
        let board = parse_level("#+$.#").unwrap();
        assert_eq!(board.to_string(), "#+$.#\n");
    }
}
