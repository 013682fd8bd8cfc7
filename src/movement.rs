use std::fmt;

use arrayvec::ArrayVec;

use crate::board::{Board, BoardError, Cell, PieceId, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

impl Direction {
    pub fn delta(self) -> (i16, i16) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::East => 'E',
            Direction::West => 'W',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::North => write!(f, "North"),
            Direction::South => write!(f, "South"),
            Direction::East => write!(f, "East"),
            Direction::West => write!(f, "West"),
        }
    }
}

/// One piece moving one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Displacement {
    pub piece: PieceId,
    pub from: Position,
    pub to: Position,
}

/// A player move command and whatever it actually displaced: nothing, the
/// player alone, or a pushed box followed by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    direction: Direction,
    displacements: ArrayVec<Displacement, 2>,
}

impl Step {
    pub fn new(direction: Direction) -> Self {
        Step {
            direction,
            displacements: ArrayVec::new(),
        }
    }

    fn record(&mut self, displacement: Option<Displacement>) {
        if let Some(displacement) = displacement {
            self.displacements.push(displacement);
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn displacements(&self) -> &[Displacement] {
        &self.displacements
    }

    pub fn moved(&self) -> bool {
        !self.displacements.is_empty()
    }

    pub fn is_push(&self) -> bool {
        self.displacements.len() == 2
    }
}

impl Board {
    /// Move `piece` one cell in `direction` if the destination is free.
    ///
    /// Blocked moves, including ones off the grid edge, change nothing and
    /// return `Ok(None)`.
    pub fn attempt_move(
        &mut self,
        piece: PieceId,
        direction: Direction,
    ) -> Result<Option<Displacement>, BoardError> {
        let Some(from) = self.piece(piece).cell() else {
            return Ok(None);
        };
        let Some(to) = self.neighbor(from, direction) else {
            return Ok(None);
        };
        if !self.is_free(to) {
            return Ok(None);
        }

        self.remove_occupant(from);
        self.place_occupant(to, piece)?;
        Ok(Some(Displacement { piece, from, to }))
    }

    /// Move the player one cell, pushing a box standing in the way.
    ///
    /// A box in the destination is tried first; the player then tries to
    /// follow whether or not the box went anywhere. When the cell beyond the
    /// box is blocked the box stays put, so the player's own attempt fails as
    /// well and nothing moves. Walls and the grid edge go through the same
    /// failing attempt.
    pub fn move_player(&mut self, direction: Direction) -> Result<Step, BoardError> {
        let mut step = Step::new(direction);
        let Some(player) = self.player() else {
            return Ok(step);
        };
        let Some(from) = self.piece(player).cell() else {
            return Ok(step);
        };

        let pushed = self
            .neighbor(from, direction)
            .and_then(|to| self.cell(to))
            .filter(|cell| cell.is_passable())
            .and_then(Cell::occupant);
        if let Some(pushed) = pushed {
            step.record(self.attempt_move(pushed, direction)?);
        }
        step.record(self.attempt_move(player, direction)?);

        Ok(step)
    }

    /// Put every piece moved by `step` back where it came from, newest
    /// displacement first.
    pub fn revert_step(&mut self, step: &Step) -> Result<(), BoardError> {
        for displacement in step.displacements().iter().rev() {
            let Displacement { piece, from, to } = *displacement;
            if self.cell(to).and_then(Cell::occupant) != Some(piece) {
                return Err(BoardError::PieceMissing {
                    piece: piece.index(),
                    position: to,
                });
            }
            self.remove_occupant(to);
            self.place_occupant(from, piece)?;
        }
        Ok(())
    }
}
