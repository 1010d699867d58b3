use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

const SOFT_DROP_POINTS: u32 = 1;
const LINE_CLEAR_BASE_POINTS: u32 = 100;

/// Opaque 24-bit RGB color token stored in settled cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0 & 0x00FF_FFFF)
    }
}

pub type Cell = Option<Color>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape has no rows or no columns")]
    Empty,
    #[error("shape row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("shape has no occupied cells")]
    Unoccupied,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("piece does not fit at ({x}, {y})")]
    Blocked { x: i32, y: i32 },
    #[error("piece cell ({x}, {y}) lies above the board and cannot be settled")]
    AboveBoard { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },
    #[error("board row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Rectangular occupancy matrix, indexed `rows[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<bool>>", into = "Vec<Vec<bool>>")]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    pub fn new(rows: Vec<Vec<bool>>) -> Result<Self, ShapeError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(ShapeError::Empty);
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(ShapeError::Ragged {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }
        if !rows.iter().flatten().any(|&filled| filled) {
            return Err(ShapeError::Unoccupied);
        }
        Ok(Self { rows })
    }

    /// Builds a shape from `0`/`1` rows, the way piece tables are usually written.
    pub fn from_bits(rows: &[&[u8]]) -> Result<Self, ShapeError> {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|&bit| bit != 0).collect())
                .collect(),
        )
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// Offsets `(dx, dy)` of every occupied cell, row by row.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(x, _)| (x as i32, y as i32))
        })
    }

    /// Clockwise quarter turn: `rotated[x][y] = rows[h - 1 - y][x]`.
    pub fn rotated(&self) -> Shape {
        let h = self.height();
        let w = self.width();
        let rows = (0..w)
            .map(|x| (0..h).map(|y| self.rows[h - 1 - y][x]).collect())
            .collect();
        Shape { rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    pub fn color(self) -> Color {
        match self {
            PieceKind::I => Color(0x00FFFF),
            PieceKind::O => Color(0xFFFF00),
            PieceKind::T => Color(0x800080),
            PieceKind::L => Color(0xFFA500),
            PieceKind::J => Color(0x0000FF),
            PieceKind::S => Color(0x00FF00),
            PieceKind::Z => Color(0xFF0000),
        }
    }

    pub fn shape(self) -> Shape {
        let bits: &[&[u8]] = match self {
            PieceKind::I => &[&[1, 1, 1, 1]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::T => &[&[0, 1, 0], &[1, 1, 1]],
            PieceKind::L => &[&[1, 0, 0], &[1, 1, 1]],
            PieceKind::J => &[&[0, 0, 1], &[1, 1, 1]],
            PieceKind::S => &[&[1, 1, 0], &[0, 1, 1]],
            PieceKind::Z => &[&[0, 1, 1], &[1, 1, 0]],
        };
        Shape {
            rows: bits
                .iter()
                .map(|row| row.iter().map(|&bit| bit != 0).collect())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub shape: Shape,
    pub color: Color,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn new(shape: Shape, color: Color, x: i32, y: i32) -> Self {
        Self { shape, color, x, y }
    }

    /// A piece of `kind`, horizontally centered on a board `board_width` wide, at row 0.
    pub fn spawn(kind: PieceKind, board_width: usize) -> Self {
        let shape = kind.shape();
        let x = (board_width / 2) as i32 - (shape.width() / 2) as i32;
        Self::new(shape, kind.color(), x, 0)
    }

    pub fn rotated_shape(&self) -> Shape {
        self.shape.rotated()
    }

    /// Board coordinates covered by this piece's shape when anchored at `(x, y)`.
    pub fn cells_at<'a>(shape: &'a Shape, x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> + 'a {
        shape.occupied().map(move |(dx, dy)| (x + dx, y + dy))
    }

    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        Self::cells_at(&self.shape, self.x, self.y)
    }
}

/// Fixed-size grid of settled cells. Dimensions never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardData")]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![None; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells.get(y).and_then(|row| row.get(x)).copied().flatten()
    }

    pub fn set_cell(&mut self, x: usize, y: usize, value: Cell) {
        if y < self.height && x < self.width {
            self.cells[y][x] = value;
        }
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.cells
            .get(y)
            .is_some_and(|row| row.iter().all(Option::is_some))
    }

    /// True iff every occupied cell of `shape` anchored at `(x, y)` is inside the
    /// side and bottom walls and, when on a visible row, not on a settled cell.
    /// Cells above row 0 are allowed so pieces may sit partly off the top.
    pub fn fits(&self, shape: &Shape, x: i32, y: i32) -> bool {
        Piece::cells_at(shape, x, y).all(|(bx, by)| {
            if bx < 0 || bx >= self.width as i32 || by >= self.height as i32 {
                return false;
            }
            by < 0 || self.cells[by as usize][bx as usize].is_none()
        })
    }

    /// Settles `piece` into the grid after re-checking its placement.
    ///
    /// Returns the number of cells written. Nothing is written on error.
    pub fn commit(&mut self, piece: &Piece) -> Result<usize, PlacementError> {
        if !self.fits(&piece.shape, piece.x, piece.y) {
            return Err(PlacementError::Blocked {
                x: piece.x,
                y: piece.y,
            });
        }
        if let Some((x, y)) = piece.cells().find(|&(_, y)| y < 0) {
            return Err(PlacementError::AboveBoard { x, y });
        }

        let mut written = 0;
        for (x, y) in piece.cells() {
            self.cells[y as usize][x as usize] = Some(piece.color);
            written += 1;
        }
        Ok(written)
    }

    /// Removes every complete row, bottom to top, inserting an empty row at
    /// the top for each one. Returns how many rows were removed.
    pub fn clear_completed_rows(&mut self) -> usize {
        if self.width == 0 {
            return 0;
        }
        let mut cleared = 0;
        let mut y = self.height;
        while y > 0 {
            let row = y - 1;
            if self.is_row_complete(row) {
                self.cells.remove(row);
                self.cells.insert(0, vec![None; self.width]);
                cleared += 1;
                // The row above has moved into `row`; look at it again.
                continue;
            }
            y -= 1;
        }
        cleared
    }
}

#[derive(Deserialize)]
struct BoardData {
    width: usize,
    height: usize,
    cells: Vec<Vec<Cell>>,
}

impl TryFrom<BoardData> for Board {
    type Error = BoardError;

    fn try_from(data: BoardData) -> Result<Self, Self::Error> {
        if data.cells.len() != data.height {
            return Err(BoardError::RowCount {
                expected: data.height,
                found: data.cells.len(),
            });
        }
        if let Some((row, cells)) = data
            .cells
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != data.width)
        {
            return Err(BoardError::RowWidth {
                row,
                expected: data.width,
                found: cells.len(),
            });
        }
        Ok(Self {
            width: data.width,
            height: data.height,
            cells: data.cells,
        })
    }
}

impl TryFrom<Vec<Vec<bool>>> for Shape {
    type Error = ShapeError;

    fn try_from(rows: Vec<Vec<bool>>) -> Result<Self, Self::Error> {
        Shape::new(rows)
    }
}

impl From<Shape> for Vec<Vec<bool>> {
    fn from(shape: Shape) -> Self {
        shape.rows
    }
}

pub fn line_clear_points(lines: u32) -> u32 {
    LINE_CLEAR_BASE_POINTS
        .saturating_mul(lines)
        .saturating_mul(lines)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Spawned,
    Moved,
    Locked { lines_cleared: usize },
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TetrisSnapshot {
    pub width: usize,
    pub height: usize,
    pub board: Vec<Vec<Cell>>,
    pub active_piece: Option<Piece>,
    pub lines_cleared: u32,
    pub score: u32,
    pub game_over: bool,
}

/// Placement engine: one board, at most one active piece, and the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TetrisCore {
    board: Board,
    active_piece: Option<Piece>,
    rng: Rng,
    lines_cleared: u32,
    score: u32,
    game_over: bool,
}

impl TetrisCore {
    pub fn new(seed: u64) -> Self {
        Self::with_size(BOARD_WIDTH, BOARD_HEIGHT, seed)
    }

    pub fn with_size(width: usize, height: usize, seed: u64) -> Self {
        Self {
            board: Board::new(width, height),
            active_piece: None,
            rng: Rng::new(seed),
            lines_cleared: 0,
            score: 0,
            game_over: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.active_piece.as_ref()
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn set_cell(&mut self, x: usize, y: usize, value: Cell) {
        self.board.set_cell(x, y, value);
    }

    /// Replaces the falling piece without validating its position.
    pub fn set_active_piece(&mut self, piece: Option<Piece>) {
        self.active_piece = piece;
    }

    pub fn is_valid_position(
        &self,
        piece: &Piece,
        x: i32,
        y: i32,
        shape_override: Option<&Shape>,
    ) -> bool {
        self.board.fits(shape_override.unwrap_or(&piece.shape), x, y)
    }

    pub fn rotate(&self, piece: &Piece) -> Shape {
        piece.rotated_shape()
    }

    pub fn commit(&mut self, piece: &Piece) -> Result<usize, PlacementError> {
        self.board.commit(piece)
    }

    /// Clears complete rows and credits lines and score for them.
    pub fn clear_completed_rows(&mut self) -> usize {
        let cleared = self.board.clear_completed_rows();
        if cleared > 0 {
            let n = cleared as u32;
            self.lines_cleared = self.lines_cleared.saturating_add(n);
            self.score = self.score.saturating_add(line_clear_points(n));
        }
        cleared
    }

    pub fn draw_kind(&mut self) -> PieceKind {
        let idx = self.rng.below(PieceKind::ALL.len());
        PieceKind::ALL[idx]
    }

    /// Spawns a random piece at the top. Returns `false` and ends the game when
    /// the spawn position is already blocked.
    pub fn spawn_piece(&mut self) -> bool {
        let kind = self.draw_kind();
        self.spawn_kind(kind)
    }

    pub fn spawn_kind(&mut self, kind: PieceKind) -> bool {
        let piece = Piece::spawn(kind, self.board.width());
        if !self.board.fits(&piece.shape, piece.x, piece.y) {
            tracing::info!(score = self.score, lines = self.lines_cleared, "game over");
            self.active_piece = None;
            self.game_over = true;
            return false;
        }
        self.active_piece = Some(piece);
        true
    }

    /// One gravity step.
    pub fn tick(&mut self) -> TickOutcome {
        if self.game_over {
            return TickOutcome::GameOver;
        }
        let Some(piece) = self.active_piece.take() else {
            return if self.spawn_piece() {
                TickOutcome::Spawned
            } else {
                TickOutcome::GameOver
            };
        };

        if self.board.fits(&piece.shape, piece.x, piece.y + 1) {
            self.active_piece = Some(Piece {
                y: piece.y + 1,
                ..piece
            });
            return TickOutcome::Moved;
        }

        if let Err(err) = self.board.commit(&piece) {
            // Only reachable when a piece rests partly above row 0.
            tracing::info!(%err, "piece locked out above the board");
            self.game_over = true;
            return TickOutcome::GameOver;
        }
        let lines_cleared = self.clear_completed_rows();
        TickOutcome::Locked { lines_cleared }
    }

    fn shift_active(&mut self, dx: i32, dy: i32) -> bool {
        let Some(piece) = self.active_piece.as_mut() else {
            return false;
        };
        if !self.board.fits(&piece.shape, piece.x + dx, piece.y + dy) {
            return false;
        }
        piece.x += dx;
        piece.y += dy;
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.shift_active(-1, 0)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift_active(1, 0)
    }

    /// Player-initiated one-row drop; worth a point when it succeeds.
    pub fn soft_drop(&mut self) -> bool {
        let moved = self.shift_active(0, 1);
        if moved {
            self.score = self.score.saturating_add(SOFT_DROP_POINTS);
        }
        moved
    }

    pub fn rotate_active(&mut self) -> bool {
        let Some(piece) = self.active_piece.as_mut() else {
            return false;
        };
        let rotated = piece.rotated_shape();
        if !self.board.fits(&rotated, piece.x, piece.y) {
            return false;
        }
        piece.shape = rotated;
        true
    }

    /// The settled board with the active piece painted over it.
    pub fn board_with_active_piece(&self) -> Vec<Vec<Cell>> {
        let mut rows = self.board.rows().to_vec();
        if let Some(piece) = &self.active_piece {
            for (x, y) in piece.cells() {
                let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                    continue;
                };
                if y < rows.len() && x < self.board.width() {
                    rows[y][x] = Some(piece.color);
                }
            }
        }
        rows
    }

    pub fn snapshot(&self) -> TetrisSnapshot {
        TetrisSnapshot {
            width: self.board.width(),
            height: self.board.height(),
            board: self.board.rows().to_vec(),
            active_piece: self.active_piece.clone(),
            lines_cleared: self.lines_cleared,
            score: self.score,
            game_over: self.game_over,
        }
    }
}

/// Xorshift64* piece randomizer; its state travels with saved games.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Rng {
    state: u64,
}

impl Rng {
    // Xorshift never leaves the all-zero state.
    const ZERO_SEED_REPLACEMENT: u64 = 0x9E37_79B9_7F4A_7C15;

    fn new(seed: u64) -> Self {
        let state = match seed {
            0 => Self::ZERO_SEED_REPLACEMENT,
            seed => seed,
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform-ish index in `0..bound`; `bound` must be non-zero.
    fn below(&mut self, bound: usize) -> usize {
        ((self.next_u64() >> 32) % bound as u64) as usize
    }
}
