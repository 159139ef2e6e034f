use serde::{Deserialize, Serialize};

use crate::shapes::Point;

pub const EMPTY: u8 = 0;

/// `rows x cols` grid of color indices, row 0 at the top.
///
/// `empty_row_start` is the lowest row index such that it and every row above
/// it are empty. It is `rows - 1` on an empty field and `-1` when row 0 holds
/// a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playfield {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    empty_row_start: i32,
}

impl Playfield {
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "playfield must be at least 1x1");
        Self {
            rows,
            cols,
            cells: vec![EMPTY; rows * cols],
            empty_row_start: rows as i32 - 1,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major color indices.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    pub fn empty_row_start(&self) -> i32 {
        self.empty_row_start
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY).count()
    }

    pub fn reset(&mut self) {
        self.cells.fill(EMPTY);
        self.empty_row_start = self.rows as i32 - 1;
    }

    fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.cols && (p.y as usize) < self.rows
    }

    fn index(&self, p: Point) -> usize {
        p.y as usize * self.cols + p.x as usize
    }

    fn is_free(&self, p: Point) -> bool {
        self.contains(p) && self.cells[self.index(p)] == EMPTY
    }

    pub fn is_valid_and_empty(&self, points: &[Point]) -> bool {
        points.iter().all(|&p| self.is_free(p))
    }

    pub fn is_valid_shift(&self, points: &[Point], dir: i32) -> bool {
        points.iter().all(|&p| self.is_free(Point::new(p.x + dir, p.y)))
    }

    pub fn is_valid_move_down(&self, points: &[Point]) -> bool {
        points.iter().all(|&p| self.is_free(Point::new(p.x, p.y + 1)))
    }

    fn fall_distance(&self, p: Point) -> i32 {
        let floor = self.rows as i32 - 1;
        let mut y = p.y + 1;
        while y <= floor {
            if y >= 0 && !self.is_free(Point::new(p.x, y)) {
                return y - 1 - p.y;
            }
            y += 1;
        }
        floor - p.y
    }

    /// Where `points` would come to rest if dropped straight down, or `None`
    /// when they already rest on the floor or the stack.
    pub fn destination<const N: usize>(&self, points: &[Point; N]) -> Option<[Point; N]> {
        let delta = points.iter().map(|&p| self.fall_distance(p)).min()?;
        if delta <= 0 {
            return None;
        }
        Some(points.map(|p| Point::new(p.x, p.y + delta)))
    }

    /// Writes `color_ix` into every listed cell. Out-of-range points are a
    /// caller bug.
    pub fn place(&mut self, points: &[Point], color_ix: u8) {
        for &p in points {
            assert!(self.contains(p), "place outside playfield: {p:?}");
            debug_assert_eq!(self.cells[self.index(p)], EMPTY, "place onto occupied cell {p:?}");
            let ix = self.index(p);
            self.cells[ix] = color_ix;
            self.empty_row_start = self.empty_row_start.min(p.y - 1);
        }
    }

    pub fn is_full_row(&self, row: usize) -> bool {
        self.cells[row * self.cols..(row + 1) * self.cols]
            .iter()
            .all(|&c| c != EMPTY)
    }

    fn delete_row(&mut self, row: usize) {
        let start = row * self.cols;
        self.cells.drain(start..start + self.cols);
        self.cells
            .splice(0..0, std::iter::repeat_n(EMPTY, self.cols));
    }

    /// Removes every full row, compacting the rows above downwards. Returns
    /// the number of rows removed.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut removed = 0;
        let mut row = self.rows as i32 - 1;
        while row > self.empty_row_start + removed as i32 {
            if self.is_full_row(row as usize) {
                self.delete_row(row as usize);
                removed += 1;
                // The former row above now sits at `row`; look at it again.
            } else {
                row -= 1;
            }
        }
        self.empty_row_start += removed as i32;
        removed
    }

    /// Lifts a piece that failed to spawn by the fewest rows `k >= 1` that let
    /// its bottom row sit on empty cells, and returns the blocks that fit.
    ///
    /// Expects `points` in row-major order. Used only to show the piece that
    /// ended the game.
    pub fn project_feasible_blocks(&self, points: &[Point]) -> Option<Vec<Point>> {
        debug_assert!(
            points.windows(2).all(|w| (w[0].y, w[0].x) <= (w[1].y, w[1].x)),
            "blocks must be in row-major order"
        );
        let bottom = points.iter().map(|p| p.y).max()?;
        let bottom_row: Vec<Point> = points.iter().copied().filter(|p| p.y == bottom).collect();

        let mut lift = 1;
        while bottom - lift >= 0 {
            let fits = bottom_row
                .iter()
                .all(|p| self.is_free(Point::new(p.x, p.y - lift)));
            if fits {
                let mut feasible: Vec<Point> = points
                    .iter()
                    .map(|p| Point::new(p.x, p.y - lift))
                    .filter(|&p| self.is_free(p))
                    .collect();
                feasible.sort_by_key(|p| (p.y, p.x));
                return Some(feasible);
            }
            lift += 1;
        }
        None
    }

    /// Direct cell write for scenario setup. Keeps `empty_row_start` exact.
    pub fn set_cell(&mut self, row: usize, col: usize, color_ix: u8) {
        assert!(row < self.rows && col < self.cols, "set_cell outside playfield");
        self.cells[row * self.cols + col] = color_ix;
        self.recompute_empty_row_start();
    }

    fn recompute_empty_row_start(&mut self) {
        let first_occupied = (0..self.rows).find(|&r| {
            self.cells[r * self.cols..(r + 1) * self.cols]
                .iter()
                .any(|&c| c != EMPTY)
        });
        self.empty_row_start = match first_occupied {
            Some(r) => r as i32 - 1,
            None => self.rows as i32 - 1,
        };
    }
}
