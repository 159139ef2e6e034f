use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;
use crate::shapes::{BLOCKS_PER_TETRAD, Point, ROTATIONS, ShapeKind, ShapeTemplate, template};

pub type Blocks = [Point; BLOCKS_PER_TETRAD];

/// A live piece. Mutators do no legality checks; the engine validates
/// against the playfield first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tetrad {
    kind: ShapeKind,
    rotation: u8,
    anchor: Point,
    color_ix: u8,
}

impl Tetrad {
    pub fn new(kind: ShapeKind, rotation: u8, color_ix: u8) -> Self {
        assert!(color_ix > 0, "color index 0 is reserved for empty cells");
        Self {
            kind,
            rotation: rotation % ROTATIONS,
            anchor: Point::ZERO,
            color_ix,
        }
    }

    /// Uniform kind, then uniform color in `1..=color_count`.
    pub fn random<R: RandomSource>(rng: &mut R, color_count: u8) -> Self {
        let kind_ix = rng.next_int_below(ShapeKind::COUNT as u32) as usize;
        let kind = ShapeKind::ALL[kind_ix];
        let color_ix = 1 + rng.next_int_below(color_count as u32) as u8;
        Self::new(kind, 0, color_ix)
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn color_ix(&self) -> u8 {
        self.color_ix
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn set_anchor(&mut self, col: i32, row: i32) {
        self.anchor = Point::new(col, row);
    }

    pub fn template(&self) -> &'static ShapeTemplate {
        template(self.kind, self.rotation)
    }

    fn rotated(&self, delta: i32) -> u8 {
        (self.rotation as i32 + delta).rem_euclid(ROTATIONS as i32) as u8
    }

    /// Absolute block positions under `rotation + rotation_delta`, row-major.
    pub fn block_positions(&self, rotation_delta: i32) -> Blocks {
        let t = template(self.kind, self.rotated(rotation_delta));
        t.offsets.map(|p| p + self.anchor)
    }

    pub fn blocks(&self) -> Blocks {
        self.block_positions(0)
    }

    pub fn shift(&mut self, dir: i32) {
        self.anchor.x += dir;
    }

    pub fn rotate(&mut self, dir: i32) {
        self.rotation = self.rotated(dir);
    }

    pub fn drop_one_row(&mut self) {
        self.anchor.y += 1;
    }

    pub fn top_indent(&self) -> i32 {
        self.template().top_indent()
    }
}
