use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Side length of the square frame every shape is authored in.
pub const FRAME_SIZE: usize = 4;
pub const BLOCKS_PER_TETRAD: usize = 4;
pub const ROTATIONS: u8 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::I,
        ShapeKind::O,
        ShapeKind::T,
        ShapeKind::L,
        ShapeKind::J,
        ShapeKind::S,
        ShapeKind::Z,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> usize {
        match self {
            ShapeKind::I => 0,
            ShapeKind::O => 1,
            ShapeKind::T => 2,
            ShapeKind::L => 3,
            ShapeKind::J => 4,
            ShapeKind::S => 5,
            ShapeKind::Z => 6,
        }
    }

    pub fn from_index(ix: usize) -> Option<ShapeKind> {
        Self::ALL.get(ix).copied()
    }

    pub fn template(self, rotation: u8) -> &'static ShapeTemplate {
        template(self, rotation)
    }
}

/// Column/row pair. Used both for offsets inside a 4x4 frame and for
/// absolute playfield positions (x = column, y = row, row 0 at the top).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// One (kind, rotation) entry of the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeTemplate {
    pub kind: ShapeKind,
    pub rotation: u8,
    /// Filled sub-cells in row-major order within the frame.
    pub offsets: [Point; BLOCKS_PER_TETRAD],
    pub width: u8,
    pub height: u8,
    /// Frame anchor that centers the shape in a `(width+2) x (height+2)` preview box.
    pub show_origin: Point,
}

impl ShapeTemplate {
    pub fn is_filled(&self, dx: usize, dy: usize) -> bool {
        self.offsets
            .iter()
            .any(|p| p.x == dx as i32 && p.y == dy as i32)
    }

    /// Number of empty rows above the first filled row of the frame.
    pub fn top_indent(&self) -> i32 {
        self.offsets[0].y
    }

    pub fn preview_size(&self) -> (u8, u8) {
        (self.width + 2, self.height + 2)
    }
}

type Grid = [u8; FRAME_SIZE * FRAME_SIZE];

// Clockwise rotation order, one 4x4 grid per rotation.
const GRIDS: [[Grid; 4]; ShapeKind::COUNT] = [
    // I
    [
        [
            0, 0, 0, 0, //
            1, 1, 1, 1, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 1, 0, 0, //
        ],
        [
            0, 0, 0, 0, //
            1, 1, 1, 1, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 1, 0, 0, //
        ],
    ],
    // O
    [
        [
            0, 1, 1, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 1, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 1, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 1, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
    ],
    // T
    [
        [
            0, 1, 0, 0, //
            1, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            0, 1, 1, 0, //
            0, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 0, 0, 0, //
            1, 1, 1, 0, //
            0, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            1, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
    ],
    // L
    [
        [
            0, 0, 1, 0, //
            1, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 0, 0, 0, //
            1, 1, 1, 0, //
            1, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            1, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
    ],
    // J
    [
        [
            1, 0, 0, 0, //
            1, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 1, 0, //
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 0, 0, 0, //
            1, 1, 1, 0, //
            0, 0, 1, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            0, 1, 0, 0, //
            1, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
    ],
    // S
    [
        [
            0, 1, 1, 0, //
            1, 1, 0, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            0, 1, 1, 0, //
            0, 0, 1, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 0, 0, 0, //
            0, 1, 1, 0, //
            1, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            1, 0, 0, 0, //
            1, 1, 0, 0, //
            0, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
    ],
    // Z
    [
        [
            1, 1, 0, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 0, 1, 0, //
            0, 1, 1, 0, //
            0, 1, 0, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 0, 0, 0, //
            1, 1, 0, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0, //
        ],
        [
            0, 1, 0, 0, //
            1, 1, 0, 0, //
            1, 0, 0, 0, //
            0, 0, 0, 0, //
        ],
    ],
];

const PLACEHOLDER: ShapeTemplate = ShapeTemplate {
    kind: ShapeKind::I,
    rotation: 0,
    offsets: [Point::ZERO; BLOCKS_PER_TETRAD],
    width: 0,
    height: 0,
    show_origin: Point::ZERO,
};

const fn build_template(kind: ShapeKind, rotation: u8, grid: &Grid) -> ShapeTemplate {
    let mut offsets = [Point::ZERO; BLOCKS_PER_TETRAD];
    let mut count = 0;
    let (mut min_x, mut min_y) = (FRAME_SIZE as i32, FRAME_SIZE as i32);
    let (mut max_x, mut max_y) = (-1, -1);

    let mut dy = 0;
    while dy < FRAME_SIZE {
        let mut dx = 0;
        while dx < FRAME_SIZE {
            if grid[dy * FRAME_SIZE + dx] != 0 {
                assert!(count < BLOCKS_PER_TETRAD, "shape grid has more than four blocks");
                let (x, y) = (dx as i32, dy as i32);
                offsets[count] = Point::new(x, y);
                count += 1;
                if x < min_x {
                    min_x = x;
                }
                if y < min_y {
                    min_y = y;
                }
                if x > max_x {
                    max_x = x;
                }
                if y > max_y {
                    max_y = y;
                }
            }
            dx += 1;
        }
        dy += 1;
    }
    assert!(count == BLOCKS_PER_TETRAD, "shape grid has fewer than four blocks");

    ShapeTemplate {
        kind,
        rotation,
        offsets,
        width: (max_x - min_x + 1) as u8,
        height: (max_y - min_y + 1) as u8,
        show_origin: Point::new(1 - min_x, 1 - min_y),
    }
}

const fn build_catalogue() -> [[ShapeTemplate; 4]; ShapeKind::COUNT] {
    let mut table = [[PLACEHOLDER; 4]; ShapeKind::COUNT];
    let mut k = 0;
    while k < ShapeKind::COUNT {
        let mut r = 0;
        while r < ROTATIONS as usize {
            table[k][r] = build_template(ShapeKind::ALL[k], r as u8, &GRIDS[k][r]);
            r += 1;
        }
        k += 1;
    }
    table
}

/// The full catalogue, addressable as `CATALOGUE[kind.index()][rotation]`.
pub static CATALOGUE: [[ShapeTemplate; 4]; ShapeKind::COUNT] = build_catalogue();

pub fn template(kind: ShapeKind, rotation: u8) -> &'static ShapeTemplate {
    &CATALOGUE[kind.index()][(rotation % ROTATIONS) as usize]
}
