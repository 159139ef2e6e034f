//! Read-only views the presentation layer polls each frame.

use serde::{Deserialize, Serialize};

use crate::game_engine::{GameEngine, GameStatus};
use crate::rng::RandomSource;
use crate::shapes::{Point, ShapeKind};
use crate::tetrad::{Blocks, Tetrad};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTetradView {
    pub kind: ShapeKind,
    pub rotation: u8,
    pub color_ix: u8,
    pub anchor: Point,
    pub blocks: Blocks,
    pub destination: Option<Blocks>,
}

/// The next tetrad placed in its own `(width+2) x (height+2)` preview box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewView {
    pub kind: ShapeKind,
    pub rotation: u8,
    pub color_ix: u8,
    pub size: (u8, u8),
    pub show_origin: Point,
    pub box_size: (u8, u8),
    pub blocks: Blocks,
}

impl PreviewView {
    pub fn of(tetrad: &Tetrad) -> Self {
        let t = tetrad.template();
        let mut shown = *tetrad;
        shown.set_anchor(t.show_origin.x, t.show_origin.y);
        Self {
            kind: tetrad.kind(),
            rotation: tetrad.rotation(),
            color_ix: tetrad.color_ix(),
            size: (t.width, t.height),
            show_origin: t.show_origin,
            box_size: t.preview_size(),
            blocks: shown.blocks(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub status: GameStatus,
    pub score: u32,
    pub level: u32,
    pub ms_played: u64,
    pub descent_period_ms: u32,
    pub rows: usize,
    pub cols: usize,
    /// Row-major color indices, `0` for empty.
    pub cells: Vec<u8>,
    pub current: Option<ActiveTetradView>,
    pub next: Option<PreviewView>,
    pub game_over_blocks: Option<Vec<Point>>,
}

impl EngineSnapshot {
    pub fn capture<R: RandomSource>(engine: &GameEngine<R>) -> Self {
        let field = engine.playfield();
        let current = engine.current().map(|t| ActiveTetradView {
            kind: t.kind(),
            rotation: t.rotation(),
            color_ix: t.color_ix(),
            anchor: t.anchor(),
            blocks: t.blocks(),
            destination: engine.destination(),
        });

        Self {
            status: engine.status(),
            score: engine.score(),
            level: engine.level(),
            ms_played: engine.ms_played(),
            descent_period_ms: engine.descent_period_ms(),
            rows: field.rows(),
            cols: field.cols(),
            cells: field.cells().to_vec(),
            current,
            next: engine.next().map(PreviewView::of),
            game_over_blocks: engine.game_over_blocks(),
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    pub fn play_time(&self) -> String {
        format_play_time(self.ms_played)
    }
}

impl<R: RandomSource> GameEngine<R> {
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot::capture(self)
    }
}

/// `HH:MM:SS` of whole seconds played.
pub fn format_play_time(ms: u64) -> String {
    let seconds = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game_engine::Command;

    #[test]
    fn play_time_formats_hours_minutes_seconds() {
        assert_eq!(format_play_time(0), "00:00:00");
        assert_eq!(format_play_time(999), "00:00:00");
        assert_eq!(format_play_time(61_000), "00:01:01");
        assert_eq!(format_play_time(3_725_000), "01:02:05");
        assert_eq!(format_play_time(360_000_000), "100:00:00");
    }

    #[test]
    fn preview_centers_in_box() {
        let t = Tetrad::new(ShapeKind::I, 0, 4);
        let view = PreviewView::of(&t);
        assert_eq!(view.size, (4, 1));
        assert_eq!(view.box_size, (6, 3));
        assert_eq!(
            view.blocks,
            [
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(3, 1),
                Point::new(4, 1)
            ]
        );
    }

    #[test]
    fn snapshot_reflects_running_engine() {
        let mut engine = GameEngine::new(EngineConfig {
            seed: 3,
            ..EngineConfig::with_board(20, 10)
        });
        let idle = engine.snapshot();
        assert_eq!(idle.status, GameStatus::NotStarted);
        assert!(idle.current.is_none() && idle.next.is_none());
        assert_eq!(idle.cells.len(), 200);

        engine.handle(Command::StartOrResume);
        let snap = engine.snapshot();
        assert_eq!(snap.status, GameStatus::Running);
        let current = snap.current.as_ref().expect("current tetrad");
        let dest = current.destination.expect("fresh spawn can fall");
        assert!(dest.iter().any(|p| p.y == 19));
        assert!(snap.next.is_some());
        assert!(snap.game_over_blocks.is_none());
        assert_eq!(snap.cell(19, 0), 0);
        assert_eq!(snap.play_time(), "00:00:00");
    }
}
