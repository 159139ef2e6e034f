use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, EngineConfig};
use crate::playfield::Playfield;
use crate::rng::{RandomSource, XorShiftRng};
use crate::scoring::{self, Progress};
use crate::shapes::Point;
use crate::tetrad::{Blocks, Tetrad};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GameStatus {
    NotStarted,
    Running,
    Paused,
    Over,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Command {
    ShiftLeft,
    ShiftRight,
    Rotate,
    FastDrop,
    Pause,
    StartOrResume,
}

/// What a tick or command did, ordered by how much the view has to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Update {
    Unchanged,
    Changed,
    /// Board changed and score/level moved with it.
    Scored,
    /// Status changed (start, pause, resume, game over).
    Transition,
}

impl Update {
    pub fn needs_redraw(self) -> bool {
        self != Update::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEngine<R = XorShiftRng> {
    config: EngineConfig,
    playfield: Playfield,
    current: Option<Tetrad>,
    next: Option<Tetrad>,
    status: GameStatus,
    progress: Progress,
    ms_played: u64,
    cycle_count: u32,
    pending_ms: u32,
    fast_drop: bool,
    rng: R,
}

impl GameEngine<XorShiftRng> {
    /// Builds an engine seeded from `config.seed`. Invalid fields fall back
    /// to their defaults.
    pub fn new(config: EngineConfig) -> Self {
        let rng = XorShiftRng::new(config.seed);
        Self::with_random_source(config, rng)
    }

    pub fn try_new(config: EngineConfig) -> Result<Self, ConfigError> {
        let rng = XorShiftRng::new(config.seed);
        Self::try_with_random_source(config, rng)
    }
}

impl Default for GameEngine<XorShiftRng> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<R: RandomSource> GameEngine<R> {
    /// Invalid config fields fall back to their defaults, as in `new`.
    pub fn with_random_source(config: EngineConfig, rng: R) -> Self {
        Self::build(config.sanitized(), rng)
    }

    pub fn try_with_random_source(config: EngineConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: EngineConfig, rng: R) -> Self {
        let progress = Progress::initial(&config.speed);
        Self {
            playfield: Playfield::new(config.rows, config.cols),
            config,
            current: None,
            next: None,
            status: GameStatus::NotStarted,
            progress,
            ms_played: 0,
            cycle_count: 0,
            pending_ms: 0,
            fast_drop: false,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Scenario setup hook; gameplay never hands out the field mutably.
    pub fn playfield_mut(&mut self) -> &mut Playfield {
        &mut self.playfield
    }

    pub fn current(&self) -> Option<&Tetrad> {
        self.current.as_ref()
    }

    pub fn next(&self) -> Option<&Tetrad> {
        self.next.as_ref()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.progress.score
    }

    pub fn level(&self) -> u32 {
        self.progress.level
    }

    pub fn descent_period_ms(&self) -> u32 {
        self.progress.descent_period_ms
    }

    pub fn ms_played(&self) -> u64 {
        self.ms_played
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn is_fast_drop_armed(&self) -> bool {
        self.fast_drop
    }

    /// Resting position of the current tetrad, `None` if it is grounded.
    pub fn destination(&self) -> Option<Blocks> {
        let curr = self.current.as_ref()?;
        self.playfield.destination(&curr.blocks())
    }

    /// The part of the failed spawn that fits once lifted, shown after game over.
    pub fn game_over_blocks(&self) -> Option<Vec<Point>> {
        if self.status != GameStatus::Over {
            return None;
        }
        let curr = self.current.as_ref()?;
        self.playfield.project_feasible_blocks(&curr.blocks())
    }

    /// Ticks between descents for the current period and fast-drop state.
    pub fn drop_threshold(&self) -> u32 {
        let factor = if self.fast_drop {
            self.config.fast_drop_factor
        } else {
            1.0
        };
        let cycles =
            self.progress.descent_period_ms as f64 / self.config.base_period_ms as f64 / factor;
        (cycles.ceil() as u32).max(1)
    }

    /// Returns to the pre-game state. Configuration and the random stream
    /// are kept.
    pub fn reset(&mut self) {
        self.playfield.reset();
        self.current = None;
        self.next = None;
        self.status = GameStatus::NotStarted;
        self.progress = Progress::initial(&self.config.speed);
        self.ms_played = 0;
        self.cycle_count = 0;
        self.pending_ms = 0;
        self.fast_drop = false;
    }

    fn random_tetrad(&mut self) -> Tetrad {
        Tetrad::random(&mut self.rng, self.config.color_count)
    }

    fn start_new_game(&mut self) {
        self.reset();
        let first = self.random_tetrad();
        self.next = Some(first);
        if !self.promote() {
            // Only reachable with a board too small for the piece.
            self.end_game();
            return;
        }
        self.status = GameStatus::Running;
        log::info!(
            "game started on {}x{} board",
            self.config.rows,
            self.config.cols
        );
    }

    /// Moves `next` into play at the spawn point and draws a new `next`.
    /// Returns false when the promoted piece does not fit.
    fn promote(&mut self) -> bool {
        let mut curr = match self.next.take() {
            Some(t) => t,
            None => self.random_tetrad(),
        };
        curr.set_anchor(self.config.spawn_col(), -curr.top_indent());
        self.current = Some(curr);
        self.fast_drop = false;

        if !self.playfield.is_valid_and_empty(&curr.blocks()) {
            return false;
        }
        self.next = Some(self.random_tetrad());
        log::debug!(
            "spawned {:?} color {} at {:?}",
            curr.kind(),
            curr.color_ix(),
            curr.anchor()
        );
        true
    }

    /// One base period of game time.
    pub fn tick(&mut self) -> Update {
        if self.status != GameStatus::Running {
            return Update::Unchanged;
        }
        self.ms_played += self.config.base_period_ms as u64;
        self.cycle_count += 1;
        if self.cycle_count >= self.drop_threshold() {
            self.cycle_count = 0;
            return self.descend();
        }
        Update::Unchanged
    }

    /// Feeds wall-clock time, running one tick per whole base period.
    pub fn advance(&mut self, dt_ms: u32) -> Update {
        if self.status != GameStatus::Running {
            return Update::Unchanged;
        }
        self.pending_ms = self.pending_ms.saturating_add(dt_ms);
        let mut update = Update::Unchanged;
        while self.pending_ms >= self.config.base_period_ms && self.status == GameStatus::Running {
            self.pending_ms -= self.config.base_period_ms;
            update = update.max(self.tick());
        }
        update
    }

    /// Drops the current tetrad one row, or fixes it and brings in the next.
    pub fn descend(&mut self) -> Update {
        if self.status != GameStatus::Running {
            return Update::Unchanged;
        }
        let Some(mut curr) = self.current else {
            return Update::Unchanged;
        };

        let blocks = curr.blocks();
        if self.playfield.is_valid_move_down(&blocks) {
            curr.drop_one_row();
            self.current = Some(curr);
            self.fast_drop = false;
            return Update::Changed;
        }

        self.playfield.place(&blocks, curr.color_ix());
        log::debug!("fixed {:?} at {:?}", curr.kind(), curr.anchor());

        let mut update = Update::Changed;
        let cleared = self.playfield.clear_full_rows() as u32;
        if cleared > 0 {
            let before = self.progress;
            self.progress =
                scoring::apply_clear(&self.config.scoring, &self.config.speed, before, cleared);
            log::debug!("cleared {cleared} rows, score {}", self.progress.score);
            if self.progress.level != before.level {
                log::info!(
                    "level {} -> {} (descent {} ms)",
                    before.level,
                    self.progress.level,
                    self.progress.descent_period_ms
                );
            }
            update = Update::Scored;
        }

        if !self.promote() {
            self.end_game();
            return Update::Transition;
        }
        update
    }

    fn end_game(&mut self) {
        self.status = GameStatus::Over;
        self.next = None;
        log::info!(
            "game over: score {} level {} after {} ms",
            self.progress.score,
            self.progress.level,
            self.ms_played
        );
    }

    pub fn handle(&mut self, command: Command) -> Update {
        match command {
            Command::ShiftLeft => self.shift(-1),
            Command::ShiftRight => self.shift(1),
            Command::Rotate => self.rotate(),
            Command::FastDrop => {
                if self.status == GameStatus::Running {
                    self.fast_drop = true;
                }
                Update::Unchanged
            }
            Command::Pause => {
                if self.status != GameStatus::Running {
                    return Update::Unchanged;
                }
                self.status = GameStatus::Paused;
                log::info!("paused at {} ms", self.ms_played);
                Update::Transition
            }
            Command::StartOrResume => match self.status {
                GameStatus::NotStarted | GameStatus::Over => {
                    self.start_new_game();
                    Update::Transition
                }
                GameStatus::Paused => {
                    self.status = GameStatus::Running;
                    log::info!("resumed");
                    Update::Transition
                }
                GameStatus::Running => Update::Unchanged,
            },
        }
    }

    fn shift(&mut self, dir: i32) -> Update {
        if self.status != GameStatus::Running {
            return Update::Unchanged;
        }
        let Some(curr) = self.current.as_mut() else {
            return Update::Unchanged;
        };
        if !self.playfield.is_valid_shift(&curr.blocks(), dir) {
            return Update::Unchanged;
        }
        curr.shift(dir);
        Update::Changed
    }

    fn rotate(&mut self) -> Update {
        if self.status != GameStatus::Running {
            return Update::Unchanged;
        }
        let Some(curr) = self.current.as_mut() else {
            return Update::Unchanged;
        };
        if !self.playfield.is_valid_and_empty(&curr.block_positions(1)) {
            return Update::Unchanged;
        }
        curr.rotate(1);
        Update::Changed
    }

    /// Replaces the current tetrad, keeping its anchor as given.
    pub fn set_current_for_test(&mut self, tetrad: Tetrad) {
        self.current = Some(tetrad);
        self.cycle_count = 0;
        self.fast_drop = false;
    }

    pub fn set_next_for_test(&mut self, tetrad: Option<Tetrad>) {
        self.next = tetrad;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::rng::ScriptedRandom;
    use crate::shapes::ShapeKind;

    fn running(rows: usize, cols: usize) -> GameEngine<ScriptedRandom> {
        // Always an O in color 1.
        let mut engine = GameEngine::with_random_source(
            EngineConfig::with_board(rows, cols),
            ScriptedRandom::new(vec![1, 0]),
        );
        engine.handle(Command::StartOrResume);
        engine
    }

    #[test]
    fn start_spawns_two_tetrads_flush_with_top() {
        let engine = running(20, 10);
        assert_eq!(engine.status(), GameStatus::Running);
        let curr = engine.current().unwrap();
        assert_eq!(curr.kind(), ShapeKind::O);
        assert_eq!(curr.anchor(), Point::new(4, 0));
        assert!(curr.blocks().iter().any(|p| p.y == 0));
        assert!(engine.next().is_some());
        assert_eq!(engine.descent_period_ms(), 700);
    }

    #[test]
    fn spawn_uses_top_indent() {
        let mut engine = GameEngine::with_random_source(
            EngineConfig::with_board(20, 10),
            ScriptedRandom::new(vec![0, 0]),
        );
        engine.handle(Command::StartOrResume);
        let curr = engine.current().unwrap();
        assert_eq!(curr.kind(), ShapeKind::I);
        assert_eq!(curr.anchor().y, -1);
        assert!(curr.blocks().iter().all(|p| p.y == 0));
    }

    #[test]
    fn tick_descends_on_threshold() {
        let mut engine = running(20, 10);
        assert_eq!(engine.drop_threshold(), 14);
        for _ in 0..13 {
            assert_eq!(engine.tick(), Update::Unchanged);
        }
        assert_eq!(engine.tick(), Update::Changed);
        assert_eq!(engine.current().unwrap().anchor().y, 1);
        assert_eq!(engine.ms_played(), 14 * 50);
        assert_eq!(engine.cycle_count(), 0);
    }

    #[test]
    fn fast_drop_shortens_one_descent_then_disarms() {
        let mut engine = running(20, 10);
        assert_eq!(engine.handle(Command::FastDrop), Update::Unchanged);
        assert!(engine.is_fast_drop_armed());
        assert_eq!(engine.drop_threshold(), 6);
        for _ in 0..5 {
            engine.tick();
        }
        assert_eq!(engine.tick(), Update::Changed);
        assert!(!engine.is_fast_drop_armed());
        assert_eq!(engine.drop_threshold(), 14);
    }

    #[test]
    fn advance_accumulates_partial_periods() {
        let mut engine = running(20, 10);
        engine.advance(30);
        assert_eq!(engine.ms_played(), 0);
        engine.advance(30);
        assert_eq!(engine.ms_played(), 50);
        engine.advance(660);
        assert_eq!(engine.ms_played(), 700);
        assert_eq!(engine.current().unwrap().anchor().y, 1);
    }

    #[test]
    fn shift_respects_walls() {
        let mut engine = running(20, 10);
        for _ in 0..10 {
            engine.handle(Command::ShiftLeft);
        }
        // O occupies frame columns 1..=2.
        assert_eq!(engine.current().unwrap().anchor().x, -1);
        assert_eq!(engine.handle(Command::ShiftLeft), Update::Unchanged);
        assert_eq!(engine.handle(Command::ShiftRight), Update::Changed);
    }

    #[test]
    fn commands_are_noops_outside_running() {
        let mut engine = GameEngine::new(EngineConfig::default());
        for cmd in [
            Command::ShiftLeft,
            Command::ShiftRight,
            Command::Rotate,
            Command::FastDrop,
            Command::Pause,
        ] {
            assert_eq!(engine.handle(cmd), Update::Unchanged);
        }
        assert_eq!(engine.tick(), Update::Unchanged);
        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert_eq!(engine.handle(Command::StartOrResume), Update::Transition);
        assert_eq!(engine.handle(Command::StartOrResume), Update::Unchanged);
    }

    #[test]
    fn pause_and_resume() {
        let mut engine = running(20, 10);
        assert_eq!(engine.handle(Command::Pause), Update::Transition);
        assert_eq!(engine.status(), GameStatus::Paused);
        assert_eq!(engine.handle(Command::Pause), Update::Unchanged);
        assert_eq!(engine.handle(Command::StartOrResume), Update::Transition);
        assert_eq!(engine.status(), GameStatus::Running);
    }

    #[test]
    fn reset_keeps_config() {
        let mut engine = running(8, 6);
        engine.tick();
        engine.reset();
        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert!(engine.current().is_none());
        assert_eq!(engine.ms_played(), 0);
        assert_eq!(engine.config().rows, 8);
        assert_eq!(engine.playfield().rows(), 8);
    }

    #[test]
    fn try_new_rejects_invalid_config() {
        assert!(GameEngine::try_new(EngineConfig::with_board(2, 2)).is_err());
        let engine = GameEngine::new(EngineConfig::with_board(2, 2));
        assert_eq!(engine.playfield().rows(), 23);
    }

    #[test]
    fn random_source_constructors_check_config() {
        let bad = EngineConfig {
            base_period_ms: 0,
            color_count: 0,
            scoring: ScoringConfig {
                level_mark: 0,
                ..ScoringConfig::default()
            },
            ..EngineConfig::with_board(3, 3)
        };
        assert!(
            GameEngine::try_with_random_source(bad.clone(), ScriptedRandom::new(vec![0, 0]))
                .is_err()
        );

        let mut engine = GameEngine::with_random_source(bad, ScriptedRandom::new(vec![0, 0]));
        let config = engine.config();
        assert_eq!((config.rows, config.cols), (23, 16));
        assert_eq!(config.base_period_ms, 50);
        assert_eq!(config.color_count, 11);
        assert_eq!(config.scoring.level_mark, 500);

        assert_eq!(engine.handle(Command::StartOrResume), Update::Transition);
        assert_eq!(engine.status(), GameStatus::Running);
        let curr = engine.current().expect("spawned I");
        assert!(engine.playfield().is_valid_and_empty(&curr.blocks()));
        assert_eq!(engine.advance(120), Update::Unchanged);
        assert_eq!(engine.ms_played(), 100);
    }

    #[test]
    fn start_on_an_unfit_board_is_over() {
        // Deserialized state can carry a config that never went through sanitizing.
        let mut engine = GameEngine::with_random_source(
            EngineConfig::with_board(4, 4),
            ScriptedRandom::new(vec![0, 0]),
        );
        engine.config.cols = 3;
        engine.playfield = Playfield::new(4, 3);

        assert_eq!(engine.handle(Command::StartOrResume), Update::Transition);
        assert_eq!(engine.status(), GameStatus::Over);
        assert!(engine.next().is_none());
        let curr = engine.current().expect("failed spawn is kept");
        assert!(!engine.playfield().is_valid_and_empty(&curr.blocks()));
        assert_eq!(engine.tick(), Update::Unchanged);
    }

    #[test]
    fn engine_round_trips_through_json() {
        let mut engine = GameEngine::new(EngineConfig {
            seed: 5,
            ..EngineConfig::default()
        });
        engine.handle(Command::StartOrResume);
        for _ in 0..40 {
            engine.tick();
        }
        let json = serde_json::to_string(&engine).expect("serialize engine");
        let mut restored: GameEngine = serde_json::from_str(&json).expect("deserialize engine");
        assert_eq!(restored, engine);
        for _ in 0..200 {
            assert_eq!(restored.tick(), engine.tick());
        }
        assert_eq!(restored, engine);
    }
}
