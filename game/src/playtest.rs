use engine::GameLogic;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::game_engine::{Command, GameEngine, GameStatus};
use crate::rng::{RandomSource, XorShiftRng};

/// One entry of a recorded session: a clock tick or a user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Input {
    Tick,
    Command(Command),
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        Input::Command(command)
    }
}

#[derive(Debug, Clone)]
pub struct TetradLogic {
    config: EngineConfig,
}

impl TetradLogic {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl GameLogic for TetradLogic {
    type State = GameEngine;
    type Input = Input;

    fn initial_state(&self) -> Self::State {
        GameEngine::new(self.config.clone())
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        match input {
            Input::Tick => {
                next.tick();
            }
            Input::Command(command) => {
                next.handle(command);
            }
        }
        next
    }
}

/// Maps the classic key names to commands. Anything else is unbound.
pub fn key_binding(key: &str) -> Option<Command> {
    match key {
        "Left" => Some(Command::ShiftLeft),
        "Right" => Some(Command::ShiftRight),
        "Up" | "PageUp" => Some(Command::Rotate),
        "Down" | "PageDown" => Some(Command::FastDrop),
        "Escape" => Some(Command::Pause),
        "Enter" => Some(Command::StartOrResume),
        _ => None,
    }
}

/// A deterministic pseudo-player: starts a game, then ticks every frame and
/// now and then shifts, rotates or fast-drops. Restarts are left to the caller.
pub fn random_session(seed: u64, ticks: usize) -> Vec<Input> {
    const MOVES: [Command; 4] = [
        Command::ShiftLeft,
        Command::ShiftRight,
        Command::Rotate,
        Command::FastDrop,
    ];

    let mut rng = XorShiftRng::new(seed);
    let mut inputs = Vec::with_capacity(ticks + ticks / 4 + 1);
    inputs.push(Input::Command(Command::StartOrResume));
    for _ in 0..ticks {
        if rng.next_int_below(4) == 0 {
            let ix = rng.next_int_below(MOVES.len() as u32) as usize;
            inputs.push(Input::Command(MOVES[ix]));
        }
        inputs.push(Input::Tick);
    }
    inputs
}

/// Closed-loop pseudo-player that reacts to the engine status, for long
/// headless runs where games end and have to be restarted.
#[derive(Debug, Clone)]
pub struct Autoplayer {
    rng: XorShiftRng,
    games: usize,
}

impl Autoplayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: XorShiftRng::new(seed),
            games: 0,
        }
    }

    /// Games started so far. Resuming a paused game does not count.
    pub fn games(&self) -> usize {
        self.games
    }

    pub fn next_input(&mut self, status: GameStatus) -> Input {
        match status {
            GameStatus::NotStarted | GameStatus::Over => {
                self.games += 1;
                Input::Command(Command::StartOrResume)
            }
            GameStatus::Paused => Input::Command(Command::StartOrResume),
            GameStatus::Running => match self.rng.next_int_below(8) {
                0 => Input::Command(Command::ShiftLeft),
                1 => Input::Command(Command::ShiftRight),
                2 => Input::Command(Command::Rotate),
                3 => Input::Command(Command::FastDrop),
                _ => Input::Tick,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::HeadlessRunner;

    #[test]
    fn key_bindings_cover_reference_keys() {
        assert_eq!(key_binding("Left"), Some(Command::ShiftLeft));
        assert_eq!(key_binding("PageUp"), Some(Command::Rotate));
        assert_eq!(key_binding("PageDown"), Some(Command::FastDrop));
        assert_eq!(key_binding("Escape"), Some(Command::Pause));
        assert_eq!(key_binding("Enter"), Some(Command::StartOrResume));
        assert_eq!(key_binding("Space"), None);
    }

    #[test]
    fn step_does_not_mutate_previous_state() {
        let logic = TetradLogic::new(EngineConfig::with_board(20, 10));
        let s0 = logic.initial_state();
        let s1 = logic.step(&s0, Command::StartOrResume.into());
        assert_eq!(s0.status(), GameStatus::NotStarted);
        assert_eq!(s1.status(), GameStatus::Running);
    }

    #[test]
    fn random_session_is_reproducible() {
        let a = random_session(9, 200);
        assert_eq!(a, random_session(9, 200));
        assert_eq!(a[0], Input::Command(Command::StartOrResume));
        assert_eq!(a.iter().filter(|i| **i == Input::Tick).count(), 200);
    }

    #[test]
    fn runner_records_a_session() {
        let logic = TetradLogic::new(EngineConfig::with_board(20, 10));
        let inputs = random_session(1, 100);
        let mut runner = HeadlessRunner::new(logic);
        runner.run(inputs.iter().copied());
        assert_eq!(runner.history().len(), inputs.len() + 1);
        assert_eq!(runner.state().ms_played(), 100 * 50);

        runner.seek(1);
        assert_eq!(runner.state().ms_played(), 0);
        assert_eq!(runner.state().status(), GameStatus::Running);
    }

    #[test]
    fn autoplayer_counts_only_new_games() {
        let mut player = Autoplayer::new(3);
        let start = Input::Command(Command::StartOrResume);
        assert_eq!(player.next_input(GameStatus::NotStarted), start);
        assert_eq!(player.next_input(GameStatus::Paused), start);
        assert_eq!(player.next_input(GameStatus::Paused), start);
        assert_eq!(player.games(), 1);
        assert_eq!(player.next_input(GameStatus::Over), start);
        assert_eq!(player.games(), 2);

        for _ in 0..200 {
            let input = player.next_input(GameStatus::Running);
            assert_ne!(input, start);
            assert_ne!(input, Input::Command(Command::Pause));
        }
        assert_eq!(player.games(), 2);
    }
}
