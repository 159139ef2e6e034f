use engine::HeadlessRunner;
use engine::profiling::{StepSampler, Stats};

use tetrad::ConfigStore;
use tetrad::playtest::{Autoplayer, TetradLogic};

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn print_stats(label: &str, s: Stats) {
    println!(
        "{label:<10} n={n:<6} avg={avg:>7.3}ms p50={p50:>7.3}ms p95={p95:>7.3}ms p99={p99:>7.3}ms max={max:>7.3}ms",
        n = s.n,
        avg = s.avg,
        p50 = s.p50,
        p95 = s.p95,
        p99 = s.p99,
        max = s.max
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let frames = env_usize("TETRAD_PROFILE_FRAMES", 10_000).max(1);
    let warmup = env_usize("TETRAD_PROFILE_WARMUP", 200);
    let config = ConfigStore::from_env().load();

    println!("tetrad profile (headless)");
    println!(
        "frames={frames} warmup={warmup} board={}x{} seed={}",
        config.rows, config.cols, config.seed
    );
    println!();

    let mut player = Autoplayer::new(config.seed ^ 0x5EED);
    let mut runner = HeadlessRunner::new(TetradLogic::new(config));
    let mut steps = StepSampler::new(warmup, frames);

    for _ in 0..(frames + warmup) {
        let input = player.next_input(runner.state().status());
        runner.step_profiled(input, &mut steps);
    }

    let last = runner.state();
    println!(
        "games={} final score={} level={} played={}",
        player.games(),
        last.score(),
        last.level(),
        tetrad::snapshot::format_play_time(last.ms_played())
    );
    println!("(ms) lower is better");
    print_stats("step", steps.step.stats());
    print_stats("record", steps.record.stats());
    print_stats("engine", steps.total.stats());
}
