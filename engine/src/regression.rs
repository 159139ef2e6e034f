//! Engine-level regression testing helpers.
//!
//! These utilities help you:
//! - hash every recorded state of a `TimeMachine` (SHA-256 over its JSON form),
//! - save the recording, reload it from disk and replay the same inputs, and
//! - compare the per-frame hashes against each other and against a golden file.
//!
//! The engine stays game-agnostic: any `GameLogic` whose state is serde-serialisable works.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::{GameLogic, HeadlessRunner, TimeMachine};

/// Environment flag helper: accepts `1/true/yes/on` (case-insensitive).
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// If set, regression tests may update golden files in-place.
pub fn update_goldens_enabled() -> bool {
    env_flag("TETRAD_UPDATE_GOLDENS")
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[macro_export]
macro_rules! regression_golden_path {
    ($name:expr) => {{
        let base = $crate::regression::sanitize_filename($name);
        ::std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("goldens")
            .join(format!("{base}.json"))
    }};
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn state_sha256_hex<S: Serialize>(state: &S) -> io::Result<String> {
    let bytes =
        serde_json::to_vec(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(sha256_hex(&bytes))
}

pub fn history_hashes<S: Serialize>(history: &[S]) -> io::Result<Vec<String>> {
    history.iter().map(state_sha256_hex).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateHashGolden {
    pub version: u32,
    pub name: String,
    pub hash_alg: String,
    /// One hash per recorded state, initial state first.
    pub hashes: Vec<String>,
}

impl StateHashGolden {
    pub fn new(name: impl Into<String>, hashes: Vec<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            hash_alg: "sha256".to_string(),
            hashes,
        }
    }
}

pub fn load_golden_json(path: impl AsRef<Path>) -> io::Result<StateHashGolden> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed parsing golden json {}: {e}", path.display()),
        )
    })
}

pub fn save_golden_json(path: impl AsRef<Path>, golden: &StateHashGolden) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, golden).map_err(io::Error::other)?;
    writer.flush()?;
    Ok(())
}

pub fn assert_or_update_golden_json(
    path: impl AsRef<Path>,
    golden: &StateHashGolden,
    update: bool,
) -> io::Result<()> {
    let path = path.as_ref();
    let exists = path.exists();

    if update || !exists {
        save_golden_json(path, golden)?;
        if exists {
            log::info!("updated golden: {}", path.display());
        } else {
            log::info!("wrote golden: {}", path.display());
        }
        return Ok(());
    }

    let expected = load_golden_json(path)?;
    if expected.version != golden.version || expected.hash_alg != golden.hash_alg {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "golden metadata mismatch at {}:\nexpected: v{} alg={}\nactual:   v{} alg={}\n(hint: set TETRAD_UPDATE_GOLDENS=1 to rewrite)",
                path.display(),
                expected.version,
                expected.hash_alg,
                golden.version,
                golden.hash_alg,
            ),
        ));
    }

    compare_hashes(&expected.hashes, &golden.hashes).map_err(|detail| {
        io::Error::other(format!(
            "golden mismatch at {}: {detail}\n(hint: set TETRAD_UPDATE_GOLDENS=1 to rewrite)",
            path.display()
        ))
    })
}

fn compare_hashes(expected: &[String], actual: &[String]) -> Result<(), String> {
    if expected.len() != actual.len() {
        return Err(format!(
            "expected {} hashes, got {}",
            expected.len(),
            actual.len()
        ));
    }
    for (i, (a, b)) in expected.iter().zip(actual.iter()).enumerate() {
        if a != b {
            return Err(format!("frame {i}:\nexpected: {a}\nactual:   {b}"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RecordReplayArtifacts {
    pub state_json: PathBuf,
    pub hashes: Vec<String>,
}

/// Engine-level regression helper:
/// - run a scenario live and save its `TimeMachine` as JSON
/// - reload the recording and check every stored state hashes the same as the live one
/// - re-simulate the same inputs from the reloaded initial state and check determinism
///
/// Returns the per-frame hashes so callers can pin them with a golden file.
pub fn record_then_replay_and_compare_hashes<G>(
    name: &str,
    out_dir: impl AsRef<Path>,
    game: G,
    inputs: impl IntoIterator<Item = G::Input>,
) -> io::Result<RecordReplayArtifacts>
where
    G: GameLogic + Clone,
    G::State: Serialize + DeserializeOwned,
    G::Input: Clone,
{
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let state_json = out_dir.join(format!("{}.json", sanitize_filename(name)));

    let inputs: Vec<G::Input> = inputs.into_iter().collect();

    let mut live_runner = HeadlessRunner::new(game.clone());
    live_runner.run(inputs.iter().cloned());
    let live_hashes = history_hashes(live_runner.history())?;
    live_runner.timemachine().save_json_file(&state_json)?;

    let tm = TimeMachine::<G::State>::load_json_file(&state_json)?;
    let loaded_hashes = history_hashes(tm.history())?;
    compare_hashes(&live_hashes, &loaded_hashes).map_err(|detail| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("reloaded recording differs from live run: {detail}"),
        )
    })?;

    // Rewinding to frame 0 makes the first recorded step drop the stored branch.
    let mut replay_tm = tm;
    replay_tm.seek(0);
    let mut replay_runner = HeadlessRunner::from_timemachine(game, replay_tm);
    replay_runner.run(inputs);
    let replayed = history_hashes(replay_runner.history())?;
    compare_hashes(&live_hashes, &replayed).map_err(|detail| {
        io::Error::other(format!("replay was not deterministic: {detail}"))
    })?;

    Ok(RecordReplayArtifacts {
        state_json,
        hashes: live_hashes,
    })
}
