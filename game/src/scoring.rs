//! Score, level and descent speed after a fixation.

use serde::{Deserialize, Serialize};

use crate::config::{ScoringConfig, SpeedConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub score: u32,
    pub level: u32,
    pub descent_period_ms: u32,
}

impl Progress {
    pub fn initial(speed: &SpeedConfig) -> Self {
        Self {
            score: 0,
            level: 1,
            descent_period_ms: descent_period_ms(speed, 1),
        }
    }
}

/// `row_score * n + row_bonus * n(n-1)/2`, i.e. 100, 250, 450, 700 by default.
pub fn award(scoring: &ScoringConfig, rows_cleared: u32) -> u32 {
    let n = rows_cleared;
    let pairs = n.saturating_mul(n.saturating_sub(1)) / 2;
    scoring
        .row_score
        .saturating_mul(n)
        .saturating_add(scoring.row_bonus.saturating_mul(pairs))
}

pub fn level_for(scoring: &ScoringConfig, score: u32, level: u32) -> u32 {
    level.max(1 + score / scoring.level_mark)
}

pub fn descent_period_ms(speed: &SpeedConfig, level: u32) -> u32 {
    speed
        .tiers
        .iter()
        .rev()
        .find(|t| level >= t.min_level)
        .or(speed.tiers.first())
        .map(|t| t.period_ms)
        .unwrap_or(700)
}

/// Applies one clear of `rows_cleared` rows. A zero-row fixation leaves
/// progress untouched.
pub fn apply_clear(
    scoring: &ScoringConfig,
    speed: &SpeedConfig,
    progress: Progress,
    rows_cleared: u32,
) -> Progress {
    if rows_cleared == 0 {
        return progress;
    }
    let score = progress.score.saturating_add(award(scoring, rows_cleared));
    let level = level_for(scoring, score, progress.level);
    // Tiers are non-increasing, so this never slows the game down.
    let period = descent_period_ms(speed, level).min(progress.descent_period_ms);
    Progress {
        score,
        level,
        descent_period_ms: period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn award_table_matches_defaults() {
        let s = ScoringConfig::default();
        assert_eq!(
            [1, 2, 3, 4].map(|n| award(&s, n)),
            [100, 250, 450, 700]
        );
        assert_eq!(award(&s, 0), 0);
    }

    #[test]
    fn award_is_closed_form_sum() {
        let s = ScoringConfig::default();
        for n in 1..=8u32 {
            let sum: u32 = (0..n).map(|i| 100 + 50 * i).sum();
            assert_eq!(award(&s, n), sum);
            assert_eq!(award(&s, n), 100 * n + 25 * n * (n - 1));
        }
    }

    #[test]
    fn award_saturates_on_huge_config() {
        let scoring = ScoringConfig {
            row_score: u32::MAX,
            row_bonus: u32::MAX / 2,
            level_mark: 500,
        };
        assert_eq!(award(&scoring, 0), 0);
        assert_eq!(award(&scoring, 1), u32::MAX);
        assert_eq!(award(&scoring, 4), u32::MAX);
        let speed = SpeedConfig::default();
        let p = apply_clear(&scoring, &speed, Progress::initial(&speed), 4);
        assert_eq!(p.score, u32::MAX);
    }

    #[test]
    fn tiers_by_level() {
        let speed = SpeedConfig::default();
        assert_eq!(descent_period_ms(&speed, 1), 700);
        assert_eq!(descent_period_ms(&speed, 2), 700);
        assert_eq!(descent_period_ms(&speed, 3), 600);
        assert_eq!(descent_period_ms(&speed, 6), 600);
        assert_eq!(descent_period_ms(&speed, 7), 500);
        assert_eq!(descent_period_ms(&speed, 40), 500);
    }

    #[test]
    fn levels_follow_score_marks() {
        let s = ScoringConfig::default();
        assert_eq!(level_for(&s, 499, 1), 1);
        assert_eq!(level_for(&s, 500, 1), 2);
        assert_eq!(level_for(&s, 700, 1), 2);
        assert_eq!(level_for(&s, 1000, 2), 3);
        assert_eq!(level_for(&s, 3000, 3), 7);
        assert_eq!(level_for(&s, 0, 4), 4);
    }

    #[test]
    fn apply_clear_updates_all_three() {
        let s = ScoringConfig::default();
        let speed = SpeedConfig::default();
        let p = Progress::initial(&speed);
        let p = apply_clear(&s, &speed, p, 4);
        assert_eq!(
            p,
            Progress {
                score: 700,
                level: 2,
                descent_period_ms: 700
            }
        );
        let p = apply_clear(&s, &speed, p, 2);
        assert_eq!((p.score, p.level, p.descent_period_ms), (950, 2, 700));
        let p = apply_clear(&s, &speed, p, 1);
        assert_eq!((p.score, p.level, p.descent_period_ms), (1050, 3, 600));
        assert_eq!(apply_clear(&s, &speed, p, 0), p);
    }
}
