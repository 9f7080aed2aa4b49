//! Independent signature blocks.
//!
//! Each function maps one aspect of an [`Observation`] to a fixed number of
//! values. Missing fields resolve to neutral defaults and every output is
//! finite.

use crate::config::SignatureConfig;
use crate::observation::{EventFlags, Observation, NEUTRAL_SCORE};

use super::layout::{DRIVE_DIM, SCALAR_DIM, TRAJECTORY_DIM};

/// Drive-transition block.
///
/// `[initial, final, delta, relative_descent, cycle_offset, event_flag]`,
/// initial and final scaled by `max_drive_level`.
pub fn drive_block(config: &SignatureConfig, obs: &Observation) -> [f32; DRIVE_DIM] {
    let max = config.max_drive_level;
    let initial = (obs.drive.before / max).clamp(0.0, 1.0);
    let final_ = (obs.drive.after / max).clamp(0.0, 1.0);

    let relative_descent = if obs.drive.before > 0.0 {
        ((obs.drive.before - obs.drive.after) / obs.drive.before).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let max_cycles = config.max_cycles as f32;
    let cycle_offset = (obs.cycle_count as f32).min(max_cycles) / max_cycles;

    let event_flag = if obs.events.breakthrough {
        1.0
    } else if obs.events.crisis || obs.events.rupture {
        -1.0
    } else {
        0.0
    };

    finite_or(
        [
            initial,
            final_,
            final_ - initial,
            relative_descent,
            cycle_offset,
            event_flag,
        ],
        0.0,
    )
}

/// `after - before` for each configured channel; a missing side counts as 0.5.
pub fn channel_delta_block(config: &SignatureConfig, obs: &Observation) -> Vec<f32> {
    config
        .channels
        .iter()
        .map(|name| obs.score_after(name) - obs.score_before(name))
        .map(|v| if v.is_finite() { v } else { 0.0 })
        .collect()
}

/// One-hot of the final state over the configured vocabulary.
///
/// An unknown or missing label yields the uniform vector `1/V`.
pub fn final_state_block(config: &SignatureConfig, obs: &Observation) -> Vec<f32> {
    let vocabulary = &config.state_vocabulary;
    let position = obs
        .state
        .after
        .as_deref()
        .and_then(|label| vocabulary.iter().position(|v| v.eq_ignore_ascii_case(label)));
    one_hot(vocabulary.len(), position)
}

/// One-hot of the highest scoring after-channel.
///
/// Uniform when no configured channel is present or the two best scores
/// are within `tie_epsilon`.
pub fn dominant_channel_block(config: &SignatureConfig, obs: &Observation) -> Vec<f32> {
    let mut best: Option<(usize, f32)> = None;
    let mut runner_up: Option<f32> = None;
    for (i, name) in config.channels.iter().enumerate() {
        let score = match obs.channels.after.get(name) {
            Some(score) => *score,
            None => continue,
        };
        match best {
            Some((_, top)) if score <= top => {
                runner_up = Some(runner_up.map_or(score, |r: f32| r.max(score)));
            }
            Some((_, top)) => {
                runner_up = Some(top);
                best = Some((i, score));
            }
            None => best = Some((i, score)),
        }
    }

    let winner = match (best, runner_up) {
        (Some((_, top)), Some(second)) if top - second <= config.tie_epsilon => None,
        (Some((i, _)), _) => Some(i),
        (None, _) => None,
    };
    one_hot(config.channels.len(), winner)
}

/// Scalar block.
///
/// `[satisfaction_before, satisfaction_after, satisfaction_delta,
/// urgency_before * amp, urgency_after * amp, log_cycles, flag_fraction,
/// coverage]`.
pub fn scalar_block(config: &SignatureConfig, obs: &Observation) -> [f32; SCALAR_DIM] {
    let amp = config.urgency_amplification;
    let log_cycles = ((1.0 + obs.cycle_count as f32).ln()
        / (1.0 + config.max_cycles as f32).ln())
    .clamp(0.0, 1.0);
    let flag_fraction = obs.events.active_count() as f32 / EventFlags::COUNT as f32;

    let present = config
        .channels
        .iter()
        .filter(|name| obs.channels.after.contains_key(name.as_str()))
        .count();
    let coverage = present as f32 / config.channels.len().max(1) as f32;

    finite_or(
        [
            obs.satisfaction.before,
            obs.satisfaction.after,
            obs.satisfaction.delta(),
            obs.urgency.before * amp,
            obs.urgency.after * amp,
            log_cycles,
            flag_fraction,
            coverage,
        ],
        0.0,
    )
}

/// Trajectory block.
///
/// `[warmth, pacing, containment, directness, crisis, healing, activation]`.
/// Without steps the markers are neutral and the rest zero.
pub fn trajectory_block(config: &SignatureConfig, obs: &Observation) -> [f32; TRAJECTORY_DIM] {
    let steps = &obs.trajectory;
    if steps.is_empty() {
        let n = NEUTRAL_SCORE;
        return [n, n, n, n, 0.0, 0.0, 0.0];
    }
    let count = steps.len() as f32;

    let mut markers = [0.0f32; 4];
    for step in steps {
        for (sum, v) in markers.iter_mut().zip(step.markers.to_array()) {
            *sum += v;
        }
    }
    for m in markers.iter_mut() {
        *m /= count;
    }

    let step_means: Vec<f32> = steps
        .iter()
        .map(|s| {
            if s.channels.is_empty() {
                NEUTRAL_SCORE
            } else {
                s.channels.values().sum::<f32>() / s.channels.len() as f32
            }
        })
        .collect();

    let crisis = step_means.iter().filter(|m| **m < config.crisis_floor).count() as f32 / count;
    let healing = if step_means.len() < 2 {
        0.0
    } else {
        let rising = step_means.windows(2).filter(|w| w[1] > w[0]).count();
        rising as f32 / (step_means.len() - 1) as f32
    };

    let activation = activation_score(config, obs);

    finite_or(
        [
            markers[0], markers[1], markers[2], markers[3], crisis, healing, activation,
        ],
        0.0,
    )
}

/// Cross-step channel variance combined with a breach indicator and a
/// grounding factor, clamped to `[0, 1]`.
fn activation_score(config: &SignatureConfig, obs: &Observation) -> f32 {
    use std::collections::BTreeMap;

    let mut series: BTreeMap<&str, Vec<f32>> = BTreeMap::new();
    for step in &obs.trajectory {
        for (name, score) in &step.channels {
            series.entry(name.as_str()).or_default().push(*score);
        }
    }

    let variances: Vec<f32> = series
        .values()
        .filter(|values| values.len() >= 2)
        .map(|values| {
            let n = values.len() as f32;
            let mean = values.iter().sum::<f32>() / n;
            values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n
        })
        .collect();
    let variance = if variances.is_empty() {
        0.0
    } else {
        variances.iter().sum::<f32>() / variances.len() as f32
    };

    let breach = obs.trajectory.windows(2).any(|pair| {
        pair[1].channels.iter().any(|(name, after)| {
            pair[0]
                .channels
                .get(name)
                .map(|before| (after - before).abs() > config.breach_threshold)
                .unwrap_or(false)
        })
    });

    let grounding = series
        .get(config.grounding_channel.as_str())
        .filter(|values| !values.is_empty())
        .map(|values| values.iter().sum::<f32>() / values.len() as f32)
        .unwrap_or(NEUTRAL_SCORE);

    let breach_factor = if breach { 2.0 } else { 1.0 };
    (4.0 * variance * breach_factor * (1.0 - 0.5 * grounding)).clamp(0.0, 1.0)
}

/// One-hot of length `len`, uniform when `position` is `None`.
fn one_hot(len: usize, position: Option<usize>) -> Vec<f32> {
    match position {
        Some(i) => (0..len).map(|j| if j == i { 1.0 } else { 0.0 }).collect(),
        None => vec![1.0 / len.max(1) as f32; len],
    }
}

fn finite_or<const N: usize>(mut block: [f32; N], neutral: f32) -> [f32; N] {
    for v in block.iter_mut() {
        if !v.is_finite() {
            *v = neutral;
        }
    }
    block
}
