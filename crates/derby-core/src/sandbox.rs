// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Embedder boundary: race configuration, fingerprinting, and the
//! determinism harness.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::engine_impl::{Engine, EngineBuilder, EngineError};
use crate::ident::{BoardName, RacerName};
use crate::state::{GameRules, Hash};
use crate::telemetry::{RecordingSink, TraceStep};

/// Construction inputs for one race.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceConfig {
    /// The roster, in starting order.
    pub racers: Vec<RacerName>,
    /// Which board to race on.
    pub board: BoardName,
    /// Seed for the engine's dice handle.
    pub seed: u64,
    /// Rule knobs.
    pub rules: GameRules,
}

impl RaceConfig {
    /// A config with default rules.
    #[must_use]
    pub fn new(racers: Vec<RacerName>, board: BoardName, seed: u64) -> Self {
        RaceConfig {
            racers,
            board,
            seed,
            rules: GameRules::default(),
        }
    }

    /// Parses a config from string names, failing fast on unknown racers or
    /// boards.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownRacer`] or [`EngineError::UnknownBoard`] for a
    /// name with no registry entry.
    pub fn from_names(racers: &[&str], board: &str, seed: u64) -> Result<Self, EngineError> {
        let racers = racers
            .iter()
            .map(|s| RacerName::from_str(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RaceConfig::new(racers, BoardName::from_str(board)?, seed))
    }
}

/// Builds an engine for `config` with default sinks and seeded dice.
///
/// # Errors
///
/// Fails fast on an empty roster.
pub fn build_engine(config: &RaceConfig) -> Result<Engine, EngineError> {
    EngineBuilder::new(config.clone()).build()
}

/// Canonical fingerprint of a configuration, used by embedders to
/// deduplicate runs. Covers sorted racer names, the board, the seed, and
/// every rule knob; the engine itself never consults it.
#[must_use]
pub fn config_fingerprint(config: &RaceConfig) -> Hash {
    let mut h = blake3::Hasher::new();
    h.update(b"derby:config:v1");

    let mut names: Vec<&'static str> = config.racers.iter().map(|r| r.as_str()).collect();
    names.sort_unstable();
    h.update(&(names.len() as u64).to_le_bytes());
    for name in names {
        h.update(&(name.len() as u64).to_le_bytes());
        h.update(name.as_bytes());
    }

    let board = config.board.as_str();
    h.update(&(board.len() as u64).to_le_bytes());
    h.update(board.as_bytes());
    h.update(&config.seed.to_le_bytes());

    h.update(&[u8::from(config.rules.timing == crate::scheduler::TimingMode::DepthFirst)]);
    h.update(&[u8::from(config.rules.count_zero_moves_for_ability_triggered)]);
    h.update(&config.rules.finishers_to_end.to_le_bytes());
    match config.rules.max_turns {
        None => {
            h.update(&[0u8]);
        }
        Some(t) => {
            h.update(&[1u8]);
            h.update(&t.to_le_bytes());
        }
    }

    h.finalize().into()
}

fn short_hash(h: &Hash) -> String {
    hex::encode(&h[..8])
}

/// A determinism violation found by [`run_pair_determinism`].
#[derive(Debug, Error)]
pub enum DeterminismError {
    /// The engines could not be built.
    #[error(transparent)]
    Construction(#[from] EngineError),
    /// The runs dispatched different numbers of events.
    #[error("trace length mismatch: {left} vs {right} events")]
    TraceLengthMismatch {
        /// Events dispatched by the first run.
        left: usize,
        /// Events dispatched by the second run.
        right: usize,
    },
    /// The runs diverged at a specific dispatch.
    #[error(
        "trace divergence at step {step}: {left_label} [{left_hash}] vs {right_label} [{right_hash}]"
    )]
    TraceDivergence {
        /// Index of the first differing dispatch.
        step: usize,
        /// Event label in the first run.
        left_label: &'static str,
        /// Event label in the second run.
        right_label: &'static str,
        /// Short state hash after the dispatch, first run.
        left_hash: String,
        /// Short state hash after the dispatch, second run.
        right_hash: String,
    },
    /// Identical traces but different final states.
    #[error("final state hash mismatch: {left} vs {right}")]
    FinalHashMismatch {
        /// Short final hash, first run.
        left: String,
        /// Short final hash, second run.
        right: String,
    },
}

fn run_once(config: &RaceConfig) -> Result<(Vec<TraceStep>, Hash), EngineError> {
    let sink = Arc::new(RecordingSink::new());
    let mut engine = EngineBuilder::new(config.clone())
        .telemetry(Arc::clone(&sink) as Arc<dyn crate::telemetry::TelemetrySink>)
        .build()?;
    engine.run_race();
    Ok((sink.steps(), engine.state_hash()))
}

/// Runs `config` twice and compares the dispatched-event traces and the
/// per-dispatch state hashes.
///
/// # Errors
///
/// The first divergence found, or a construction error.
pub fn run_pair_determinism(config: &RaceConfig) -> Result<(), DeterminismError> {
    let (trace_a, hash_a) = run_once(config)?;
    let (trace_b, hash_b) = run_once(config)?;

    if trace_a.len() != trace_b.len() {
        return Err(DeterminismError::TraceLengthMismatch {
            left: trace_a.len(),
            right: trace_b.len(),
        });
    }
    for (step, (a, b)) in trace_a.iter().zip(&trace_b).enumerate() {
        if a != b {
            return Err(DeterminismError::TraceDivergence {
                step,
                left_label: a.label(),
                right_label: b.label(),
                left_hash: short_hash(&a.state_hash),
                right_hash: short_hash(&b.state_hash),
            });
        }
    }
    if hash_a != hash_b {
        return Err(DeterminismError::FinalHashMismatch {
            left: short_hash(&hash_a),
            right: short_hash(&hash_b),
        });
    }
    Ok(())
}
