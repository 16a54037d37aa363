// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! derby-core: deterministic turn-based race engine.
//!
//! The engine simulates a racing board game in which racer abilities react to
//! one another through a priority-queue scheduler. Given the same roster,
//! board, rules, and seed, two runs produce byte-identical event traces and
//! state hashes; see [`run_pair_determinism`] for the harness that enforces
//! this.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod ability;
mod abilities;
mod board;
mod constants;
mod engine_impl;
mod event;
mod flow;
mod ident;
mod log;
mod loop_detection;
mod movement;
mod rng;
mod rolls;
mod sandbox;
mod scheduler;
mod state;
mod telemetry;

// Re-exports for stable public API
/// Ability registry introspection (default ability sets, trigger tables).
pub use ability::{default_abilities, AbilityDescriptor};
/// Board, tiles, and the space-modifier plane.
pub use board::{Board, SpaceModifier, SpaceModifierKind};
/// Canonical constants (victory points, finisher policy, resolution caps).
pub use constants::{DEFAULT_FINISHERS_TO_END, MAX_APPROACH_ITERATIONS, WIN_VP};
/// The engine, its builder, and its error type.
pub use engine_impl::{Engine, EngineBuilder, EngineError};
/// Event model: tagged kinds, scheduling metadata, the dice query.
pub use event::{Event, EventKind, EventTag, MoveDistanceQuery, Phase, TriggerEmission};
/// Name enums and source tags.
pub use ident::{AbilityName, BoardName, ModifierName, RacerName, Source};
/// Injected logging boundary (discarded when absent).
pub use log::{BufferLogSink, LogLevel, LogSink, NullLogSink};
/// Loop-detection limits and skip reasons.
pub use loop_detection::{LoopLimits, SkipReason};
/// Deterministic dice handles.
pub use rng::{DiceRoller, ScriptedDice, XorShift64Dice};
/// Embedder boundary: config, fingerprinting, determinism harness.
pub use sandbox::{
    build_engine, config_fingerprint, run_pair_determinism, DeterminismError, RaceConfig,
};
/// Scheduler timing modes.
pub use scheduler::TimingMode;
/// Game state: racers, rules, roll state, racer-scoped modifiers.
pub use state::{
    GameRules, GameState, Hash, RacerModifier, RacerModifierKind, RacerState, RollState,
};
/// Telemetry sinks and the per-racer metrics recorder.
pub use telemetry::{
    MetricsRecorder, NullTelemetrySink, RacerResult, RecordingSink, TelemetrySink, TraceStep,
    TurnRecord,
};
