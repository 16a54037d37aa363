// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Telemetry sinks.
//!
//! The engine reports through an injected [`TelemetrySink`]; collectors live
//! with the embedder. Two implementations ship here: [`MetricsRecorder`]
//! accumulates the per-racer counters a batch runner wants, and
//! [`RecordingSink`] captures the dispatched-event trace with a state hash
//! per step, which is what the determinism harness compares.

use std::sync::Mutex;

use crate::event::{Event, EventKind};
use crate::ident::RacerName;
use crate::loop_detection::SkipReason;
use crate::state::{GameState, Hash};

/// Observer of engine progress. All hooks default to no-ops.
pub trait TelemetrySink: Send + Sync {
    /// Called after each dispatched event, with the post-dispatch state.
    fn on_event(&self, event: &Event, state: &GameState, turn_index: u32) {
        let _ = (event, state, turn_index);
    }

    /// Called when the loop guard skips an event.
    fn on_event_skipped(&self, event: &Event, reason: &SkipReason, turn_index: u32) {
        let _ = (event, reason, turn_index);
    }

    /// Called after the queue drains, before the cursor advances.
    fn on_turn_end(&self, state: &GameState, turn_index: u32) {
        let _ = (state, turn_index);
    }

    /// Called once when the race loop exits.
    fn on_race_end(&self, state: &GameState) {
        let _ = state;
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {}

/// Final per-racer counters, ready for a results table.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RacerResult {
    /// Roster index.
    pub racer_idx: usize,
    /// Racer identity.
    pub racer_name: RacerName,
    /// Times this racer's abilities fired.
    pub ability_trigger_count: u64,
    /// Times this racer was the target of someone else's ability.
    pub ability_target_count: u64,
    /// Times this racer's abilities targeted itself.
    pub ability_self_target_count: u64,
    /// Turns spent standing up from trips.
    pub recovery_turns: u64,
    /// Turns in which this racer acted.
    pub turns_taken: u64,
    /// Sum of raw d6 samples across the racer's turns.
    pub sum_dice_rolled: u64,
    /// Victory points at race end.
    pub final_vp: u32,
    /// Whether the racer crossed the finish tile.
    pub finished: bool,
    /// 1-based place, when finished.
    pub finish_position: Option<u32>,
    /// Whether the racer was eliminated.
    pub eliminated: bool,
}

impl RacerResult {
    fn new(racer_idx: usize, racer_name: RacerName) -> Self {
        RacerResult {
            racer_idx,
            racer_name,
            ability_trigger_count: 0,
            ability_target_count: 0,
            ability_self_target_count: 0,
            recovery_turns: 0,
            turns_taken: 0,
            sum_dice_rolled: 0,
            final_vp: 0,
            finished: false,
            finish_position: None,
            eliminated: false,
        }
    }
}

/// One turn's key outcome.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnRecord {
    /// Turn counter at the time.
    pub turn_index: u32,
    /// The racer that acted.
    pub racer_idx: usize,
    /// Raw d6 sample for the turn (0 when the turn had no roll).
    pub dice_roll: u32,
}

#[derive(Debug, Default)]
struct MetricsInner {
    results: Vec<RacerResult>,
    turn_history: Vec<TurnRecord>,
}

/// Accumulates per-racer counters over one race.
///
/// Attach via [`EngineBuilder::telemetry`](crate::EngineBuilder::telemetry),
/// run the race, then call [`MetricsRecorder::finalize`] with the end state.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    inner: Mutex<MetricsInner>,
}

impl MetricsRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        MetricsRecorder::default()
    }

    fn with_result<F: FnOnce(&mut RacerResult)>(&self, state: &GameState, idx: usize, f: F) {
        if let Ok(mut g) = self.inner.lock() {
            if g.results.is_empty() {
                g.results = state
                    .racers
                    .iter()
                    .map(|r| RacerResult::new(r.idx, r.name))
                    .collect();
            }
            if let Some(r) = g.results.get_mut(idx) {
                f(r);
            }
        }
    }

    /// Snapshot of the turn history so far.
    #[must_use]
    pub fn turn_history(&self) -> Vec<TurnRecord> {
        self.inner
            .lock()
            .map(|g| g.turn_history.clone())
            .unwrap_or_default()
    }

    /// Folds the end state into the counters and returns the results, in
    /// roster order.
    #[must_use]
    pub fn finalize(&self, state: &GameState) -> Vec<RacerResult> {
        let mut out = self
            .inner
            .lock()
            .map(|g| g.results.clone())
            .unwrap_or_default();
        if out.is_empty() {
            out = state
                .racers
                .iter()
                .map(|r| RacerResult::new(r.idx, r.name))
                .collect();
        }
        for (result, racer) in out.iter_mut().zip(&state.racers) {
            result.final_vp = racer.victory_points;
            result.finished = racer.finished();
            result.finish_position = racer.finish_position;
            result.eliminated = racer.eliminated;
        }
        out
    }
}

impl TelemetrySink for MetricsRecorder {
    fn on_event(&self, event: &Event, state: &GameState, _turn_index: u32) {
        match event.kind {
            EventKind::AbilityTriggered {
                responsible_racer_idx,
                target_racer_idx,
                ..
            } => {
                self.with_result(state, responsible_racer_idx, |r| {
                    r.ability_trigger_count += 1;
                    if target_racer_idx == Some(responsible_racer_idx) {
                        r.ability_self_target_count += 1;
                    }
                });
                if let Some(target) = target_racer_idx {
                    if target != responsible_racer_idx {
                        self.with_result(state, target, |r| r.ability_target_count += 1);
                    }
                }
            }
            EventKind::TripRecovery { target_racer_idx } => {
                self.with_result(state, target_racer_idx, |r| r.recovery_turns += 1);
            }
            _ => {}
        }
    }

    fn on_turn_end(&self, state: &GameState, turn_index: u32) {
        let racer_idx = state.current_racer_idx;
        let dice_roll = state.roll_state.base_value;
        self.with_result(state, racer_idx, |r| {
            r.turns_taken += 1;
            r.sum_dice_rolled += u64::from(dice_roll);
        });
        if let Ok(mut g) = self.inner.lock() {
            g.turn_history.push(TurnRecord {
                turn_index,
                racer_idx,
                dice_roll,
            });
        }
    }
}

/// One step of a recorded trace: the dispatched event and the state hash
/// immediately after it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TraceStep {
    /// Turn counter at dispatch.
    pub turn_index: u32,
    /// The dispatched event, verbatim.
    pub event: Event,
    /// Canonical state hash after the dispatch.
    pub state_hash: Hash,
}

impl TraceStep {
    /// Stable label of the dispatched event.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.event.kind.tag().as_str()
    }
}

/// Records the full dispatched-event trace for determinism comparison.
#[derive(Debug, Default)]
pub struct RecordingSink {
    steps: Mutex<Vec<TraceStep>>,
}

impl RecordingSink {
    /// Creates an empty trace recorder.
    #[must_use]
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// Snapshot of the recorded steps.
    #[must_use]
    pub fn steps(&self) -> Vec<TraceStep> {
        self.steps.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl TelemetrySink for RecordingSink {
    fn on_event(&self, event: &Event, state: &GameState, turn_index: u32) {
        if let Ok(mut g) = self.steps.lock() {
            g.push(TraceStep {
                turn_index,
                event: event.clone(),
                state_hash: state.state_hash(),
            });
        }
    }
}
