// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-level repetition guard.
//!
//! Abilities may cross-trigger without limit (a scooch reacting to a trigger
//! that a scooch produced), so every dispatch passes four independent
//! checks. A failing check skips the event with a logged reason; it never
//! aborts the race. All guard state clears at turn start.
//!
//! The four levels, most precise first:
//! 1. exact recurrence of the full state signature within the turn,
//! 2. a positional tuple repeating more than `max_positional_repeats` times,
//! 3. the same (event kind, target, source) signature appearing more than
//!    `max_event_frequency` times inside a sliding serial window,
//! 4. a reaction chain deeper than `max_depth`.

use std::fmt;
use std::hash::{Hash as _, Hasher as _};

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::event::EventTag;
use crate::ident::Source;
use crate::scheduler::ScheduledEvent;
use crate::state::{GameState, Hash};

/// Tunable guard limits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopLimits {
    /// Times the same positional tuple may recur within a turn.
    pub max_positional_repeats: u32,
    /// Width of the event-frequency window, in serials.
    pub event_window_size: u64,
    /// Occurrences of one event signature allowed inside the window.
    pub max_event_frequency: usize,
    /// Maximum reaction-chain depth.
    pub max_depth: u32,
}

impl Default for LoopLimits {
    fn default() -> Self {
        LoopLimits {
            max_positional_repeats: 3,
            event_window_size: 50,
            max_event_frequency: 10,
            max_depth: 150,
        }
    }
}

/// Why an event was skipped.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SkipReason {
    /// The full state signature recurred exactly.
    ExactStateRepetition,
    /// The positional tuple recurred too often (count attached).
    PositionalRepetition(u32),
    /// One event signature saturated the sliding window (count attached).
    EventFrequency(usize),
    /// The reaction chain exceeded the depth limit (depth attached).
    DepthExceeded(u32),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExactStateRepetition => f.write_str("exact state repetition"),
            SkipReason::PositionalRepetition(n) => {
                write!(f, "positional repetition (seen {n} times)")
            }
            SkipReason::EventFrequency(n) => {
                write!(f, "event frequency (same event {n} times in window)")
            }
            SkipReason::DepthExceeded(d) => write!(f, "event depth exceeded ({d})"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct EventSignature {
    tag: EventTag,
    target: Option<usize>,
    source: Source,
}

/// Per-turn guard state.
#[derive(Debug)]
pub(crate) struct LoopDetector {
    limits: LoopLimits,
    full_history: FxHashSet<Hash>,
    positional_counts: FxHashMap<u64, u32>,
    event_frequency: FxHashMap<EventSignature, Vec<u64>>,
}

impl LoopDetector {
    pub(crate) fn new(limits: LoopLimits) -> Self {
        LoopDetector {
            limits,
            full_history: FxHashSet::default(),
            positional_counts: FxHashMap::default(),
            event_frequency: FxHashMap::default(),
        }
    }

    /// Resets all guard state. Called at turn start.
    pub(crate) fn clear(&mut self) {
        self.full_history.clear();
        self.positional_counts.clear();
        self.event_frequency.clear();
    }

    /// Runs all four levels against the event about to dispatch.
    /// `next_phase` and `queue_len` describe the queue after the pop; the
    /// queue's shape is part of the full signature so that consecutive
    /// state-preserving dispatches (a burst of passings, say) don't collide.
    pub(crate) fn check(
        &mut self,
        state: &GameState,
        next_phase: Option<crate::event::Phase>,
        queue_len: usize,
        sched: &ScheduledEvent,
    ) -> Option<SkipReason> {
        // Level 1: exact full-state recurrence.
        let full = full_signature(state, next_phase, queue_len, sched.event.kind.tag());
        if !self.full_history.insert(full) {
            return Some(SkipReason::ExactStateRepetition);
        }

        // Level 2: positional tuples may legitimately repeat a few times
        // during reaction chains; count them.
        let positional = positional_signature(state, next_phase);
        let count = self
            .positional_counts
            .entry(positional)
            .and_modify(|c| *c += 1)
            .or_insert(1);
        if *count > self.limits.max_positional_repeats {
            return Some(SkipReason::PositionalRepetition(*count));
        }

        // Level 3: sliding-window frequency of one event signature.
        let sig = EventSignature {
            tag: sched.event.kind.tag(),
            target: sched.event.kind.target_racer_idx(),
            source: sched.event.source,
        };
        let window_floor = sched.serial.saturating_sub(self.limits.event_window_size);
        let serials = self.event_frequency.entry(sig).or_default();
        serials.push(sched.serial);
        serials.retain(|&s| s >= window_floor);
        if serials.len() > self.limits.max_event_frequency {
            return Some(SkipReason::EventFrequency(serials.len()));
        }

        // Level 4: chain-depth circuit breaker.
        if sched.depth > self.limits.max_depth {
            return Some(SkipReason::DepthExceeded(sched.depth));
        }

        None
    }
}

/// Full signature: the canonical state hash folded with the turn cursor,
/// the dispatched event's kind, and the remaining queue's shape (length and
/// next phase). Identical signatures mean the dispatch cannot make progress
/// the previous occurrence didn't already make.
fn full_signature(
    state: &GameState,
    next_phase: Option<crate::event::Phase>,
    queue_len: usize,
    tag: EventTag,
) -> Hash {
    let mut h = blake3::Hasher::new();
    h.update(&state.state_hash());
    h.update(&(state.current_racer_idx as u64).to_le_bytes());
    h.update(tag.as_str().as_bytes());
    h.update(&(queue_len as u64).to_le_bytes());
    match next_phase {
        None => {
            h.update(&[0xffu8, 0]);
        }
        Some(p) => {
            h.update(&[1u8, p.0]);
        }
    }
    h.finalize().into()
}

/// Positional signature: positions, activity, trip flags, and main-move
/// consumption, plus the cursor and next phase. Cheaper and deliberately
/// blind to VP and modifier churn, which is what lets it catch loops whose
/// queue keeps growing.
fn positional_signature(state: &GameState, next_phase: Option<crate::event::Phase>) -> u64 {
    let mut h = FxHasher::default();
    for r in &state.racers {
        (r.idx, r.position, r.active(), r.tripped, r.main_move_consumed).hash(&mut h);
    }
    state.current_racer_idx.hash(&mut h);
    next_phase.map(|p| p.0).hash(&mut h);
    h.finish()
}
