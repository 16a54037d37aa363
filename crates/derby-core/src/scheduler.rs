// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic event scheduler.
//!
//! Ordering invariant:
//! - Scheduled events dispatch in ascending lexicographic order of
//!   (`phase`, `reactor_distance`, `serial`).
//! - `serial` is strictly monotonic per engine, so ties within a
//!   (phase, distance) pair break FIFO.
//! - `BinaryHeap` is a max-heap; [`ScheduledEvent`]'s `Ord` is reversed so
//!   the smallest key pops first.
//!
//! Two timing modes share the key. `Priority` drains one heap.
//! `DepthFirst` keeps a stack of heap frames: dispatching an event opens a
//! frame, events pushed during its handling land in that frame, and the pop
//! always takes the deepest non-empty frame — so a reaction chain fully
//! resolves before its siblings, which still order by the same key within
//! their frame.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::event::{Event, Phase};

/// Event ordering discipline.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimingMode {
    /// Single priority queue over (phase, reactor distance, serial).
    #[default]
    Priority,
    /// Depth-first: an event's reaction chain resolves before its siblings.
    DepthFirst,
}

/// A queue entry: the event plus its full ordering key and chain depth.
#[derive(Clone, Debug)]
pub(crate) struct ScheduledEvent {
    pub phase: Phase,
    pub reactor_distance: usize,
    pub serial: u64,
    pub depth: u32,
    pub event: Event,
}

impl ScheduledEvent {
    fn key(&self) -> (Phase, usize, u64) {
        (self.phase, self.reactor_distance, self.serial)
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the smallest (phase, distance, serial) must be the
        // max-heap's greatest element.
        other.key().cmp(&self.key())
    }
}

/// The engine's event queue.
#[derive(Debug)]
pub(crate) struct Scheduler {
    mode: TimingMode,
    /// `Priority` mode uses exactly one frame; `DepthFirst` grows the stack.
    frames: Vec<BinaryHeap<ScheduledEvent>>,
    serial: u64,
}

impl Scheduler {
    pub(crate) fn new(mode: TimingMode) -> Self {
        Scheduler {
            mode,
            frames: vec![BinaryHeap::new()],
            serial: 0,
        }
    }

    /// Assigns the next serial and enqueues into the current frame.
    /// Returns the assigned serial.
    pub(crate) fn push(
        &mut self,
        event: Event,
        reactor_distance: usize,
        depth: u32,
    ) -> u64 {
        self.serial += 1;
        let sched = ScheduledEvent {
            phase: event.phase,
            reactor_distance,
            serial: self.serial,
            depth,
            event,
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.push(sched);
        }
        self.serial
    }

    /// Pops the next event: the smallest key in the deepest non-empty frame.
    /// Exhausted frames collapse on the way.
    pub(crate) fn pop(&mut self) -> Option<ScheduledEvent> {
        loop {
            let frame = self.frames.last_mut()?;
            if let Some(e) = frame.pop() {
                return Some(e);
            }
            if self.frames.len() > 1 {
                self.frames.pop();
            } else {
                return None;
            }
        }
    }

    /// Marks the start of a dispatch. In depth-first mode this opens a frame
    /// that will collect the dispatched event's reactions.
    pub(crate) fn begin_dispatch(&mut self) {
        if self.mode == TimingMode::DepthFirst {
            self.frames.push(BinaryHeap::new());
        }
    }

    /// Phase of the event that would pop next, if any.
    pub(crate) fn peek_phase(&self) -> Option<Phase> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.peek().map(|e| e.phase))
    }

    /// Drops every pending event. Serials keep counting.
    pub(crate) fn clear(&mut self) {
        self.frames.clear();
        self.frames.push(BinaryHeap::new());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.iter().all(BinaryHeap::is_empty)
    }

    /// Pending events across every frame.
    pub(crate) fn len(&self) -> usize {
        self.frames.iter().map(BinaryHeap::len).sum()
    }
}
