// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event model: tagged kinds plus scheduling metadata.
//!
//! Events travel on exactly two paths, kept deliberately distinct:
//!
//! - **Scheduled**: pushed onto the priority queue via
//!   [`Engine::push_event`](crate::Engine::push_event) and dispatched in
//!   (phase, reactor distance, serial) order.
//! - **Synchronous**: departure/arrival notifications
//!   (`PreMove`/`PostMove`/`PreWarp`/`PostWarp`) are published inline to
//!   subscribers during command handling and never enter the queue.
//!
//! There is no unified "emit"; the two paths have different ordering
//! semantics and conflating them would hide that.

use crate::ident::{AbilityName, Source};

/// Coarse ordering tier for scheduled events. Lower phases dispatch first
/// within a turn.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Phase(pub u8);

impl Phase {
    /// Turn-driver plumbing: turn start, the main roll.
    pub const SYSTEM: Phase = Phase(0);
    /// Board tile reactions (trips, deltas).
    pub const BOARD: Phase = Phase(10);
    /// Ability reactions and trigger markers.
    pub const ABILITY: Phase = Phase(20);
    /// Movement and other commands.
    pub const MOVE: Phase = Phase(30);
    /// End-of-turn housekeeping.
    pub const CLEANUP: Phase = Phase(100);
}

/// Whether resolving a command emits an `AbilityTriggered` marker.
///
/// Commands issued by abilities carry `AfterResolution` so the trigger fires
/// only once the command has actually done something; system and board
/// commands carry `Never`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerEmission {
    /// Never emit a trigger for this event.
    #[default]
    Never,
    /// Emit `AbilityTriggered` after the command resolves (for zero-distance
    /// resolutions, only when the rules count zero moves).
    AfterResolution,
}

/// The closed set of event payloads.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// Fired once per turn for the acting racer, before any roll.
    TurnStart {
        /// The acting racer.
        racer_idx: usize,
    },
    /// Samples the dice and pushes the resulting main move.
    RollAndMainMove {
        /// The rolling racer.
        racer_idx: usize,
    },
    /// Request to move a racer by a signed tile distance.
    MoveCmd {
        /// The racer being moved.
        target_racer_idx: usize,
        /// Signed distance in tiles.
        distance: i32,
    },
    /// Teleport a racer to an absolute tile.
    WarpCmd {
        /// The racer being warped.
        target_racer_idx: usize,
        /// Destination tile.
        target_tile: usize,
    },
    /// Atomic multi-racer warp: all survivors commit before any landing hook
    /// runs.
    SimultaneousWarpCmd {
        /// `(racer_idx, target_tile)` pairs.
        warps: Vec<(usize, usize)>,
    },
    /// Mark a racer tripped. A no-op on inactive or already-tripped racers.
    TripCmd {
        /// The racer to trip.
        target_racer_idx: usize,
    },
    /// Departure notification, published synchronously before resolution.
    PreMove {
        /// The moving racer.
        racer_idx: usize,
        /// Tile the move starts from.
        start_tile: usize,
        /// Requested signed distance.
        distance: i32,
    },
    /// Arrival notification, published synchronously after the commit and
    /// landing hooks.
    PostMove {
        /// The racer that moved.
        racer_idx: usize,
        /// Tile the move started from.
        start_tile: usize,
        /// Tile the move ended on.
        end_tile: usize,
    },
    /// Departure notification for a warp.
    PreWarp {
        /// The warping racer.
        racer_idx: usize,
        /// Tile the warp starts from.
        start_tile: usize,
        /// Requested destination tile (pre-resolution).
        target_tile: usize,
    },
    /// Arrival notification for a warp.
    PostWarp {
        /// The racer that warped.
        racer_idx: usize,
        /// Tile the warp started from.
        start_tile: usize,
        /// Tile the warp ended on.
        end_tile: usize,
    },
    /// The mover passed through a tile occupied by another racer.
    Passing {
        /// The moving racer.
        responsible_racer_idx: usize,
        /// The racer being passed.
        target_racer_idx: usize,
        /// The tile passed through.
        tile_idx: usize,
    },
    /// Marker event chaining reactions and feeding trigger counts.
    AbilityTriggered {
        /// Which ability fired.
        ability: AbilityName,
        /// The ability's owner.
        responsible_racer_idx: usize,
        /// The racer the ability acted on, if any.
        target_racer_idx: Option<usize>,
    },
    /// Fired on the turn a racer stands up from being tripped.
    TripRecovery {
        /// The recovering racer.
        target_racer_idx: usize,
    },
}

impl EventKind {
    /// The payload-free tag of this kind, used to index subscription slots.
    #[must_use]
    pub fn tag(&self) -> EventTag {
        match self {
            EventKind::TurnStart { .. } => EventTag::TurnStart,
            EventKind::RollAndMainMove { .. } => EventTag::RollAndMainMove,
            EventKind::MoveCmd { .. } => EventTag::MoveCmd,
            EventKind::WarpCmd { .. } => EventTag::WarpCmd,
            EventKind::SimultaneousWarpCmd { .. } => EventTag::SimultaneousWarpCmd,
            EventKind::TripCmd { .. } => EventTag::TripCmd,
            EventKind::PreMove { .. } => EventTag::PreMove,
            EventKind::PostMove { .. } => EventTag::PostMove,
            EventKind::PreWarp { .. } => EventTag::PreWarp,
            EventKind::PostWarp { .. } => EventTag::PostWarp,
            EventKind::Passing { .. } => EventTag::Passing,
            EventKind::AbilityTriggered { .. } => EventTag::AbilityTriggered,
            EventKind::TripRecovery { .. } => EventTag::TripRecovery,
        }
    }

    /// The racer this event targets, when it has one.
    #[must_use]
    pub fn target_racer_idx(&self) -> Option<usize> {
        match self {
            EventKind::TurnStart { racer_idx }
            | EventKind::RollAndMainMove { racer_idx }
            | EventKind::PreMove { racer_idx, .. }
            | EventKind::PostMove { racer_idx, .. }
            | EventKind::PreWarp { racer_idx, .. }
            | EventKind::PostWarp { racer_idx, .. }
            | EventKind::MoveCmd {
                target_racer_idx: racer_idx,
                ..
            }
            | EventKind::WarpCmd {
                target_racer_idx: racer_idx,
                ..
            }
            | EventKind::TripCmd {
                target_racer_idx: racer_idx,
            }
            | EventKind::Passing {
                target_racer_idx: racer_idx,
                ..
            }
            | EventKind::TripRecovery {
                target_racer_idx: racer_idx,
            } => Some(*racer_idx),
            EventKind::AbilityTriggered {
                target_racer_idx, ..
            } => *target_racer_idx,
            EventKind::SimultaneousWarpCmd { .. } => None,
        }
    }
}

/// Payload-free event discriminant. Indexes the fixed-size subscription
/// table, so the variant order is load-bearing for nothing except
/// [`EventTag::COUNT`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventTag {
    /// See [`EventKind::TurnStart`].
    TurnStart,
    /// See [`EventKind::RollAndMainMove`].
    RollAndMainMove,
    /// See [`EventKind::MoveCmd`].
    MoveCmd,
    /// See [`EventKind::WarpCmd`].
    WarpCmd,
    /// See [`EventKind::SimultaneousWarpCmd`].
    SimultaneousWarpCmd,
    /// See [`EventKind::TripCmd`].
    TripCmd,
    /// See [`EventKind::PreMove`].
    PreMove,
    /// See [`EventKind::PostMove`].
    PostMove,
    /// See [`EventKind::PreWarp`].
    PreWarp,
    /// See [`EventKind::PostWarp`].
    PostWarp,
    /// See [`EventKind::Passing`].
    Passing,
    /// See [`EventKind::AbilityTriggered`].
    AbilityTriggered,
    /// See [`EventKind::TripRecovery`].
    TripRecovery,
}

impl EventTag {
    /// Number of event kinds; sizes the subscription table.
    pub const COUNT: usize = 13;

    /// Stable label for telemetry and loop-detection signatures.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventTag::TurnStart => "TurnStart",
            EventTag::RollAndMainMove => "RollAndMainMove",
            EventTag::MoveCmd => "MoveCmd",
            EventTag::WarpCmd => "WarpCmd",
            EventTag::SimultaneousWarpCmd => "SimultaneousWarpCmd",
            EventTag::TripCmd => "TripCmd",
            EventTag::PreMove => "PreMove",
            EventTag::PostMove => "PostMove",
            EventTag::PreWarp => "PreWarp",
            EventTag::PostWarp => "PostWarp",
            EventTag::Passing => "Passing",
            EventTag::AbilityTriggered => "AbilityTriggered",
            EventTag::TripRecovery => "TripRecovery",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// An immutable event record: a payload plus scheduling metadata.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// The tagged payload.
    pub kind: EventKind,
    /// Ordering tier on the queue.
    pub phase: Phase,
    /// Provenance tag.
    pub source: Source,
    /// Racer whose reaction this is; orders the queue by turn distance.
    /// `None` schedules at distance zero.
    pub responsible_racer_idx: Option<usize>,
    /// Trigger-marker discipline for command resolution.
    pub emit_ability_triggered: TriggerEmission,
}

impl Event {
    /// A system event (turn driver, dice pipeline) with no trigger emission.
    #[must_use]
    pub fn system(kind: EventKind, phase: Phase, responsible: Option<usize>) -> Self {
        Event {
            kind,
            phase,
            source: Source::System,
            responsible_racer_idx: responsible,
            emit_ability_triggered: TriggerEmission::Never,
        }
    }

    /// An event issued by an ability on behalf of `owner_idx`.
    #[must_use]
    pub fn from_ability(
        kind: EventKind,
        phase: Phase,
        ability: AbilityName,
        owner_idx: usize,
        emission: TriggerEmission,
    ) -> Self {
        Event {
            kind,
            phase,
            source: Source::Ability(ability),
            responsible_racer_idx: Some(owner_idx),
            emit_ability_triggered: emission,
        }
    }

    /// An event issued by a board or tile modifier. Board events never emit
    /// trigger markers.
    #[must_use]
    pub fn from_board(kind: EventKind, phase: Phase, source: Source) -> Self {
        Event {
            kind,
            phase,
            source,
            responsible_racer_idx: None,
            emit_ability_triggered: TriggerEmission::Never,
        }
    }
}

/// The in-flight main-move dice query.
///
/// Roll-modification modifiers append signed deltas; the final distance
/// floors at zero.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveDistanceQuery {
    /// The racer whose main move is being resolved.
    pub racer_idx: usize,
    /// The raw d6 sample.
    pub base_roll: u32,
    /// Signed deltas appended by modifiers, in application order.
    pub modifiers: Vec<i32>,
}

impl MoveDistanceQuery {
    /// Starts a query for `racer_idx` with the sampled `base_roll`.
    #[must_use]
    pub fn new(racer_idx: usize, base_roll: u32) -> Self {
        MoveDistanceQuery {
            racer_idx,
            base_roll,
            modifiers: Vec::new(),
        }
    }

    /// The resolved distance: `max(0, base + Σ modifiers)`.
    #[must_use]
    pub fn final_value(&self) -> u32 {
        let sum: i64 = i64::from(self.base_roll) + self.modifiers.iter().map(|&m| i64::from(m)).sum::<i64>();
        u32::try_from(sum.max(0)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_value_floors_at_zero() {
        let mut q = MoveDistanceQuery::new(0, 2);
        q.modifiers.push(-5);
        assert_eq!(q.final_value(), 0);
        q.modifiers.push(4);
        assert_eq!(q.final_value(), 1);
    }

    #[test]
    fn tags_cover_every_kind() {
        let kinds = [
            EventKind::TurnStart { racer_idx: 0 },
            EventKind::RollAndMainMove { racer_idx: 0 },
            EventKind::MoveCmd {
                target_racer_idx: 0,
                distance: 1,
            },
            EventKind::WarpCmd {
                target_racer_idx: 0,
                target_tile: 1,
            },
            EventKind::SimultaneousWarpCmd { warps: vec![] },
            EventKind::TripCmd {
                target_racer_idx: 0,
            },
            EventKind::PreMove {
                racer_idx: 0,
                start_tile: 0,
                distance: 1,
            },
            EventKind::PostMove {
                racer_idx: 0,
                start_tile: 0,
                end_tile: 1,
            },
            EventKind::PreWarp {
                racer_idx: 0,
                start_tile: 0,
                target_tile: 1,
            },
            EventKind::PostWarp {
                racer_idx: 0,
                start_tile: 0,
                end_tile: 1,
            },
            EventKind::Passing {
                responsible_racer_idx: 0,
                target_racer_idx: 1,
                tile_idx: 2,
            },
            EventKind::AbilityTriggered {
                ability: crate::AbilityName::ScoochStep,
                responsible_racer_idx: 0,
                target_racer_idx: None,
            },
            EventKind::TripRecovery {
                target_racer_idx: 0,
            },
        ];
        let mut seen = [false; EventTag::COUNT];
        for k in &kinds {
            seen[k.tag().index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
