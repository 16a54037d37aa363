// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Concrete ability behaviors.
//!
//! Each function here is the `execute` entry of one registry row. The
//! subscription plumbing has already filtered inactive owners; behaviors
//! still re-check anything their own semantics depend on (targets may have
//! moved or finished since the event was scheduled).
//!
//! Commands pushed from here carry `TriggerEmission::AfterResolution`, so
//! the `AbilityTriggered` marker fires only once the command actually does
//! something. Commandless abilities (CopyLead) emit their marker directly.

use std::collections::BTreeSet;

use crate::ability::default_abilities;
use crate::board::{SpaceModifier, SpaceModifierKind};
use crate::engine_impl::Engine;
use crate::event::{Event, EventKind, Phase, TriggerEmission};
use crate::ident::{AbilityName, ModifierName};

/// Knock every racer the owner passes back two tiles.
pub(crate) fn centaur_trample(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::Passing {
        responsible_racer_idx,
        target_racer_idx,
        tile_idx,
    } = event.kind
    else {
        return;
    };
    if responsible_racer_idx != owner || target_racer_idx == owner {
        return;
    }
    if !engine.state.racers[target_racer_idx].active() {
        return;
    }
    engine.log_info(format_args!(
        "CentaurTrample: racer #{owner} tramples racer #{target_racer_idx} on tile {tile_idx}"
    ));
    engine.push_event(Event::from_ability(
        EventKind::MoveCmd {
            target_racer_idx,
            distance: -2,
        },
        Phase::MOVE,
        AbilityName::CentaurTrample,
        owner,
        TriggerEmission::AfterResolution,
    ));
}

/// Trip racers that pass the owner's tile.
pub(crate) fn banana_trip(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::Passing {
        responsible_racer_idx,
        target_racer_idx,
        tile_idx,
    } = event.kind
    else {
        return;
    };
    if target_racer_idx != owner || responsible_racer_idx == owner {
        return;
    }
    if !engine.state.racers[responsible_racer_idx].active() {
        return;
    }
    engine.log_info(format_args!(
        "BananaTrip: racer #{owner} trips racer #{responsible_racer_idx} passing tile {tile_idx}"
    ));
    engine.push_event(Event::from_ability(
        EventKind::TripCmd {
            target_racer_idx: responsible_racer_idx,
        },
        Phase::MOVE,
        AbilityName::BananaTrip,
        owner,
        TriggerEmission::AfterResolution,
    ));
}

/// Trip the racers the owner passes. The mirror image of [`banana_trip`].
pub(crate) fn baba_yaga_trip(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::Passing {
        responsible_racer_idx,
        target_racer_idx,
        tile_idx,
    } = event.kind
    else {
        return;
    };
    if responsible_racer_idx != owner || target_racer_idx == owner {
        return;
    }
    if !engine.state.racers[target_racer_idx].active() {
        return;
    }
    engine.log_info(format_args!(
        "BabaYagaTrip: racer #{owner} trips racer #{target_racer_idx} on tile {tile_idx}"
    ));
    engine.push_event(Event::from_ability(
        EventKind::TripCmd {
            target_racer_idx,
        },
        Phase::MOVE,
        AbilityName::BabaYagaTrip,
        owner,
        TriggerEmission::AfterResolution,
    ));
}

/// Scooch one tile forward whenever someone else's ability fires.
pub(crate) fn scooch_step(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::AbilityTriggered {
        ability,
        responsible_racer_idx,
        ..
    } = event.kind
    else {
        return;
    };
    // Own triggers are ignored; without this the scooch feeds itself.
    if responsible_racer_idx == owner {
        return;
    }
    engine.log_info(format_args!(
        "ScoochStep: racer #{owner} scooches 1 after {ability}"
    ));
    engine.push_event(Event::from_ability(
        EventKind::MoveCmd {
            target_racer_idx: owner,
            distance: 1,
        },
        Phase::MOVE,
        AbilityName::ScoochStep,
        owner,
        TriggerEmission::AfterResolution,
    ));
}

/// Adopt the current leader's default abilities, keeping CopyLead itself.
pub(crate) fn copy_lead(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::TurnStart { racer_idx } = event.kind else {
        return;
    };
    if racer_idx != owner {
        return;
    }
    let max_pos = engine
        .state
        .racers
        .iter()
        .filter(|r| r.active() && r.idx != owner)
        .map(|r| r.position)
        .max();
    let Some(max_pos) = max_pos else {
        return;
    };
    let leaders: Vec<usize> = engine
        .state
        .racers
        .iter()
        .filter(|r| r.active() && r.idx != owner && r.position == max_pos)
        .map(|r| r.idx)
        .collect();
    let pick = engine.dice.choose(leaders.len());
    let leader_idx = leaders[pick];
    let leader_name = engine.state.racers[leader_idx].name;

    let mut new_abilities: BTreeSet<AbilityName> =
        default_abilities(leader_name).iter().copied().collect();
    new_abilities.insert(AbilityName::CopyLead);

    engine.log_info(format_args!(
        "CopyLead: racer #{owner} copies racer #{leader_idx} ({leader_name})"
    ));
    engine.update_racer_abilities(owner, new_abilities);
    engine.emit_ability_trigger(AbilityName::CopyLead, owner, Some(leader_idx));
}

/// Pull every other active racer one tile toward the owner.
pub(crate) fn party_pull(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::TurnStart { racer_idx } = event.kind else {
        return;
    };
    if racer_idx != owner {
        return;
    }
    let own_pos = engine.state.racers[owner].position;
    engine.log_info(format_args!(
        "PartyPull: racer #{owner} pulls the field toward tile {own_pos}"
    ));
    let pulls: Vec<(usize, i32)> = engine
        .state
        .racers
        .iter()
        .filter(|r| r.active() && r.idx != owner)
        .filter_map(|r| {
            if r.position < own_pos {
                Some((r.idx, 1))
            } else if r.position > own_pos {
                Some((r.idx, -1))
            } else {
                None
            }
        })
        .collect();
    for (target_racer_idx, distance) in pulls {
        engine.push_event(Event::from_ability(
            EventKind::MoveCmd {
                target_racer_idx,
                distance,
            },
            Phase::MOVE,
            AbilityName::PartyPull,
            owner,
            TriggerEmission::AfterResolution,
        ));
    }
}

/// Swap places with the nearest active racer strictly ahead.
pub(crate) fn flip_flop_swap(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::TurnStart { racer_idx } = event.kind else {
        return;
    };
    if racer_idx != owner {
        return;
    }
    let own_pos = engine.state.racers[owner].position;
    // Nearest ahead; ties go to the lowest index.
    let partner = engine
        .state
        .racers
        .iter()
        .filter(|r| r.active() && r.idx != owner && r.position > own_pos)
        .min_by_key(|r| (r.position, r.idx))
        .map(|r| (r.idx, r.position));
    let Some((partner_idx, partner_pos)) = partner else {
        return;
    };
    engine.log_info(format_args!(
        "FlipFlopSwap: racer #{owner} swaps tiles with racer #{partner_idx}"
    ));
    engine.push_event(Event::from_ability(
        EventKind::SimultaneousWarpCmd {
            warps: vec![(owner, partner_pos), (partner_idx, own_pos)],
        },
        Phase::MOVE,
        AbilityName::FlipFlopSwap,
        owner,
        TriggerEmission::AfterResolution,
    ));
}

/// Chase any racer that ends a move ahead of the owner.
pub(crate) fn romantic_move(engine: &mut Engine, event: &Event, owner: usize) {
    let EventKind::PostMove {
        racer_idx: mover,
        end_tile,
        ..
    } = event.kind
    else {
        return;
    };
    if mover == owner || end_tile <= engine.state.racers[owner].position {
        return;
    }
    engine.log_info(format_args!(
        "RomanticMove: racer #{owner} chases racer #{mover}"
    ));
    engine.push_event(Event::from_ability(
        EventKind::MoveCmd {
            target_racer_idx: owner,
            distance: 1,
        },
        Phase::MOVE,
        AbilityName::RomanticMove,
        owner,
        TriggerEmission::AfterResolution,
    ));
}

/// Keep the blocker under the owner as it moves.
pub(crate) fn huge_baby_push(engine: &mut Engine, event: &Event, owner: usize) {
    let moved = match event.kind {
        EventKind::PostMove { racer_idx, .. } | EventKind::PostWarp { racer_idx, .. } => {
            racer_idx == owner
        }
        _ => false,
    };
    if !moved {
        return;
    }
    relocate_blocker(engine, owner);
}

/// Attach hook: drop the blocker on the owner's starting tile.
pub(crate) fn huge_baby_attach(engine: &mut Engine, owner: usize) {
    relocate_blocker(engine, owner);
}

/// Detach hook: the blocker leaves with the ability.
pub(crate) fn huge_baby_detach(engine: &mut Engine, owner: usize) {
    engine
        .state
        .board
        .remove_dynamic_owned_by(ModifierName::HugeBabyBlocker, owner);
}

fn relocate_blocker(engine: &mut Engine, owner: usize) {
    engine
        .state
        .board
        .remove_dynamic_owned_by(ModifierName::HugeBabyBlocker, owner);
    let pos = engine.state.racers[owner].position;
    engine
        .state
        .board
        .place_dynamic(pos, SpaceModifier::owned(SpaceModifierKind::Blocker, owner));
}
