// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command resolution: moves, warps, simultaneous warps, trips.
//!
//! Every handler follows the same spine: inactive targets drop silently,
//! departure hooks publish synchronously, the board's approach hooks decide
//! where the mover actually lands, the commit happens in one place, then the
//! finish check, landing hooks, and arrival hooks run in that order. A
//! command that resolves to no movement returns before any hook besides the
//! departure one.

use crate::event::{Event, EventKind, Phase, TriggerEmission};
use crate::flow;
use crate::ident::Source;

use crate::engine_impl::Engine;

/// Emits the command's `AbilityTriggered` marker per its discipline.
///
/// `acted` is whether the command changed anything; zero-distance
/// resolutions only emit when the rules count them.
fn emit_resolution_trigger(
    engine: &mut Engine,
    event: &Event,
    target: Option<usize>,
    acted: bool,
) {
    if event.emit_ability_triggered != TriggerEmission::AfterResolution {
        return;
    }
    let Source::Ability(ability) = event.source else {
        return;
    };
    let Some(responsible) = event.responsible_racer_idx else {
        return;
    };
    if !acted && !engine.state.rules.count_zero_moves_for_ability_triggered {
        return;
    }
    engine.emit_ability_trigger(ability, responsible, target);
}

/// Resolves a `MoveCmd`.
pub(crate) fn handle_move_cmd(engine: &mut Engine, event: &Event) {
    let EventKind::MoveCmd {
        target_racer_idx: idx,
        distance,
    } = event.kind
    else {
        return;
    };
    if !engine.state.racers.get(idx).is_some_and(|r| r.active()) {
        return;
    }
    let start = engine.state.racers[idx].position;

    // Moving 0 is not moving at all.
    if distance == 0 {
        emit_resolution_trigger(engine, event, Some(idx), false);
        return;
    }

    engine.publish_to_subscribers(&Event {
        kind: EventKind::PreMove {
            racer_idx: idx,
            start_tile: start,
            distance,
        },
        phase: event.phase,
        source: event.source,
        responsible_racer_idx: event.responsible_racer_idx,
        emit_ability_triggered: TriggerEmission::Never,
    });

    let intended = start as i64 + i64::from(distance);
    let resolved =
        engine
            .state
            .board
            .resolve_position(&engine.state, intended, idx, engine.log.as_ref());
    let end = if resolved < 0 {
        engine.log_info(format_args!(
            "Move: racer #{idx} would end at {resolved}; clamping to tile 0"
        ));
        0
    } else {
        usize::try_from(resolved).unwrap_or(0)
    };

    // Fully blocked back to the start counts as no movement.
    if end == start {
        emit_resolution_trigger(engine, event, Some(idx), false);
        return;
    }

    engine.log_info(format_args!(
        "Move: racer #{idx} {start}->{end} ({})",
        event.source
    ));

    // Passing notifications for every occupied tile strictly between start
    // and end, scheduled so each one orders like any other reaction.
    let step: i64 = if end > start { 1 } else { -1 };
    let mut tile = start as i64 + step;
    while tile != end as i64 {
        if let Ok(tile_idx) = usize::try_from(tile) {
            if tile_idx < engine.state.board.length() {
                let passed: Vec<usize> = engine
                    .state
                    .racers
                    .iter()
                    .filter(|r| r.active() && r.idx != idx && r.position == tile_idx)
                    .map(|r| r.idx)
                    .collect();
                for target in passed {
                    engine.push_event(Event {
                        kind: EventKind::Passing {
                            responsible_racer_idx: idx,
                            target_racer_idx: target,
                            tile_idx,
                        },
                        phase: Phase::ABILITY,
                        source: event.source,
                        responsible_racer_idx: Some(idx),
                        emit_ability_triggered: TriggerEmission::Never,
                    });
                }
            }
        }
        tile += step;
    }

    engine.state.racers[idx].position = end;

    if !flow::check_finish(engine, idx) {
        engine.trigger_on_land(end, idx);
        engine.publish_to_subscribers(&Event {
            kind: EventKind::PostMove {
                racer_idx: idx,
                start_tile: start,
                end_tile: end,
            },
            phase: event.phase,
            source: event.source,
            responsible_racer_idx: event.responsible_racer_idx,
            emit_ability_triggered: TriggerEmission::Never,
        });
    }

    emit_resolution_trigger(engine, event, Some(idx), true);
}

/// Resolves a `WarpCmd`. Warps are discontinuous: no passing notifications.
pub(crate) fn handle_warp_cmd(engine: &mut Engine, event: &Event) {
    let EventKind::WarpCmd {
        target_racer_idx: idx,
        target_tile,
    } = event.kind
    else {
        return;
    };
    if !engine.state.racers.get(idx).is_some_and(|r| r.active()) {
        return;
    }
    let start = engine.state.racers[idx].position;

    // Warping to the same tile is not movement.
    if start == target_tile {
        emit_resolution_trigger(engine, event, Some(idx), false);
        return;
    }

    engine.publish_to_subscribers(&Event {
        kind: EventKind::PreWarp {
            racer_idx: idx,
            start_tile: start,
            target_tile,
        },
        phase: event.phase,
        source: event.source,
        responsible_racer_idx: event.responsible_racer_idx,
        emit_ability_triggered: TriggerEmission::Never,
    });

    let resolved = engine.state.board.resolve_position(
        &engine.state,
        target_tile as i64,
        idx,
        engine.log.as_ref(),
    );
    let end = if resolved < 0 {
        engine.log_info(format_args!(
            "Warp: racer #{idx} would end at {resolved}; clamping to tile 0"
        ));
        0
    } else {
        usize::try_from(resolved).unwrap_or(0)
    };
    if end == start {
        emit_resolution_trigger(engine, event, Some(idx), false);
        return;
    }

    engine.log_info(format_args!(
        "Warp: racer #{idx} {start}->{end} ({})",
        event.source
    ));
    engine.state.racers[idx].position = end;

    if !flow::check_finish(engine, idx) {
        engine.trigger_on_land(end, idx);
        engine.publish_to_subscribers(&Event {
            kind: EventKind::PostWarp {
                racer_idx: idx,
                start_tile: start,
                end_tile: end,
            },
            phase: event.phase,
            source: event.source,
            responsible_racer_idx: event.responsible_racer_idx,
            emit_ability_triggered: TriggerEmission::Never,
        });
    }

    emit_resolution_trigger(engine, event, Some(idx), true);
}

/// Resolves a `SimultaneousWarpCmd` in two passes: resolve-and-filter, then
/// an atomic commit, then landing/arrival hooks per survivor. Observers in
/// the hook pass always see the fully committed board.
pub(crate) fn handle_simultaneous_warp_cmd(engine: &mut Engine, event: &Event) {
    let EventKind::SimultaneousWarpCmd { warps } = &event.kind else {
        return;
    };

    // Pass 1: resolve targets against the pre-commit board, dropping
    // inactive racers and no-op warps.
    let mut survivors: Vec<(usize, usize, usize)> = Vec::new();
    for &(idx, target) in warps {
        if !engine.state.racers.get(idx).is_some_and(|r| r.active()) {
            continue;
        }
        let from = engine.state.racers[idx].position;
        let resolved = engine.state.board.resolve_position(
            &engine.state,
            target as i64,
            idx,
            engine.log.as_ref(),
        );
        let to = if resolved < 0 {
            0
        } else {
            usize::try_from(resolved).unwrap_or(0)
        };
        if to == from {
            continue;
        }
        survivors.push((idx, from, to));
    }

    if survivors.is_empty() {
        emit_resolution_trigger(engine, event, None, false);
        return;
    }

    for &(idx, from, to) in &survivors {
        engine.publish_to_subscribers(&Event {
            kind: EventKind::PreWarp {
                racer_idx: idx,
                start_tile: from,
                target_tile: to,
            },
            phase: event.phase,
            source: event.source,
            responsible_racer_idx: event.responsible_racer_idx,
            emit_ability_triggered: TriggerEmission::Never,
        });
    }

    // Pass 2: commit every position before any landing hook runs.
    for &(idx, _, to) in &survivors {
        engine.log_info(format_args!(
            "Warp: racer #{idx} -> {to} ({})",
            event.source
        ));
        engine.state.racers[idx].position = to;
    }

    // Pass 3: landing and arrival hooks in collected order.
    for &(idx, from, to) in &survivors {
        if engine.state.race_over {
            break;
        }
        if flow::check_finish(engine, idx) {
            continue;
        }
        engine.trigger_on_land(to, idx);
        engine.publish_to_subscribers(&Event {
            kind: EventKind::PostWarp {
                racer_idx: idx,
                start_tile: from,
                end_tile: to,
            },
            phase: event.phase,
            source: event.source,
            responsible_racer_idx: event.responsible_racer_idx,
            emit_ability_triggered: TriggerEmission::Never,
        });
    }

    emit_resolution_trigger(engine, event, None, true);
}

/// Resolves a `TripCmd`. Idempotent: tripping an inactive or already-tripped
/// racer drops without emitting anything.
pub(crate) fn handle_trip_cmd(engine: &mut Engine, event: &Event) {
    let EventKind::TripCmd {
        target_racer_idx: idx,
    } = event.kind
    else {
        return;
    };
    let Some(racer) = engine.state.racers.get_mut(idx) else {
        return;
    };
    if !racer.active() || racer.tripped {
        return;
    }
    racer.tripped = true;
    engine.log_info(format_args!(
        "{}: racer #{idx} is now tripped",
        event.source
    ));
    emit_resolution_trigger(engine, event, Some(idx), true);
}
