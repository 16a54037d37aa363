// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Turn driver: turn start, trip recovery, the finish check, and the cursor.

use crate::constants::WIN_VP;
use crate::engine_impl::Engine;
use crate::event::{Event, EventKind, Phase};

/// Handles `TurnStart` for the acting racer.
///
/// Inactive racers skip; tripped racers spend the turn standing up (no roll,
/// a `TripRecovery` notification fires instead); everyone else publishes the
/// turn start to subscribers and queues the main roll.
pub(crate) fn on_turn_start(engine: &mut Engine, event: &Event) {
    let EventKind::TurnStart { racer_idx } = event.kind else {
        return;
    };
    let (active, tripped) = {
        let Some(racer) = engine.state.racers.get_mut(racer_idx) else {
            return;
        };
        racer.main_move_consumed = false;
        (racer.active(), racer.tripped)
    };

    if !active {
        engine.log_info(format_args!(
            "racer #{racer_idx} is out of the race; skipping turn"
        ));
        return;
    }

    if tripped {
        engine.state.racers[racer_idx].tripped = false;
        engine.log_info(format_args!(
            "racer #{racer_idx} stands up from being tripped"
        ));
        engine.push_event(Event::system(
            EventKind::TripRecovery {
                target_racer_idx: racer_idx,
            },
            Phase::SYSTEM,
            Some(racer_idx),
        ));
        return;
    }

    engine.publish_to_subscribers(event);
    engine.push_event(Event::system(
        EventKind::RollAndMainMove { racer_idx },
        Phase::SYSTEM,
        Some(racer_idx),
    ));
}

/// Finish check after a position commit. Returns whether the racer finished.
///
/// Finishing clamps the position to the finish tile, assigns the next
/// 1-based place, awards the winner's victory points, and ends the race once
/// enough racers are home (clearing the queue).
pub(crate) fn check_finish(engine: &mut Engine, racer_idx: usize) -> bool {
    let finish = engine.state.board.finish_tile();
    let Some(racer) = engine.state.racers.get(racer_idx) else {
        return false;
    };
    if racer.position < finish {
        return false;
    }
    if racer.finished() {
        return true;
    }

    let place = u32::try_from(engine.state.finished_order.len()).unwrap_or(u32::MAX) + 1;
    {
        let racer = &mut engine.state.racers[racer_idx];
        if racer.position > finish {
            engine.log.record(
                crate::log::LogLevel::Info,
                format_args!(
                    "racer #{racer_idx} overshoots to {}; clamping to finish tile {finish}",
                    racer.position
                ),
            );
        }
        racer.position = finish;
        racer.finish_position = Some(place);
    }
    engine.state.finished_order.push(racer_idx);
    engine.log_info(format_args!("racer #{racer_idx} finishes in place {place}"));

    if place == 1 {
        engine.state.racers[racer_idx].victory_points += WIN_VP;
        engine.log_info(format_args!(
            "racer #{racer_idx} gains {WIN_VP} VP for first place"
        ));
    }

    if place >= engine.state.rules.finishers_to_end {
        engine.state.race_over = true;
        engine.scheduler.clear();
        engine.log_info(format_args!("finisher {place} ends the race"));
    }
    true
}

/// Rotates the cursor to the next active racer. When none remains, the race
/// is over.
pub(crate) fn advance_turn(engine: &mut Engine) {
    if engine.state.race_over {
        return;
    }
    let n = engine.state.racers.len();
    if n == 0 {
        engine.state.race_over = true;
        return;
    }
    for _ in 0..n {
        engine.state.current_racer_idx = (engine.state.current_racer_idx + 1) % n;
        if engine.state.racers[engine.state.current_racer_idx].active() {
            return;
        }
    }
    engine.log_info(format_args!("no active racers remain; race over"));
    engine.state.race_over = true;
}
