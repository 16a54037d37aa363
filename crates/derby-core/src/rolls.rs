// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The main-move dice pipeline.

use crate::engine_impl::Engine;
use crate::event::{Event, EventKind, MoveDistanceQuery, Phase};
use crate::state::RollState;

/// Samples the die, runs the roll-modifier pipeline, and pushes the
/// resulting main move.
pub(crate) fn on_roll_and_main_move(engine: &mut Engine, event: &Event) {
    let EventKind::RollAndMainMove { racer_idx } = event.kind else {
        return;
    };
    if !engine
        .state
        .racers
        .get(racer_idx)
        .is_some_and(|r| r.active())
    {
        return;
    }

    let base = engine.dice.roll_d6();
    engine.state.roll_state = RollState {
        serial_id: engine.state.roll_state.serial_id + 1,
        base_value: base,
        final_value: base,
    };
    engine.log_info(format_args!("racer #{racer_idx} rolls {base}"));

    let mut query = MoveDistanceQuery::new(racer_idx, base);
    engine.apply_roll_modifiers(&mut query);

    let distance = query.final_value();
    engine.state.roll_state.final_value = distance;
    engine.state.racers[racer_idx].main_move_consumed = true;
    if distance != base {
        engine.log_info(format_args!(
            "racer #{racer_idx} main move modified to {distance}"
        ));
    }

    if distance > 0 {
        engine.push_event(Event::system(
            EventKind::MoveCmd {
                target_racer_idx: racer_idx,
                distance: i32::try_from(distance).unwrap_or(0),
            },
            Phase::MOVE,
            Some(racer_idx),
        ));
    }
}
