// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Trip tiles, recovery turns, and trip idempotence.

mod common;

use common::{RaceScenario, RacerSpec};
use derby_core::{AbilityName, Event, EventKind, Phase, RacerName, TriggerEmission};

#[test]
fn landing_on_a_trip_tile_costs_the_next_turn() {
    // Given: a lone Centaur rolling 4 onto the standard board's trip tile.
    let mut s = RaceScenario::new(&[RacerSpec::new(RacerName::Centaur)], &[4, 5]);

    s.run_turns(1);
    assert_eq!(s.position(0), 4);
    assert!(s.tripped(0));

    // The next turn is spent standing up: no roll, no movement.
    s.run_turns(1);
    assert_eq!(s.position(0), 4);
    assert!(!s.tripped(0));
    assert_eq!(s.engine.state().roll_state.base_value, 0);

    // Back to racing on the turn after.
    s.run_turns(1);
    assert_eq!(s.position(0), 9);

    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].recovery_turns, 1);
    assert_eq!(results[0].turns_taken, 3);
    assert_eq!(results[0].sum_dice_rolled, 9);

    let history = s.metrics.turn_history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].dice_roll, 0);
}

#[test]
fn passing_a_trip_tile_is_harmless() {
    let mut s = RaceScenario::new(&[RacerSpec::new(RacerName::Centaur).at(2)], &[5]);
    s.run_turns(1);
    assert_eq!(s.position(0), 7);
    assert!(!s.tripped(0));
}

#[test]
fn tripping_a_tripped_racer_is_a_no_op() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Banana),
            RacerSpec::new(RacerName::Centaur).at(9),
        ],
        &[1],
    );
    // Two trip commands against the same target; only the first acts.
    for _ in 0..2 {
        s.engine.push_event(Event::from_ability(
            EventKind::TripCmd {
                target_racer_idx: 1,
            },
            Phase::MOVE,
            AbilityName::BananaTrip,
            0,
            TriggerEmission::AfterResolution,
        ));
    }
    s.run_turns(1);

    assert!(s.tripped(1));
    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 1);
}

#[test]
fn trip_commands_ignore_finished_racers() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Banana),
            RacerSpec::new(RacerName::Centaur).at(17),
        ],
        &[1, 4],
    );
    // Centaur finishes on its first turn.
    s.run_turns(2);
    assert_eq!(s.engine.state().racers[1].finish_position, Some(1));

    s.engine.push_event(Event::from_ability(
        EventKind::TripCmd {
            target_racer_idx: 1,
        },
        Phase::MOVE,
        AbilityName::BananaTrip,
        0,
        TriggerEmission::AfterResolution,
    ));
    s.run_turns(1);
    assert!(!s.tripped(1));
    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 0);
}
