// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The dice-modifier pipeline: auras, boosts, rerolls, debuffs, and the
//! zero-move trigger gate.

mod common;

use common::{RaceScenario, RacerSpec};
use derby_core::{
    AbilityName, BoardName, Event, EventKind, GameRules, Phase, RacerModifierKind, RacerName,
    TriggerEmission,
};

#[test]
fn gunk_slime_slows_every_other_racer() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Gunk),
            RacerSpec::new(RacerName::Centaur),
        ],
        &[3, 4],
    );
    s.run_turns(2);

    // Gunk's own roll is untouched; Centaur's 4 becomes 3.
    assert_eq!(s.position(0), 3);
    assert_eq!(s.position(1), 3);

    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 1);
    assert_eq!(results[1].ability_target_count, 1);
}

#[test]
fn party_boost_scales_with_co_occupants() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::PartyAnimal).at(3),
            RacerSpec::new(RacerName::Centaur).at(3),
            RacerSpec::new(RacerName::Banana).at(3),
        ],
        &[2],
    );
    s.run_turns(1);

    // Base 2 plus one per co-occupant of tile 3.
    assert_eq!(s.position(0), 7);
    let results = s.metrics.finalize(s.engine.state());
    assert!(results[0].ability_self_target_count >= 1);
}

#[test]
fn party_pull_draws_the_field_inward() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::PartyAnimal).at(8),
            RacerSpec::new(RacerName::Centaur).at(2),
            RacerSpec::new(RacerName::Banana).at(13),
        ],
        &[1],
    );
    s.run_turns(1);

    assert_eq!(s.position(1), 3);
    assert_eq!(s.position(2), 12);
}

#[test]
fn magician_rerolls_weak_dice() {
    // Base roll 1 triggers the charm; the scripted 5 replaces it.
    let mut s = RaceScenario::new(&[RacerSpec::new(RacerName::Magician)], &[1, 5]);
    s.run_turns(1);

    assert_eq!(s.position(0), 5);
    assert_eq!(s.engine.state().racers[0].reroll_count, 1);
    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 1);
}

#[test]
fn magician_keeps_strong_dice() {
    let mut s = RaceScenario::new(&[RacerSpec::new(RacerName::Magician)], &[6]);
    s.run_turns(1);
    assert_eq!(s.position(0), 6);
    assert_eq!(s.engine.state().racers[0].reroll_count, 0);
}

#[test]
fn slime_tile_fades_into_a_one_shot_debuff() {
    let mut s = RaceScenario::with_board(
        &[
            RacerSpec::new(RacerName::Centaur).at(15),
            RacerSpec::new(RacerName::Banana),
        ],
        &[4, 1, 4],
        BoardName::Gauntlet,
        GameRules::default(),
    );

    // Centaur lands in the slime at 19.
    s.run_turns(1);
    assert_eq!(s.position(0), 19);
    assert!(s.engine.state().board.dynamic_modifiers().get(&19).is_none());
    assert!(s.engine.state().racers[0]
        .modifiers
        .iter()
        .any(|m| m.kind == RacerModifierKind::SlimeDebuff));

    // Banana's turn, then Centaur rolls 4 but the debuff eats one tile.
    s.run_turns(2);
    assert_eq!(s.position(0), 22);
    assert!(!s.engine.state().racers[0]
        .modifiers
        .iter()
        .any(|m| m.kind == RacerModifierKind::SlimeDebuff));
}

#[test]
fn floored_rolls_cancel_the_main_move() {
    // Two gunks slow each other; the roll of 1 floors to 0 tiles.
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Gunk),
            RacerSpec::new(RacerName::Gunk).at(5),
        ],
        &[1],
    );
    s.run_turns(1);
    assert_eq!(s.position(0), 0);
    assert_eq!(s.engine.state().roll_state.final_value, 0);
}

#[test]
fn zero_distance_commands_emit_nothing_by_default() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Centaur),
            RacerSpec::new(RacerName::Banana),
        ],
        &[1],
    );
    // A knockback that resolves right back to the start tile.
    s.engine.push_event(Event::from_ability(
        EventKind::MoveCmd {
            target_racer_idx: 1,
            distance: -2,
        },
        Phase::MOVE,
        AbilityName::CentaurTrample,
        0,
        TriggerEmission::AfterResolution,
    ));
    s.run_turns(1);

    assert_eq!(s.position(1), 0);
    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 0);
}

#[test]
fn zero_distance_commands_emit_when_the_rules_count_them() {
    let rules = GameRules {
        count_zero_moves_for_ability_triggered: true,
        ..GameRules::default()
    };
    let mut s = RaceScenario::with_board(
        &[
            RacerSpec::new(RacerName::Centaur),
            RacerSpec::new(RacerName::Banana),
        ],
        &[1],
        BoardName::Standard,
        rules,
    );
    s.engine.push_event(Event::from_ability(
        EventKind::MoveCmd {
            target_racer_idx: 1,
            distance: -2,
        },
        Phase::MOVE,
        AbilityName::CentaurTrample,
        0,
        TriggerEmission::AfterResolution,
    ));
    s.run_turns(1);

    assert_eq!(s.position(1), 0);
    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 1);
}
