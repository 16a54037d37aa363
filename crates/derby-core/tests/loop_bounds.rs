// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Adversarial reaction chains stay bounded.

mod common;

use common::{RaceScenario, RacerSpec};
use derby_core::{AbilityName, BoardName, GameRules, RacerName, TimingMode};

/// Two scooch-steppers feed on each other's triggers; the slime aura kicks
/// the chain off on every single roll.
fn chain_specs() -> Vec<RacerSpec> {
    vec![
        RacerSpec::new(RacerName::Scoocher),
        RacerSpec::new(RacerName::Banana).with_abilities(&[AbilityName::ScoochStep]),
        RacerSpec::new(RacerName::Gunk),
    ]
}

#[test]
fn mutual_scooch_chains_are_cut_by_the_loop_guard() {
    let mut s = RaceScenario::new(&chain_specs(), &[]);
    s.run_turns(1);

    // The chain was cut, not run to the finish line: somebody got skipped
    // and nobody teleported across the board in one turn.
    assert!(!s.counters.skips().is_empty());
    assert!(s.position(0) < 20);
    assert!(s.position(1) < 20);
    s.engine.verify_invariants().unwrap();
}

#[test]
fn races_with_hostile_chains_still_finish() {
    let rules = GameRules {
        max_turns: Some(60),
        ..GameRules::default()
    };
    let mut s = RaceScenario::with_board(&chain_specs(), &[], BoardName::Standard, rules);
    s.engine.run_race();

    // Either the finish condition fired or the embedder ceiling did; both
    // bound the race.
    assert!(s.engine.state().race_over || s.engine.turn_index() == 60);
    assert!(s.counters.event_count() > 0);
}

#[test]
fn depth_first_timing_also_terminates() {
    let rules = GameRules {
        timing: TimingMode::DepthFirst,
        max_turns: Some(60),
        ..GameRules::default()
    };
    let mut s = RaceScenario::with_board(&chain_specs(), &[], BoardName::Standard, rules);
    s.engine.run_race();
    assert!(s.engine.state().race_over || s.engine.turn_index() == 60);
}

#[test]
fn romantic_chases_are_bounded_too() {
    let rules = GameRules {
        max_turns: Some(60),
        ..GameRules::default()
    };
    let mut s = RaceScenario::with_board(
        &[
            RacerSpec::new(RacerName::Romantic),
            RacerSpec::new(RacerName::Scoocher).at(1),
            RacerSpec::new(RacerName::PartyAnimal).at(2),
        ],
        &[],
        BoardName::Standard,
        rules,
    );
    s.engine.run_race();
    assert!(s.engine.state().race_over || s.engine.turn_index() == 60);
}
