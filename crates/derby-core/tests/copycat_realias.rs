// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Copycat's atomic ability re-aliasing.

mod common;

use std::collections::BTreeSet;

use common::{RaceScenario, RacerSpec};
use derby_core::{AbilityName, RacerModifierKind, RacerName};

#[test]
fn copycat_adopts_the_leaders_abilities() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Copycat),
            RacerSpec::new(RacerName::Centaur).at(8),
            RacerSpec::new(RacerName::Scoocher).at(5),
        ],
        &[1],
    );
    s.run_turns(1);

    let expected: BTreeSet<AbilityName> =
        [AbilityName::CentaurTrample, AbilityName::CopyLead]
            .into_iter()
            .collect();
    assert_eq!(s.engine.state().racers[0].abilities, expected);
    s.engine.verify_invariants().unwrap();
}

#[test]
fn copying_a_roll_modifier_installs_it() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Copycat),
            RacerSpec::new(RacerName::Gunk).at(4),
        ],
        &[1, 3],
    );
    s.run_turns(1);

    assert!(s.engine.state().racers[0]
        .modifiers
        .iter()
        .any(|m| m.kind == RacerModifierKind::GunkSlime));

    // Gunk now suffers its own aura from the copycat: 3 becomes 2.
    s.run_turns(1);
    assert_eq!(s.position(1), 6);
    s.engine.verify_invariants().unwrap();
}

#[test]
fn realiasing_tracks_the_leader_turn_by_turn() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Copycat),
            RacerSpec::new(RacerName::Banana).at(6),
            RacerSpec::new(RacerName::Centaur).at(3),
        ],
        &[1, 1, 6, 1],
    );
    // Turn 0: Banana leads; Copycat adopts her trip.
    s.run_turns(1);
    assert!(s.engine.state().racers[0]
        .abilities
        .contains(&AbilityName::BananaTrip));

    // Centaur storms past over the next turns; Copycat re-aliases.
    s.run_turns(3);
    assert!(s.engine.state().racers[0]
        .abilities
        .contains(&AbilityName::CentaurTrample));
    assert!(!s.engine.state().racers[0]
        .abilities
        .contains(&AbilityName::BananaTrip));
    s.engine.verify_invariants().unwrap();
}

#[test]
fn copying_the_blocker_places_one() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Copycat).at(2),
            RacerSpec::new(RacerName::HugeBaby).at(9),
        ],
        &[1],
    );
    s.run_turns(1);

    let board = &s.engine.state().board;
    // Copycat moved 2 -> 3 after adopting the ability; its blocker follows.
    assert_eq!(s.position(0), 3);
    let at_3 = board
        .dynamic_modifiers()
        .get(&3)
        .map(Vec::as_slice)
        .unwrap_or_default();
    assert!(at_3
        .iter()
        .any(|m| m.owner_idx == Some(0)));
    s.engine.verify_invariants().unwrap();
}
