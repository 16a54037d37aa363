// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Determinism, termination, and position-bound audits.
//!
//! Two independent runs of the same configuration must produce identical
//! event traces and state hashes at every dispatch; every race must end in
//! bounded turns with positions inside the board.

use proptest::prelude::*;

use derby_core::{
    build_engine, config_fingerprint, run_pair_determinism, BoardName, GameRules, RaceConfig,
    RacerName,
};

fn full_roster() -> Vec<RacerName> {
    RacerName::ALL.to_vec()
}

fn bounded_rules() -> GameRules {
    GameRules {
        max_turns: Some(200),
        ..GameRules::default()
    }
}

#[test]
fn full_roster_runs_are_reproducible() {
    for seed in [0u64, 1, 42, 0xdead_beef] {
        let mut config = RaceConfig::new(full_roster(), BoardName::Standard, seed);
        config.rules = bounded_rules();
        run_pair_determinism(&config).unwrap();
    }
}

#[test]
fn gauntlet_runs_are_reproducible() {
    for seed in [3u64, 7, 1_000_003] {
        let mut config = RaceConfig::new(full_roster(), BoardName::Gauntlet, seed);
        config.rules = bounded_rules();
        run_pair_determinism(&config).unwrap();
    }
}

#[test]
fn depth_first_runs_are_reproducible() {
    let mut config = RaceConfig::new(full_roster(), BoardName::Standard, 11);
    config.rules = GameRules {
        timing: derby_core::TimingMode::DepthFirst,
        ..bounded_rules()
    };
    run_pair_determinism(&config).unwrap();
}

#[test]
fn finished_races_satisfy_the_position_bounds() {
    let mut config = RaceConfig::new(full_roster(), BoardName::Standard, 99);
    config.rules = bounded_rules();
    let mut engine = build_engine(&config).unwrap();
    engine.run_race();

    let finish = engine.state().board.finish_tile();
    for racer in &engine.state().racers {
        assert!(racer.position <= finish, "racer {} out of bounds", racer.idx);
        if racer.finished() {
            assert_eq!(racer.position, finish);
        } else {
            assert!(racer.position < finish);
        }
    }
}

#[test]
fn invariants_hold_after_every_turn() {
    let mut config = RaceConfig::new(
        vec![
            RacerName::Copycat,
            RacerName::Scoocher,
            RacerName::Gunk,
            RacerName::PartyAnimal,
        ],
        BoardName::Standard,
        17,
    );
    config.rules = bounded_rules();
    let mut engine = build_engine(&config).unwrap();
    while !engine.state().race_over && engine.turn_index() < 200 {
        engine.run_turn();
        engine.verify_invariants().unwrap();
    }
}

#[test]
fn fingerprints_separate_distinct_configurations() {
    let a = RaceConfig::new(full_roster(), BoardName::Standard, 1);
    let mut b = RaceConfig::new(full_roster(), BoardName::Standard, 1);
    b.rules.max_turns = Some(10);
    assert_ne!(config_fingerprint(&a), config_fingerprint(&b));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn random_rosters_and_seeds_are_reproducible(
        picks in proptest::collection::vec(0usize..RacerName::ALL.len(), 2..6),
        seed in any::<u64>(),
        gauntlet in any::<bool>(),
    ) {
        let racers: Vec<RacerName> = picks.iter().map(|&i| RacerName::ALL[i]).collect();
        let board = if gauntlet { BoardName::Gauntlet } else { BoardName::Standard };
        let mut config = RaceConfig::new(racers, board, seed);
        config.rules = bounded_rules();
        run_pair_determinism(&config)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
    }

    #[test]
    fn every_race_terminates_within_the_ceiling(
        picks in proptest::collection::vec(0usize..RacerName::ALL.len(), 1..5),
        seed in any::<u64>(),
    ) {
        let racers: Vec<RacerName> = picks.iter().map(|&i| RacerName::ALL[i]).collect();
        let mut config = RaceConfig::new(racers, BoardName::Standard, seed);
        config.rules = bounded_rules();
        let mut engine = build_engine(&config)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        engine.run_race();
        prop_assert!(engine.turn_index() <= 200);
        prop_assert!(engine.state().race_over || engine.turn_index() == 200);
    }
}
