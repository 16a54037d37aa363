// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Atomic multi-racer warps and the swap ability built on them.

mod common;

use common::{RaceScenario, RacerSpec};
use derby_core::{Event, EventKind, LogLevel, Phase, RacerName};

#[test]
fn simultaneous_warp_commits_everyone_before_landing_hooks() {
    // Given: both racers warped onto the standard board's trip tile at 10.
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Banana),
            RacerSpec::new(RacerName::Centaur).at(3),
        ],
        &[1],
    );
    s.engine.push_event(Event::system(
        EventKind::SimultaneousWarpCmd {
            warps: vec![(0, 10), (1, 10)],
        },
        Phase::MOVE,
        None,
    ));
    s.run_turns(1);

    // Both landed on 10 and both landing hooks ran (tile 10 trips).
    assert!(s.tripped(0));
    assert!(s.tripped(1));
    assert_eq!(s.position(1), 10);
    // Banana then walks her main move off the tile (the warp popped first,
    // holding the earliest serial in the MOVE tier).
    assert_eq!(s.position(0), 11);
    assert_eq!(s.engine.racers_at(10), vec![1]);

    // Commit order: every "Warp:" line precedes every landing-hook line.
    let lines = s.log.lines();
    let text: Vec<&str> = lines
        .iter()
        .filter(|(l, _)| *l == LogLevel::Info)
        .map(|(_, m)| m.as_str())
        .collect();
    let last_commit = text
        .iter()
        .rposition(|m| m.starts_with("Warp:"))
        .unwrap();
    let first_landing = text
        .iter()
        .position(|m| m.starts_with("Board: tile 10"))
        .unwrap();
    assert!(last_commit < first_landing);
}

#[test]
fn same_tile_and_inactive_entries_are_dropped() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::Banana).at(7),
            RacerSpec::new(RacerName::Centaur).at(3),
        ],
        &[1],
    );
    s.engine.eliminate_racer(1);
    s.engine.push_event(Event::system(
        EventKind::SimultaneousWarpCmd {
            warps: vec![(0, 7), (1, 12)],
        },
        Phase::MOVE,
        None,
    ));
    s.run_turns(1);

    // Banana's warp was a no-op (same tile) and the eliminated Centaur
    // never moved; only Banana's main move happened.
    assert_eq!(s.position(0), 8);
    assert_eq!(s.position(1), 3);
}

#[test]
fn flip_flop_swaps_with_the_nearest_racer_ahead() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::FlipFlop).at(2),
            RacerSpec::new(RacerName::Centaur).at(7),
            RacerSpec::new(RacerName::Banana).at(12),
        ],
        &[1],
    );
    s.run_turns(1);

    // FlipFlop swaps with Centaur (nearest ahead), then walks its roll.
    assert_eq!(s.position(0), 8);
    assert_eq!(s.position(1), 2);
    assert_eq!(s.position(2), 12);

    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 1);
}

#[test]
fn flip_flop_in_the_lead_does_nothing() {
    let mut s = RaceScenario::new(
        &[
            RacerSpec::new(RacerName::FlipFlop).at(13),
            RacerSpec::new(RacerName::Centaur).at(2),
        ],
        &[1],
    );
    s.run_turns(1);
    assert_eq!(s.position(0), 14);
    assert_eq!(s.position(1), 2);
    let results = s.metrics.finalize(s.engine.state());
    assert_eq!(results[0].ability_trigger_count, 0);
}
