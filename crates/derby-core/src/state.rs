// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Game state: racers, rules, roll state, and the canonical state hash.

use std::collections::BTreeSet;

use blake3::Hasher;

use crate::board::Board;
use crate::constants::DEFAULT_FINISHERS_TO_END;
use crate::ident::{AbilityName, ModifierName, RacerName};
use crate::scheduler::TimingMode;

/// Canonical 256-bit digest used for state hashes and config fingerprints.
pub type Hash = [u8; 32];

/// A persistent effect attached to a racer.
///
/// Identity is (name, owner); the roster is an ordered list and the roll
/// pipeline consults it in attach order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RacerModifier {
    /// What the modifier does.
    pub kind: RacerModifierKind,
    /// The racer it is attached to.
    pub owner_idx: usize,
}

impl RacerModifier {
    /// The modifier's stable name.
    #[must_use]
    pub fn name(&self) -> ModifierName {
        self.kind.name()
    }
}

/// Racer-scoped modifier behaviors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RacerModifierKind {
    /// Gunk's aura: −1 to every other racer's main-move roll.
    GunkSlime,
    /// Party Animal's bonus: +1 to the owner's own roll per co-occupant of
    /// the owner's tile.
    PartySelfBoost,
    /// Magician's charm: reroll the owner's own base roll when it is ≤ 2.
    RerollCharm,
    /// One-shot −1 picked up from a slimed tile; detaches after applying.
    SlimeDebuff,
}

impl RacerModifierKind {
    /// The stable name of this modifier kind.
    #[must_use]
    pub fn name(self) -> ModifierName {
        match self {
            RacerModifierKind::GunkSlime => ModifierName::GunkSlimeModifier,
            RacerModifierKind::PartySelfBoost => ModifierName::PartySelfBoost,
            RacerModifierKind::RerollCharm => ModifierName::RerollCharm,
            RacerModifierKind::SlimeDebuff => ModifierName::SlimeDebuff,
        }
    }
}

/// A racer's identity and mutable race state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RacerState {
    /// Stable index, equal to the racer's position in the roster.
    pub idx: usize,
    /// The racer's identity.
    pub name: RacerName,
    /// Current tile.
    pub position: usize,
    /// Victory points. Never driven below zero; tile penalties saturate.
    pub victory_points: u32,
    /// Tripped racers lose their next turn to recovery.
    pub tripped: bool,
    /// Times the racer rerolled its own dice.
    pub reroll_count: u32,
    /// Set when the racer has rolled its main move this turn.
    pub main_move_consumed: bool,
    /// 1-based place, set once on crossing the finish tile.
    pub finish_position: Option<u32>,
    /// Eliminated racers take no further part in the race.
    pub eliminated: bool,
    /// Attached modifiers, in attach order.
    pub modifiers: Vec<RacerModifier>,
    /// The racer's current ability set. Kept in bijection with the engine's
    /// subscription table.
    pub abilities: BTreeSet<AbilityName>,
}

impl RacerState {
    /// Creates a racer at `position` with an empty ability roster.
    #[must_use]
    pub fn new(idx: usize, name: RacerName, position: usize) -> Self {
        RacerState {
            idx,
            name,
            position,
            victory_points: 0,
            tripped: false,
            reroll_count: 0,
            main_move_consumed: false,
            finish_position: None,
            eliminated: false,
            modifiers: Vec::new(),
            abilities: BTreeSet::new(),
        }
    }

    /// True once the racer has crossed the finish tile.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.finish_position.is_some()
    }

    /// True while the racer still takes part in the race.
    #[must_use]
    pub fn active(&self) -> bool {
        !self.finished() && !self.eliminated
    }

    /// `idx:Name` label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}:{}", self.idx, self.name)
    }
}

/// The in-progress main-move dice record.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RollState {
    /// Monotonic roll counter.
    pub serial_id: u64,
    /// Raw d6 sample.
    pub base_value: u32,
    /// Distance after the modifier pipeline.
    pub final_value: u32,
}

/// Rule knobs fixed at construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameRules {
    /// Event ordering discipline.
    pub timing: TimingMode,
    /// When set, a command that resolves to zero movement still emits its
    /// `AbilityTriggered` marker (if its discipline is after-resolution).
    pub count_zero_moves_for_ability_triggered: bool,
    /// The race ends when this many racers have finished.
    pub finishers_to_end: u32,
    /// Upper bound on turns for [`Engine::run_race`](crate::Engine::run_race).
    /// `None` leaves the race bounded only by the finish condition.
    pub max_turns: Option<u32>,
}

impl Default for GameRules {
    fn default() -> Self {
        GameRules {
            timing: TimingMode::Priority,
            count_zero_moves_for_ability_triggered: false,
            finishers_to_end: DEFAULT_FINISHERS_TO_END,
            max_turns: None,
        }
    }
}

/// The full observable game state owned by one engine.
#[derive(Clone, Debug)]
pub struct GameState {
    /// The roster, indexed by racer idx.
    pub racers: Vec<RacerState>,
    /// The board and its modifier planes.
    pub board: Board,
    /// Rule knobs.
    pub rules: GameRules,
    /// Cursor of the acting racer. Refers to an active racer between turns
    /// unless the race is over.
    pub current_racer_idx: usize,
    /// The in-progress dice record; reset at each turn start.
    pub roll_state: RollState,
    /// Racer indices in finish order.
    pub finished_order: Vec<usize>,
    /// Set when the finish condition is met; drains the queue.
    pub race_over: bool,
    /// Completed turns.
    pub turn_index: u32,
}

impl GameState {
    /// Canonical fingerprint of all observable racer and tile state.
    ///
    /// Covers, per racer: idx, position, tripped, finish position,
    /// eliminated, victory points, sorted ability names, sorted modifier
    /// names; and per tile, its sorted dynamic-modifier names. Length
    /// prefixes and domain separation make the encoding unambiguous, so two
    /// runs agree byte-for-byte.
    #[must_use]
    pub fn state_hash(&self) -> Hash {
        let mut h = Hasher::new();
        h.update(b"derby:state:v1");
        h.update(&(self.racers.len() as u64).to_le_bytes());
        for r in &self.racers {
            h.update(b"racer:");
            h.update(&(r.idx as u64).to_le_bytes());
            h.update(&(r.position as u64).to_le_bytes());
            h.update(&[u8::from(r.tripped)]);
            match r.finish_position {
                None => {
                    h.update(&[0u8]);
                }
                Some(p) => {
                    h.update(&[1u8]);
                    h.update(&p.to_le_bytes());
                }
            }
            h.update(&[u8::from(r.eliminated)]);
            h.update(&u64::from(r.victory_points).to_le_bytes());

            h.update(&(r.abilities.len() as u64).to_le_bytes());
            for a in &r.abilities {
                let s = a.as_str().as_bytes();
                h.update(&(s.len() as u64).to_le_bytes());
                h.update(s);
            }

            let mut mod_names: Vec<&'static str> =
                r.modifiers.iter().map(|m| m.name().as_str()).collect();
            mod_names.sort_unstable();
            h.update(&(mod_names.len() as u64).to_le_bytes());
            for s in mod_names {
                h.update(&(s.len() as u64).to_le_bytes());
                h.update(s.as_bytes());
            }
        }

        h.update(b"tiles:");
        for (tile, mods) in self.board.dynamic_modifiers() {
            if mods.is_empty() {
                continue;
            }
            h.update(&(*tile as u64).to_le_bytes());
            let mut names: Vec<&'static str> = mods.iter().map(|m| m.name().as_str()).collect();
            names.sort_unstable();
            h.update(&(names.len() as u64).to_le_bytes());
            for s in names {
                h.update(&(s.len() as u64).to_le_bytes());
                h.update(s.as_bytes());
            }
        }

        h.finalize().into()
    }

    /// Indices of active racers currently on `tile`, in roster order.
    #[must_use]
    pub fn racers_at(&self, tile: usize) -> Vec<usize> {
        self.racers
            .iter()
            .filter(|r| r.active() && r.position == tile)
            .map(|r| r.idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::BoardName;

    fn two_racer_state() -> GameState {
        GameState {
            racers: vec![
                RacerState::new(0, RacerName::Centaur, 0),
                RacerState::new(1, RacerName::Banana, 0),
            ],
            board: Board::build(BoardName::Standard),
            rules: GameRules::default(),
            current_racer_idx: 0,
            roll_state: RollState::default(),
            finished_order: Vec::new(),
            race_over: false,
            turn_index: 0,
        }
    }

    #[test]
    fn state_hash_is_stable_for_identical_states() {
        let a = two_racer_state();
        let b = two_racer_state();
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn state_hash_sees_position_changes() {
        let a = two_racer_state();
        let mut b = two_racer_state();
        b.racers[1].position = 3;
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn state_hash_sees_ability_changes() {
        let a = two_racer_state();
        let mut b = two_racer_state();
        b.racers[0].abilities.insert(AbilityName::ScoochStep);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn state_hash_ignores_modifier_attach_order() {
        let mut a = two_racer_state();
        let mut b = two_racer_state();
        a.racers[0].modifiers.push(RacerModifier {
            kind: RacerModifierKind::GunkSlime,
            owner_idx: 0,
        });
        a.racers[0].modifiers.push(RacerModifier {
            kind: RacerModifierKind::SlimeDebuff,
            owner_idx: 0,
        });
        b.racers[0].modifiers.push(RacerModifier {
            kind: RacerModifierKind::SlimeDebuff,
            owner_idx: 0,
        });
        b.racers[0].modifiers.push(RacerModifier {
            kind: RacerModifierKind::GunkSlime,
            owner_idx: 0,
        });
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn active_tracks_finish_and_elimination() {
        let mut r = RacerState::new(0, RacerName::Gunk, 0);
        assert!(r.active());
        r.finish_position = Some(1);
        assert!(!r.active());
        let mut e = RacerState::new(1, RacerName::Banana, 0);
        e.eliminated = true;
        assert!(!e.active());
    }
}
