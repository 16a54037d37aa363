// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Name enums and source tags.
//!
//! All identifiers are closed enums: the set of racers, abilities, modifiers,
//! and boards is fixed at compile time and doubles as the registry key space.
//! String entry points (`FromStr`) fail fast with a descriptive
//! [`EngineError`] so bad configuration never reaches the engine.

use std::fmt;
use std::str::FromStr;

use crate::engine_impl::EngineError;

/// A racer identity. Each racer maps to a default ability set in the registry
/// (see [`crate::default_abilities`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RacerName {
    /// Trips the racers she passes.
    BabaYaga,
    /// Trips racers that pass her tile.
    Banana,
    /// Tramples racers it passes, knocking them back.
    Centaur,
    /// Copies the leader's abilities at the start of its turn.
    Copycat,
    /// Swaps places with the nearest racer ahead.
    FlipFlop,
    /// Slows every other racer's roll.
    Gunk,
    /// Blocks its tile; approaching racers are shoved back.
    HugeBaby,
    /// Rerolls weak dice.
    Magician,
    /// Pulls the field toward itself and rolls better in a crowd.
    PartyAnimal,
    /// Chases whoever moves ahead.
    Romantic,
    /// Scooches forward whenever anyone else's ability fires.
    Scoocher,
}

impl RacerName {
    /// All racer names, in canonical order.
    pub const ALL: [RacerName; 11] = [
        RacerName::BabaYaga,
        RacerName::Banana,
        RacerName::Centaur,
        RacerName::Copycat,
        RacerName::FlipFlop,
        RacerName::Gunk,
        RacerName::HugeBaby,
        RacerName::Magician,
        RacerName::PartyAnimal,
        RacerName::Romantic,
        RacerName::Scoocher,
    ];

    /// Canonical string form of this name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RacerName::BabaYaga => "BabaYaga",
            RacerName::Banana => "Banana",
            RacerName::Centaur => "Centaur",
            RacerName::Copycat => "Copycat",
            RacerName::FlipFlop => "FlipFlop",
            RacerName::Gunk => "Gunk",
            RacerName::HugeBaby => "HugeBaby",
            RacerName::Magician => "Magician",
            RacerName::PartyAnimal => "PartyAnimal",
            RacerName::Romantic => "Romantic",
            RacerName::Scoocher => "Scoocher",
        }
    }
}

impl fmt::Display for RacerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RacerName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RacerName::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| EngineError::UnknownRacer(s.to_owned()))
    }
}

/// A named racer ability.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityName {
    /// Trip the racers the owner passes.
    BabaYagaTrip,
    /// Trip racers passing the owner's tile.
    BananaTrip,
    /// Knock back racers the owner passes.
    CentaurTrample,
    /// Adopt the current leader's ability set each turn.
    CopyLead,
    /// Swap positions with the nearest racer ahead.
    FlipFlopSwap,
    /// Aura: every other racer's roll is reduced by one.
    GunkSlime,
    /// Maintain a blocker on the owner's tile.
    HugeBabyPush,
    /// Reroll the owner's own weak dice.
    MagicalReroll,
    /// Bonus roll distance per co-occupant of the owner's tile.
    PartyBoost,
    /// Pull every other racer one tile toward the owner.
    PartyPull,
    /// Chase racers that end a move ahead of the owner.
    RomanticMove,
    /// Move one tile whenever another racer's ability fires.
    ScoochStep,
}

impl AbilityName {
    /// All ability names, in canonical order.
    pub const ALL: [AbilityName; 12] = [
        AbilityName::BabaYagaTrip,
        AbilityName::BananaTrip,
        AbilityName::CentaurTrample,
        AbilityName::CopyLead,
        AbilityName::FlipFlopSwap,
        AbilityName::GunkSlime,
        AbilityName::HugeBabyPush,
        AbilityName::MagicalReroll,
        AbilityName::PartyBoost,
        AbilityName::PartyPull,
        AbilityName::RomanticMove,
        AbilityName::ScoochStep,
    ];

    /// Canonical string form of this name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AbilityName::BabaYagaTrip => "BabaYagaTrip",
            AbilityName::BananaTrip => "BananaTrip",
            AbilityName::CentaurTrample => "CentaurTrample",
            AbilityName::CopyLead => "CopyLead",
            AbilityName::FlipFlopSwap => "FlipFlopSwap",
            AbilityName::GunkSlime => "GunkSlime",
            AbilityName::HugeBabyPush => "HugeBabyPush",
            AbilityName::MagicalReroll => "MagicalReroll",
            AbilityName::PartyBoost => "PartyBoost",
            AbilityName::PartyPull => "PartyPull",
            AbilityName::RomanticMove => "RomanticMove",
            AbilityName::ScoochStep => "ScoochStep",
        }
    }
}

impl fmt::Display for AbilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbilityName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbilityName::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| EngineError::UnknownAbility(s.to_owned()))
    }
}

/// A named persistent modifier, either racer-scoped or tile-scoped.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierName {
    /// Gunk's roll-reducing aura (racer-scoped).
    GunkSlimeModifier,
    /// The blocker maintained on Huge Baby's tile.
    HugeBabyBlocker,
    /// Board tile that moves landers by a fixed delta.
    MoveDeltaTile,
    /// Party Animal's own-roll bonus (racer-scoped).
    PartySelfBoost,
    /// Magician's reroll charm (racer-scoped).
    RerollCharm,
    /// One-shot roll penalty picked up from a slimed tile (racer-scoped).
    SlimeDebuff,
    /// Consumable slime on a tile; fades when traversed.
    SlimeTile,
    /// Board tile that trips landers.
    TripTile,
    /// Board tile that adjusts victory points on landing.
    VictoryPointTile,
}

impl ModifierName {
    /// Canonical string form of this name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModifierName::GunkSlimeModifier => "GunkSlimeModifier",
            ModifierName::HugeBabyBlocker => "HugeBabyBlocker",
            ModifierName::MoveDeltaTile => "MoveDeltaTile",
            ModifierName::PartySelfBoost => "PartySelfBoost",
            ModifierName::RerollCharm => "RerollCharm",
            ModifierName::SlimeDebuff => "SlimeDebuff",
            ModifierName::SlimeTile => "SlimeTile",
            ModifierName::TripTile => "TripTile",
            ModifierName::VictoryPointTile => "VictoryPointTile",
        }
    }
}

impl fmt::Display for ModifierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named board layout (see [`crate::Board`] for the factories).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardName {
    /// 21 tiles, finish at 20, trip tiles at 4, 10, and 18.
    Standard,
    /// 25 tiles with every hazard kind: trips, move deltas, a VP tile, slime.
    Gauntlet,
}

impl BoardName {
    /// All board names, in canonical order.
    pub const ALL: [BoardName; 2] = [BoardName::Standard, BoardName::Gauntlet];

    /// Canonical string form of this name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BoardName::Standard => "Standard",
            BoardName::Gauntlet => "Gauntlet",
        }
    }
}

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoardName::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| EngineError::UnknownBoard(s.to_owned()))
    }
}

/// Provenance tag carried by every event.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Source {
    /// Emitted by a racer ability.
    Ability(AbilityName),
    /// Emitted by a persistent modifier.
    Modifier(ModifierName),
    /// Emitted by a board tile hook.
    Board,
    /// Emitted by the turn driver or dice pipeline.
    System,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Ability(a) => write!(f, "{a}"),
            Source::Modifier(m) => write!(f, "{m}"),
            Source::Board => f.write_str("Board"),
            Source::System => f.write_str("System"),
        }
    }
}
