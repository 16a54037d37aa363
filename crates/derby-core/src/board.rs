// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Boards, tiles, and the space-modifier plane.
//!
//! A board is a line of tiles, each carrying zero or more space modifiers.
//! Static modifiers (trips, deltas, VP) come from the board factory; dynamic
//! ones (blockers, slime) are placed and removed during the race. Approach
//! hooks resolve where a mover actually ends up; landing hooks react once it
//! commits.

use std::collections::BTreeMap;

use crate::constants::MAX_APPROACH_ITERATIONS;
use crate::ident::{BoardName, ModifierName};
use crate::log::{LogLevel, LogSink};
use crate::state::GameState;

/// A persistent effect attached to a tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpaceModifier {
    /// What the modifier does.
    pub kind: SpaceModifierKind,
    /// Hook ordering on the tile; lower runs first.
    pub priority: u8,
    /// Owning racer for ability-placed modifiers; `None` for board-static.
    pub owner_idx: Option<usize>,
}

impl SpaceModifier {
    /// Default hook priority.
    pub const DEFAULT_PRIORITY: u8 = 5;

    /// A board-static modifier at default priority.
    #[must_use]
    pub fn board_static(kind: SpaceModifierKind) -> Self {
        SpaceModifier {
            kind,
            priority: Self::DEFAULT_PRIORITY,
            owner_idx: None,
        }
    }

    /// An ability-placed modifier owned by `owner_idx`.
    #[must_use]
    pub fn owned(kind: SpaceModifierKind, owner_idx: usize) -> Self {
        SpaceModifier {
            kind,
            priority: Self::DEFAULT_PRIORITY,
            owner_idx: Some(owner_idx),
        }
    }

    /// The modifier's stable name.
    #[must_use]
    pub fn name(&self) -> ModifierName {
        self.kind.name()
    }
}

/// Tile-scoped modifier behaviors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpaceModifierKind {
    /// Trips whoever lands here.
    Trip,
    /// Adjusts the lander's victory points (saturating at zero).
    VictoryPoint {
        /// Signed VP delta.
        delta: i32,
    },
    /// Shoves the lander onward or backward by a fixed delta.
    MoveDelta {
        /// Signed tile delta.
        delta: i32,
    },
    /// Nobody but the owner may stop here; approachers are shoved one tile
    /// back.
    Blocker,
    /// Consumable slime: a non-owner lander picks up a one-shot roll debuff
    /// and the slime fades.
    Slime,
}

impl SpaceModifierKind {
    /// The stable name of this modifier kind.
    #[must_use]
    pub fn name(self) -> ModifierName {
        match self {
            SpaceModifierKind::Trip => ModifierName::TripTile,
            SpaceModifierKind::VictoryPoint { .. } => ModifierName::VictoryPointTile,
            SpaceModifierKind::MoveDelta { .. } => ModifierName::MoveDeltaTile,
            SpaceModifierKind::Blocker => ModifierName::HugeBabyBlocker,
            SpaceModifierKind::Slime => ModifierName::SlimeTile,
        }
    }
}

/// An ordered line of tiles with static and dynamic modifier planes.
#[derive(Clone, Debug)]
pub struct Board {
    name: BoardName,
    length: usize,
    finish_tile: usize,
    layout: BTreeMap<usize, Vec<SpaceModifier>>,
    dynamic: BTreeMap<usize, Vec<SpaceModifier>>,
}

impl Board {
    /// Builds the named board.
    #[must_use]
    pub fn build(name: BoardName) -> Self {
        match name {
            BoardName::Standard => Self::standard(),
            BoardName::Gauntlet => Self::gauntlet(),
        }
    }

    /// 21 tiles, finish at 20, trip tiles at 4, 10, and 18.
    fn standard() -> Self {
        let mut layout: BTreeMap<usize, Vec<SpaceModifier>> = BTreeMap::new();
        for tile in [4usize, 10, 18] {
            layout
                .entry(tile)
                .or_default()
                .push(SpaceModifier::board_static(SpaceModifierKind::Trip));
        }
        Board {
            name: BoardName::Standard,
            length: 21,
            finish_tile: 20,
            layout,
            dynamic: BTreeMap::new(),
        }
    }

    /// 25 tiles exercising every hazard kind: trips at 5 and 17, a +2 shove
    /// at 8, a −3 shove at 14, a VP bonus at 11, and consumable slime at 19.
    fn gauntlet() -> Self {
        let mut layout: BTreeMap<usize, Vec<SpaceModifier>> = BTreeMap::new();
        for tile in [5usize, 17] {
            layout
                .entry(tile)
                .or_default()
                .push(SpaceModifier::board_static(SpaceModifierKind::Trip));
        }
        layout
            .entry(8)
            .or_default()
            .push(SpaceModifier::board_static(SpaceModifierKind::MoveDelta {
                delta: 2,
            }));
        layout
            .entry(14)
            .or_default()
            .push(SpaceModifier::board_static(SpaceModifierKind::MoveDelta {
                delta: -3,
            }));
        layout
            .entry(11)
            .or_default()
            .push(SpaceModifier::board_static(
                SpaceModifierKind::VictoryPoint { delta: 1 },
            ));
        // Slime is consumable, so it lives on the dynamic plane even when
        // seeded by the factory.
        let mut dynamic: BTreeMap<usize, Vec<SpaceModifier>> = BTreeMap::new();
        dynamic
            .entry(19)
            .or_default()
            .push(SpaceModifier::board_static(SpaceModifierKind::Slime));
        Board {
            name: BoardName::Gauntlet,
            length: 25,
            finish_tile: 24,
            layout,
            dynamic,
        }
    }

    /// The board's name.
    #[must_use]
    pub fn name(&self) -> BoardName {
        self.name
    }

    /// Number of tiles.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Index of the finish tile.
    #[must_use]
    pub fn finish_tile(&self) -> usize {
        self.finish_tile
    }

    /// The dynamic-modifier plane, keyed by tile.
    #[must_use]
    pub fn dynamic_modifiers(&self) -> &BTreeMap<usize, Vec<SpaceModifier>> {
        &self.dynamic
    }

    /// All modifiers on `tile`, static then dynamic, sorted by priority
    /// (stable, so same-priority modifiers keep plane-then-insertion order).
    #[must_use]
    pub fn modifiers_at(&self, tile: usize) -> Vec<SpaceModifier> {
        let mut mods: Vec<SpaceModifier> = Vec::new();
        if let Some(ms) = self.layout.get(&tile) {
            mods.extend_from_slice(ms);
        }
        if let Some(ms) = self.dynamic.get(&tile) {
            mods.extend_from_slice(ms);
        }
        mods.sort_by_key(|m| m.priority);
        mods
    }

    /// Places a dynamic modifier on `tile`.
    pub fn place_dynamic(&mut self, tile: usize, modifier: SpaceModifier) {
        self.dynamic.entry(tile).or_default().push(modifier);
    }

    /// Removes the first dynamic modifier on `tile` matching (name, owner).
    /// Returns whether anything was removed.
    pub fn remove_dynamic(
        &mut self,
        tile: usize,
        name: ModifierName,
        owner_idx: Option<usize>,
    ) -> bool {
        let Some(ms) = self.dynamic.get_mut(&tile) else {
            return false;
        };
        let Some(pos) = ms
            .iter()
            .position(|m| m.name() == name && m.owner_idx == owner_idx)
        else {
            return false;
        };
        ms.remove(pos);
        if ms.is_empty() {
            self.dynamic.remove(&tile);
        }
        true
    }

    /// Removes every dynamic modifier owned by `owner_idx` with `name`,
    /// anywhere on the board. Returns the number removed.
    pub fn remove_dynamic_owned_by(&mut self, name: ModifierName, owner_idx: usize) -> usize {
        let mut removed = 0;
        let tiles: Vec<usize> = self.dynamic.keys().copied().collect();
        for tile in tiles {
            while self.remove_dynamic(tile, name, Some(owner_idx)) {
                removed += 1;
            }
        }
        removed
    }

    /// Resolves the tile a mover actually arrives at.
    ///
    /// Walks the approach hooks of every modifier covering the candidate
    /// tile, in priority order, re-running from the redirected tile until a
    /// fixed point. Resolution is bounded twofold: a candidate tile is never
    /// visited twice, and the walk stops after
    /// [`MAX_APPROACH_ITERATIONS`] rounds. May return a negative tile; the
    /// caller clamps and logs.
    #[must_use]
    pub fn resolve_position(
        &self,
        state: &GameState,
        intended: i64,
        mover_idx: usize,
        log: &dyn LogSink,
    ) -> i64 {
        let mut tile = intended;
        let mut visited: Vec<i64> = vec![tile];
        for _ in 0..MAX_APPROACH_ITERATIONS {
            let next = self.approach_once(state, tile, mover_idx);
            if next == tile {
                return tile;
            }
            if visited.contains(&next) {
                log.record(
                    LogLevel::Warn,
                    format_args!(
                        "approach resolution revisited tile {next} for racer #{mover_idx}; stopping"
                    ),
                );
                return next;
            }
            visited.push(next);
            tile = next;
        }
        log.record(
            LogLevel::Warn,
            format_args!(
                "approach resolution hit the iteration cap for racer #{mover_idx}; stopping at {tile}"
            ),
        );
        tile
    }

    /// One round of approach hooks at `tile`.
    fn approach_once(&self, state: &GameState, tile: i64, mover_idx: usize) -> i64 {
        let Ok(tile_idx) = usize::try_from(tile) else {
            return tile;
        };
        let mut out = tile;
        for m in self.modifiers_at(tile_idx) {
            if let SpaceModifierKind::Blocker = m.kind {
                let blocks = match m.owner_idx {
                    Some(owner) => {
                        owner != mover_idx
                            && state.racers.get(owner).is_some_and(|r| r.active())
                    }
                    None => true,
                };
                if blocks {
                    out -= 1;
                }
            }
        }
        out
    }
}
