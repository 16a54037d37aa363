// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core engine implementation.
//!
//! One [`Engine`] owns the entire game: state, queue, subscriptions, loop
//! guard, dice, and the injected sinks. It is strictly single-threaded;
//! embedders running many seeds give each worker its own engine and dice
//! handle.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::ability::{self, SubscriptionTable};
use crate::board::SpaceModifierKind;
use crate::event::{Event, EventKind, EventTag, MoveDistanceQuery, Phase, TriggerEmission};
use crate::flow;
use crate::ident::{AbilityName, Source};
use crate::log::{LogLevel, LogSink, NullLogSink};
use crate::loop_detection::{LoopDetector, LoopLimits};
use crate::movement;
use crate::rng::{DiceRoller, XorShift64Dice};
use crate::rolls;
use crate::sandbox::RaceConfig;
use crate::scheduler::Scheduler;
use crate::state::{
    GameState, Hash, RacerModifier, RacerModifierKind, RacerState, RollState,
};
use crate::telemetry::{NullTelemetrySink, TelemetrySink};

/// Errors emitted by the engine.
///
/// Construction fails fast on bad input; once a race is running, anomalies
/// are clamped, dropped, or skipped instead of raised, so termination is
/// never in question.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A racer name that is not in the roster registry.
    #[error("unknown racer name: {0}")]
    UnknownRacer(String),
    /// A board name with no registered factory.
    #[error("unknown board name: {0}")]
    UnknownBoard(String),
    /// An ability name that is not in the registry.
    #[error("unknown ability name: {0}")]
    UnknownAbility(String),
    /// A race needs at least one racer.
    #[error("roster must contain at least one racer")]
    EmptyRoster,
    /// Internal invariant violated (engine state corruption).
    #[error("internal invariant violated: {0}")]
    InternalCorruption(&'static str),
}

/// The deterministic race engine.
pub struct Engine {
    pub(crate) state: GameState,
    pub(crate) scheduler: Scheduler,
    pub(crate) subscriptions: SubscriptionTable,
    pub(crate) loop_guard: LoopDetector,
    pub(crate) dice: Box<dyn DiceRoller>,
    pub(crate) log: Arc<dyn LogSink>,
    pub(crate) telemetry: Arc<dyn TelemetrySink>,
    /// Depth of the event currently being dispatched; children inherit +1.
    pub(crate) dispatch_depth: u32,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Engine {
    // ---------- Accessors ----------

    /// Read-only view of the game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The racer at `idx`, if it exists.
    #[must_use]
    pub fn get_racer(&self, idx: usize) -> Option<&RacerState> {
        self.state.racers.get(idx)
    }

    /// Indices of active racers on `tile`, in roster order.
    #[must_use]
    pub fn racers_at(&self, tile: usize) -> Vec<usize> {
        self.state.racers_at(tile)
    }

    /// Completed turns.
    #[must_use]
    pub fn turn_index(&self) -> u32 {
        self.state.turn_index
    }

    /// Canonical fingerprint of the observable state.
    #[must_use]
    pub fn state_hash(&self) -> Hash {
        self.state.state_hash()
    }

    /// Removes a racer from the race (embedder drop-out rules). Returns
    /// whether anything changed; finished racers are left alone.
    pub fn eliminate_racer(&mut self, racer_idx: usize) -> bool {
        let Some(racer) = self.state.racers.get_mut(racer_idx) else {
            return false;
        };
        if !racer.active() {
            return false;
        }
        racer.eliminated = true;
        self.log_info(format_args!("racer #{racer_idx} is eliminated"));
        true
    }

    // ---------- Logging ----------

    pub(crate) fn log_debug(&self, args: fmt::Arguments<'_>) {
        self.log.record(LogLevel::Debug, args);
    }

    pub(crate) fn log_info(&self, args: fmt::Arguments<'_>) {
        self.log.record(LogLevel::Info, args);
    }

    pub(crate) fn log_warn(&self, args: fmt::Arguments<'_>) {
        self.log.record(LogLevel::Warn, args);
    }

    // ---------- Scheduling ----------

    /// Enqueues `event` with the reactor distance derived from its
    /// responsible racer. Events pushed after the race ends are accepted but
    /// never dispatched.
    pub fn push_event(&mut self, event: Event) {
        let n = self.state.racers.len();
        let distance = match event.responsible_racer_idx {
            Some(r) if n > 0 => (r % n + n - self.state.current_racer_idx % n) % n,
            _ => 0,
        };
        let depth = self.dispatch_depth + 1;
        let tag = event.kind.tag();
        let phase = event.phase;
        let serial = self.scheduler.push(event, distance, depth);
        self.log_debug(format_args!(
            "enqueued {} (phase={}, dist={distance}, serial={serial})",
            tag.as_str(),
            phase.0
        ));
    }

    /// Publishes `event` synchronously to its subscribers, ordered by
    /// reactor distance from the current racer (FIFO within a distance).
    /// Inactive owners are skipped. Anything the handlers schedule joins the
    /// priority queue as usual.
    pub fn publish_to_subscribers(&mut self, event: &Event) {
        let n = self.state.racers.len();
        if n == 0 {
            return;
        }
        let current = self.state.current_racer_idx;
        let mut subs = self.subscriptions.subscribers_for(event.kind.tag()).to_vec();
        subs.sort_by_key(|s| (s.owner_idx % n + n - current % n) % n);
        for sub in subs {
            if !self
                .state
                .racers
                .get(sub.owner_idx)
                .is_some_and(RacerState::active)
            {
                continue;
            }
            if let Some(execute) = ability::descriptor(sub.ability).execute {
                execute(self, event, sub.owner_idx);
            }
        }
    }

    /// Schedules the `AbilityTriggered` marker for `ability`, unless its
    /// owner has left the race.
    pub(crate) fn emit_ability_trigger(
        &mut self,
        ability: AbilityName,
        responsible_racer_idx: usize,
        target_racer_idx: Option<usize>,
    ) {
        if !self
            .state
            .racers
            .get(responsible_racer_idx)
            .is_some_and(RacerState::active)
        {
            return;
        }
        self.push_event(Event {
            kind: EventKind::AbilityTriggered {
                ability,
                responsible_racer_idx,
                target_racer_idx,
            },
            phase: Phase::ABILITY,
            source: Source::Ability(ability),
            responsible_racer_idx: Some(responsible_racer_idx),
            emit_ability_triggered: TriggerEmission::Never,
        });
    }

    // ---------- Ability lifecycle ----------

    /// Attaches `ability` to `racer_idx`: records it on the racer, registers
    /// its subscriptions, installs its racer modifier, and runs its attach
    /// hook.
    pub(crate) fn attach_ability(&mut self, racer_idx: usize, ability: AbilityName) {
        let descriptor = ability::descriptor(ability);
        self.state.racers[racer_idx].abilities.insert(ability);
        for &tag in descriptor.triggers {
            self.subscriptions.subscribe(tag, ability, racer_idx);
        }
        if let Some(kind) = descriptor.installs {
            self.state.racers[racer_idx].modifiers.push(RacerModifier {
                kind,
                owner_idx: racer_idx,
            });
        }
        if let Some(on_attach) = descriptor.on_attach {
            on_attach(self, racer_idx);
        }
    }

    /// Atomically replaces `racer_idx`'s ability set: every old ability
    /// detaches (subscriptions, modifiers, detach hooks), then the new set
    /// attaches. The subscription table stays in bijection with the racer's
    /// abilities throughout.
    pub fn update_racer_abilities(
        &mut self,
        racer_idx: usize,
        new_abilities: std::collections::BTreeSet<AbilityName>,
    ) {
        let old: Vec<AbilityName> = self.state.racers[racer_idx]
            .abilities
            .iter()
            .copied()
            .collect();
        for ability in old {
            if let Some(on_detach) = ability::descriptor(ability).on_detach {
                on_detach(self, racer_idx);
            }
        }
        self.subscriptions.unsubscribe_all(racer_idx);
        self.state.racers[racer_idx].modifiers.clear();
        self.state.racers[racer_idx].abilities.clear();
        for ability in new_abilities {
            self.attach_ability(racer_idx, ability);
        }
    }

    // ---------- Board hooks ----------

    /// Runs the landing hooks of every modifier on `tile`, in priority
    /// order. Hooks may schedule further events and may consume their own
    /// modifier.
    pub(crate) fn trigger_on_land(&mut self, tile: usize, racer_idx: usize) {
        let mods = self.state.board.modifiers_at(tile);
        for modifier in mods {
            if let Some(owner) = modifier.owner_idx {
                if !self.state.racers.get(owner).is_some_and(RacerState::active) {
                    continue;
                }
            }
            match modifier.kind {
                SpaceModifierKind::Trip => {
                    self.log_info(format_args!(
                        "Board: tile {tile} trips racer #{racer_idx}"
                    ));
                    self.push_event(Event::from_board(
                        EventKind::TripCmd {
                            target_racer_idx: racer_idx,
                        },
                        Phase::BOARD,
                        Source::Modifier(modifier.name()),
                    ));
                }
                SpaceModifierKind::VictoryPoint { delta } => {
                    let racer = &mut self.state.racers[racer_idx];
                    if delta >= 0 {
                        racer.victory_points += u32::try_from(delta).unwrap_or(0);
                    } else {
                        let loss = u32::try_from(-i64::from(delta)).unwrap_or(0);
                        racer.victory_points = racer.victory_points.saturating_sub(loss);
                    }
                    self.log_info(format_args!(
                        "Board: tile {tile} adjusts racer #{racer_idx} VP by {delta}"
                    ));
                }
                SpaceModifierKind::MoveDelta { delta } => {
                    self.log_info(format_args!(
                        "Board: tile {tile} shoves racer #{racer_idx} by {delta}"
                    ));
                    self.push_event(Event::from_board(
                        EventKind::MoveCmd {
                            target_racer_idx: racer_idx,
                            distance: delta,
                        },
                        Phase::BOARD,
                        Source::Modifier(modifier.name()),
                    ));
                }
                SpaceModifierKind::Blocker => {}
                SpaceModifierKind::Slime => {
                    if modifier.owner_idx == Some(racer_idx) {
                        continue;
                    }
                    self.log_info(format_args!(
                        "Board: racer #{racer_idx} steps in slime on tile {tile}; it fades"
                    ));
                    self.state.racers[racer_idx].modifiers.push(RacerModifier {
                        kind: RacerModifierKind::SlimeDebuff,
                        owner_idx: racer_idx,
                    });
                    self.state.board.remove_dynamic(
                        tile,
                        modifier.name(),
                        modifier.owner_idx,
                    );
                }
            }
        }
    }

    // ---------- Roll pipeline ----------

    /// Runs every roll-modification modifier against `query`, iterating
    /// racers in owner order rotated from the current racer and each
    /// racer's modifiers in attach order. Inactive owners are skipped.
    pub(crate) fn apply_roll_modifiers(&mut self, query: &mut MoveDistanceQuery) {
        let n = self.state.racers.len();
        let current = self.state.current_racer_idx;
        let mut entries: Vec<(usize, RacerModifierKind)> = Vec::new();
        for offset in 0..n {
            let owner = (current + offset) % n;
            if !self.state.racers[owner].active() {
                continue;
            }
            for m in &self.state.racers[owner].modifiers {
                entries.push((owner, m.kind));
            }
        }

        for (owner, kind) in entries {
            match kind {
                RacerModifierKind::GunkSlime => {
                    if query.racer_idx == owner {
                        continue;
                    }
                    query.modifiers.push(-1);
                    self.log_info(format_args!(
                        "GunkSlime: racer #{owner} slows racer #{} by 1",
                        query.racer_idx
                    ));
                    self.emit_ability_trigger(
                        AbilityName::GunkSlime,
                        owner,
                        Some(query.racer_idx),
                    );
                }
                RacerModifierKind::PartySelfBoost => {
                    if query.racer_idx != owner {
                        continue;
                    }
                    let pos = self.state.racers[owner].position;
                    let bonus = self
                        .state
                        .racers
                        .iter()
                        .filter(|r| r.idx != owner && r.active() && r.position == pos)
                        .count();
                    if bonus == 0 {
                        continue;
                    }
                    query.modifiers.push(i32::try_from(bonus).unwrap_or(0));
                    self.log_info(format_args!(
                        "PartyBoost: racer #{owner} gets +{bonus} from co-occupants"
                    ));
                    self.emit_ability_trigger(AbilityName::PartyBoost, owner, Some(owner));
                }
                RacerModifierKind::RerollCharm => {
                    if query.racer_idx != owner || query.base_roll > 2 {
                        continue;
                    }
                    let reroll = self.dice.roll_d6();
                    query
                        .modifiers
                        .push(i32::try_from(reroll).unwrap_or(0) - i32::try_from(query.base_roll).unwrap_or(0));
                    self.state.racers[owner].reroll_count += 1;
                    self.log_info(format_args!(
                        "MagicalReroll: racer #{owner} rerolls {} into {reroll}",
                        query.base_roll
                    ));
                    self.emit_ability_trigger(AbilityName::MagicalReroll, owner, Some(owner));
                }
                RacerModifierKind::SlimeDebuff => {
                    if query.racer_idx != owner {
                        continue;
                    }
                    query.modifiers.push(-1);
                    self.state.racers[owner]
                        .modifiers
                        .retain(|m| m.kind != RacerModifierKind::SlimeDebuff);
                    self.log_info(format_args!(
                        "SlimeDebuff: racer #{owner} loses 1 and shakes the slime off"
                    ));
                }
            }
        }
    }

    // ---------- Main loop ----------

    /// Advances one turn: clears the guard, fires `TurnStart`, drains the
    /// queue, reports turn end, and rotates the cursor.
    pub fn run_turn(&mut self) {
        if self.state.race_over {
            return;
        }
        self.loop_guard.clear();
        self.state.roll_state = RollState {
            serial_id: self.state.roll_state.serial_id,
            base_value: 0,
            final_value: 0,
        };
        let current = self.state.current_racer_idx;
        self.log_info(format_args!(
            "=== turn {}: racer #{current} ===",
            self.state.turn_index
        ));
        self.dispatch_depth = 0;
        self.push_event(Event::system(
            EventKind::TurnStart { racer_idx: current },
            Phase::SYSTEM,
            Some(current),
        ));
        self.drain_queue();
        debug_assert!(self.scheduler.is_empty());
        let turn = self.state.turn_index;
        self.telemetry.on_turn_end(&self.state, turn);
        self.state.turn_index += 1;
        flow::advance_turn(self);
    }

    /// Runs turns until the race ends or the configured turn ceiling is
    /// reached.
    pub fn run_race(&mut self) {
        let max_turns = self.state.rules.max_turns.unwrap_or(u32::MAX);
        while !self.state.race_over && self.state.turn_index < max_turns {
            self.run_turn();
        }
        self.telemetry.on_race_end(&self.state);
    }

    fn drain_queue(&mut self) {
        loop {
            if self.state.race_over {
                self.scheduler.clear();
                break;
            }
            let Some(sched) = self.scheduler.pop() else {
                break;
            };
            let next_phase = self.scheduler.peek_phase();
            let queue_len = self.scheduler.len();
            if let Some(reason) = self.loop_guard.check(&self.state, next_phase, queue_len, &sched)
            {
                self.log_warn(format_args!(
                    "loop guard skips {}: {reason}",
                    sched.event.kind.tag().as_str()
                ));
                let turn = self.state.turn_index;
                self.telemetry.on_event_skipped(&sched.event, &reason, turn);
                continue;
            }
            self.dispatch_depth = sched.depth;
            self.scheduler.begin_dispatch();
            self.handle_event(&sched.event);
            self.dispatch_depth = 0;
            let turn = self.state.turn_index;
            self.telemetry.on_event(&sched.event, &self.state, turn);
        }
        self.dispatch_depth = 0;
    }

    fn handle_event(&mut self, event: &Event) {
        match event.kind.tag() {
            EventTag::TurnStart => flow::on_turn_start(self, event),
            EventTag::RollAndMainMove => rolls::on_roll_and_main_move(self, event),
            EventTag::MoveCmd => movement::handle_move_cmd(self, event),
            EventTag::WarpCmd => movement::handle_warp_cmd(self, event),
            EventTag::SimultaneousWarpCmd => movement::handle_simultaneous_warp_cmd(self, event),
            EventTag::TripCmd => movement::handle_trip_cmd(self, event),
            EventTag::Passing
            | EventTag::AbilityTriggered
            | EventTag::TripRecovery
            | EventTag::PreMove
            | EventTag::PostMove
            | EventTag::PreWarp
            | EventTag::PostWarp => self.publish_to_subscribers(event),
        }
    }

    // ---------- Invariant audit ----------

    /// Checks the structural invariants that must hold between events.
    /// Violations are engine bugs, never user-input effects.
    pub fn verify_invariants(&self) -> Result<(), EngineError> {
        if !self.state.race_over {
            let cursor = self
                .state
                .racers
                .get(self.state.current_racer_idx)
                .ok_or(EngineError::InternalCorruption("cursor out of range"))?;
            if !cursor.active() {
                return Err(EngineError::InternalCorruption(
                    "cursor rests on an inactive racer",
                ));
            }
        }
        let finish = self.state.board.finish_tile();
        for racer in &self.state.racers {
            if racer.finished() && racer.position != finish {
                return Err(EngineError::InternalCorruption(
                    "finished racer moved off the finish tile",
                ));
            }
            let expected: std::collections::BTreeSet<AbilityName> = racer
                .abilities
                .iter()
                .copied()
                .filter(|a| !ability::descriptor(*a).triggers.is_empty())
                .collect();
            if expected != self.subscriptions.subscribed_abilities_of(racer.idx) {
                return Err(EngineError::InternalCorruption(
                    "subscription set out of sync with ability set",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Engine builder
// ============================================================================

/// Fluent builder for [`Engine`] instances.
///
/// Defaults: xorshift64* dice seeded from the config, discarded logs, no
/// telemetry, default loop limits.
///
/// # Example
///
/// ```rust
/// use derby_core::{BoardName, EngineBuilder, RaceConfig, RacerName};
///
/// let config = RaceConfig::new(
///     vec![RacerName::Centaur, RacerName::Banana],
///     BoardName::Standard,
///     42,
/// );
/// let mut engine = EngineBuilder::new(config).build()?;
/// engine.run_race();
/// # Ok::<(), derby_core::EngineError>(())
/// ```
pub struct EngineBuilder {
    config: RaceConfig,
    dice: Option<Box<dyn DiceRoller>>,
    log: Option<Arc<dyn LogSink>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    loop_limits: LoopLimits,
    start_positions: Option<Vec<usize>>,
    ability_overrides: Vec<(usize, Vec<AbilityName>)>,
}

impl EngineBuilder {
    /// Starts a builder for `config`.
    #[must_use]
    pub fn new(config: RaceConfig) -> Self {
        EngineBuilder {
            config,
            dice: None,
            log: None,
            telemetry: None,
            loop_limits: LoopLimits::default(),
            start_positions: None,
            ability_overrides: Vec::new(),
        }
    }

    /// Injects a dice handle (tests script rolls through this).
    #[must_use]
    pub fn dice(mut self, dice: Box<dyn DiceRoller>) -> Self {
        self.dice = Some(dice);
        self
    }

    /// Injects a log sink.
    #[must_use]
    pub fn log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Injects a telemetry sink.
    #[must_use]
    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Overrides the loop-detection limits.
    #[must_use]
    pub fn loop_limits(mut self, limits: LoopLimits) -> Self {
        self.loop_limits = limits;
        self
    }

    /// Starts the racers at the given tiles instead of tile 0. Shorter
    /// vectors leave the remaining racers at 0.
    #[must_use]
    pub fn start_positions(mut self, positions: &[usize]) -> Self {
        self.start_positions = Some(positions.to_vec());
        self
    }

    /// Gives `racer_idx` the listed abilities instead of its defaults.
    #[must_use]
    pub fn abilities_for(mut self, racer_idx: usize, abilities: &[AbilityName]) -> Self {
        self.ability_overrides.push((racer_idx, abilities.to_vec()));
        self
    }

    /// Builds the engine, attaching every racer's default abilities.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyRoster`] for an empty roster.
    pub fn build(self) -> Result<Engine, EngineError> {
        if self.config.racers.is_empty() {
            return Err(EngineError::EmptyRoster);
        }
        let board = crate::board::Board::build(self.config.board);
        let racers: Vec<RacerState> = self
            .config
            .racers
            .iter()
            .enumerate()
            .map(|(idx, &name)| {
                let start = self
                    .start_positions
                    .as_ref()
                    .and_then(|p| p.get(idx).copied())
                    .unwrap_or(0);
                RacerState::new(idx, name, start)
            })
            .collect();
        let state = GameState {
            racers,
            board,
            rules: self.config.rules,
            current_racer_idx: 0,
            roll_state: RollState::default(),
            finished_order: Vec::new(),
            race_over: false,
            turn_index: 0,
        };
        let dice = self
            .dice
            .unwrap_or_else(|| Box::new(XorShift64Dice::new(self.config.seed)));
        let log = self.log.unwrap_or_else(|| Arc::new(NullLogSink));
        let telemetry = self
            .telemetry
            .unwrap_or_else(|| Arc::new(NullTelemetrySink));

        let mut engine = Engine {
            state,
            scheduler: Scheduler::new(self.config.rules.timing),
            subscriptions: SubscriptionTable::new(),
            loop_guard: LoopDetector::new(self.loop_limits),
            dice,
            log,
            telemetry,
            dispatch_depth: 0,
        };
        for idx in 0..engine.state.racers.len() {
            let name = engine.state.racers[idx].name;
            let overridden = self
                .ability_overrides
                .iter()
                .rev()
                .find(|(i, _)| *i == idx)
                .map(|(_, abilities)| abilities.clone());
            let abilities = overridden
                .unwrap_or_else(|| crate::ability::default_abilities(name).to_vec());
            for ability in abilities {
                engine.attach_ability(idx, ability);
            }
        }
        Ok(engine)
    }
}
