// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

//! Shared race-scenario harness: scripted dice, start positions, ability
//! overrides, buffered logs, and counting sinks.

use std::sync::{Arc, Mutex};

use derby_core::{
    AbilityName, BoardName, BufferLogSink, Engine, EngineBuilder, GameRules, GameState, LogSink,
    MetricsRecorder, RaceConfig, RacerName, ScriptedDice, SkipReason, TelemetrySink,
};

/// One racer's setup in a scenario.
#[derive(Clone, Debug)]
pub struct RacerSpec {
    /// Racer identity.
    pub name: RacerName,
    /// Starting tile.
    pub start: usize,
    /// Ability override; `None` uses the racer's defaults.
    pub abilities: Option<Vec<AbilityName>>,
}

impl RacerSpec {
    /// A racer at tile 0 with default abilities.
    pub fn new(name: RacerName) -> Self {
        RacerSpec {
            name,
            start: 0,
            abilities: None,
        }
    }

    /// Moves the starting tile.
    pub fn at(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    /// Overrides the ability set.
    pub fn with_abilities(mut self, abilities: &[AbilityName]) -> Self {
        self.abilities = Some(abilities.to_vec());
        self
    }
}

/// Counts loop-guard skips and dispatched events.
#[derive(Debug, Default)]
pub struct CountingSink {
    skips: Mutex<Vec<SkipReason>>,
    events: Mutex<usize>,
}

impl CountingSink {
    /// Creates an empty counting sink.
    pub fn new() -> Self {
        CountingSink::default()
    }

    /// Skips recorded so far.
    pub fn skips(&self) -> Vec<SkipReason> {
        self.skips.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Dispatched events recorded so far.
    pub fn event_count(&self) -> usize {
        self.events.lock().map(|g| *g).unwrap_or(0)
    }
}

impl TelemetrySink for CountingSink {
    fn on_event(&self, _event: &derby_core::Event, _state: &GameState, _turn_index: u32) {
        if let Ok(mut g) = self.events.lock() {
            *g += 1;
        }
    }

    fn on_event_skipped(
        &self,
        _event: &derby_core::Event,
        reason: &SkipReason,
        _turn_index: u32,
    ) {
        if let Ok(mut g) = self.skips.lock() {
            g.push(*reason);
        }
    }
}

/// A ready-to-run engine with scripted dice and capturing sinks.
pub struct RaceScenario {
    /// The engine under test.
    pub engine: Engine,
    /// Captured log lines.
    pub log: Arc<BufferLogSink>,
    /// Per-racer metrics.
    pub metrics: Arc<MetricsRecorder>,
    /// Loop-guard skip counts.
    pub counters: Arc<CountingSink>,
}

impl RaceScenario {
    /// A scenario on the standard board with default rules.
    pub fn new(specs: &[RacerSpec], rolls: &[u32]) -> Self {
        Self::with_board(specs, rolls, BoardName::Standard, GameRules::default())
    }

    /// A fully customized scenario.
    pub fn with_board(
        specs: &[RacerSpec],
        rolls: &[u32],
        board: BoardName,
        rules: GameRules,
    ) -> Self {
        let mut config = RaceConfig::new(specs.iter().map(|s| s.name).collect(), board, 0);
        config.rules = rules;

        let log = Arc::new(BufferLogSink::new());
        let metrics = Arc::new(MetricsRecorder::new());
        let counters = Arc::new(CountingSink::new());
        let fanout = Arc::new(FanoutSink {
            sinks: vec![
                Arc::clone(&metrics) as Arc<dyn TelemetrySink>,
                Arc::clone(&counters) as Arc<dyn TelemetrySink>,
            ],
        });

        let starts: Vec<usize> = specs.iter().map(|s| s.start).collect();
        let mut builder = EngineBuilder::new(config)
            .dice(Box::new(ScriptedDice::new(rolls.iter().copied())))
            .log(Arc::clone(&log) as Arc<dyn LogSink>)
            .telemetry(fanout as Arc<dyn TelemetrySink>)
            .start_positions(&starts);
        for (idx, spec) in specs.iter().enumerate() {
            if let Some(abilities) = &spec.abilities {
                builder = builder.abilities_for(idx, abilities);
            }
        }
        let engine = builder.build().unwrap();
        RaceScenario {
            engine,
            log,
            metrics,
            counters,
        }
    }

    /// Runs `n` turns.
    pub fn run_turns(&mut self, n: usize) {
        for _ in 0..n {
            self.engine.run_turn();
        }
    }

    /// Position of racer `idx`.
    pub fn position(&self, idx: usize) -> usize {
        self.engine.state().racers[idx].position
    }

    /// Tripped flag of racer `idx`.
    pub fn tripped(&self, idx: usize) -> bool {
        self.engine.state().racers[idx].tripped
    }
}

/// Fans telemetry out to several sinks.
struct FanoutSink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl TelemetrySink for FanoutSink {
    fn on_event(&self, event: &derby_core::Event, state: &GameState, turn_index: u32) {
        for s in &self.sinks {
            s.on_event(event, state, turn_index);
        }
    }

    fn on_event_skipped(&self, event: &derby_core::Event, reason: &SkipReason, turn_index: u32) {
        for s in &self.sinks {
            s.on_event_skipped(event, reason, turn_index);
        }
    }

    fn on_turn_end(&self, state: &GameState, turn_index: u32) {
        for s in &self.sinks {
            s.on_turn_end(state, turn_index);
        }
    }

    fn on_race_end(&self, state: &GameState) {
        for s in &self.sinks {
            s.on_race_end(state);
        }
    }
}
