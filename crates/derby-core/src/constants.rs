// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical constants used across the engine.

/// Victory points awarded to the first racer across the finish tile.
pub const WIN_VP: u32 = 5;

/// Default number of finishers that ends the race.
///
/// The standard rules stop the race when the second racer finishes; later
/// places are never assigned. Override via
/// [`GameRules::finishers_to_end`](crate::GameRules).
pub const DEFAULT_FINISHERS_TO_END: u32 = 2;

/// Hard cap on approach-hook iterations during a single position resolution.
///
/// Approach hooks run to a fixed point; the cap (together with the
/// visited-tile guard) bounds resolution even under adversarial blocker
/// layouts. The value is far above anything a legal board can produce.
pub const MAX_APPROACH_ITERATIONS: usize = 16;
