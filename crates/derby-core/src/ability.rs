// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ability registry and subscription bookkeeping.
//!
//! Abilities are a closed set; the registry is a compile-time table mapping
//! each [`AbilityName`] to its descriptor (trigger set, behavior, installed
//! racer modifier, attach/detach hooks). Racer construction and Copycat's
//! re-aliasing both go through the same attach/detach protocol, which keeps
//! the invariant: a racer's subscriptions are exactly those implied by its
//! current ability set.

use std::collections::BTreeSet;

use crate::abilities;
use crate::engine_impl::Engine;
use crate::event::{Event, EventTag};
use crate::ident::{AbilityName, RacerName};
use crate::state::RacerModifierKind;

/// Behavior entry point for a subscribed ability.
pub(crate) type ExecuteFn = fn(&mut Engine, &Event, usize);

/// Lifecycle hook run when an ability attaches to or detaches from a racer.
pub(crate) type LifecycleFn = fn(&mut Engine, usize);

/// Registry entry for one ability.
pub struct AbilityDescriptor {
    /// The ability this entry describes.
    pub name: AbilityName,
    /// Event kinds the ability subscribes to on attach.
    pub triggers: &'static [EventTag],
    pub(crate) execute: Option<ExecuteFn>,
    pub(crate) installs: Option<RacerModifierKind>,
    pub(crate) on_attach: Option<LifecycleFn>,
    pub(crate) on_detach: Option<LifecycleFn>,
}

impl AbilityDescriptor {
    const fn subscriber(
        name: AbilityName,
        triggers: &'static [EventTag],
        execute: ExecuteFn,
    ) -> Self {
        AbilityDescriptor {
            name,
            triggers,
            execute: Some(execute),
            installs: None,
            on_attach: None,
            on_detach: None,
        }
    }

    const fn roll_modifier(name: AbilityName, installs: RacerModifierKind) -> Self {
        AbilityDescriptor {
            name,
            triggers: &[],
            execute: None,
            installs: Some(installs),
            on_attach: None,
            on_detach: None,
        }
    }
}

static DESCRIPTORS: [AbilityDescriptor; 12] = [
    AbilityDescriptor::subscriber(
        AbilityName::BabaYagaTrip,
        &[EventTag::Passing],
        abilities::baba_yaga_trip,
    ),
    AbilityDescriptor::subscriber(
        AbilityName::BananaTrip,
        &[EventTag::Passing],
        abilities::banana_trip,
    ),
    AbilityDescriptor::subscriber(
        AbilityName::CentaurTrample,
        &[EventTag::Passing],
        abilities::centaur_trample,
    ),
    AbilityDescriptor::subscriber(
        AbilityName::CopyLead,
        &[EventTag::TurnStart],
        abilities::copy_lead,
    ),
    AbilityDescriptor::subscriber(
        AbilityName::FlipFlopSwap,
        &[EventTag::TurnStart],
        abilities::flip_flop_swap,
    ),
    AbilityDescriptor::roll_modifier(AbilityName::GunkSlime, RacerModifierKind::GunkSlime),
    AbilityDescriptor {
        name: AbilityName::HugeBabyPush,
        triggers: &[EventTag::PostMove, EventTag::PostWarp],
        execute: Some(abilities::huge_baby_push),
        installs: None,
        on_attach: Some(abilities::huge_baby_attach),
        on_detach: Some(abilities::huge_baby_detach),
    },
    AbilityDescriptor::roll_modifier(AbilityName::MagicalReroll, RacerModifierKind::RerollCharm),
    AbilityDescriptor::roll_modifier(AbilityName::PartyBoost, RacerModifierKind::PartySelfBoost),
    AbilityDescriptor::subscriber(
        AbilityName::PartyPull,
        &[EventTag::TurnStart],
        abilities::party_pull,
    ),
    AbilityDescriptor::subscriber(
        AbilityName::RomanticMove,
        &[EventTag::PostMove],
        abilities::romantic_move,
    ),
    AbilityDescriptor::subscriber(
        AbilityName::ScoochStep,
        &[EventTag::AbilityTriggered],
        abilities::scooch_step,
    ),
];

/// Looks up the registry entry for `name`.
#[must_use]
pub(crate) fn descriptor(name: AbilityName) -> &'static AbilityDescriptor {
    // The table is total over the enum; a miss is unreachable by
    // construction, and the fallback keeps this panic-free.
    DESCRIPTORS
        .iter()
        .find(|d| d.name == name)
        .unwrap_or(&DESCRIPTORS[0])
}

/// The default ability set for a racer identity.
#[must_use]
pub fn default_abilities(racer: RacerName) -> &'static [AbilityName] {
    match racer {
        RacerName::BabaYaga => &[AbilityName::BabaYagaTrip],
        RacerName::Banana => &[AbilityName::BananaTrip],
        RacerName::Centaur => &[AbilityName::CentaurTrample],
        RacerName::Copycat => &[AbilityName::CopyLead],
        RacerName::FlipFlop => &[AbilityName::FlipFlopSwap],
        RacerName::Gunk => &[AbilityName::GunkSlime],
        RacerName::HugeBaby => &[AbilityName::HugeBabyPush],
        RacerName::Magician => &[AbilityName::MagicalReroll],
        RacerName::PartyAnimal => &[AbilityName::PartyPull, AbilityName::PartyBoost],
        RacerName::Romantic => &[AbilityName::RomanticMove],
        RacerName::Scoocher => &[AbilityName::ScoochStep],
    }
}

/// One row in a subscription slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Subscription {
    pub ability: AbilityName,
    pub owner_idx: usize,
}

/// Fixed-size subscription table, one slot per event kind.
#[derive(Debug)]
pub(crate) struct SubscriptionTable {
    slots: [Vec<Subscription>; EventTag::COUNT],
}

impl SubscriptionTable {
    pub(crate) fn new() -> Self {
        SubscriptionTable {
            slots: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Appends a subscription to the slot for `tag`.
    pub(crate) fn subscribe(&mut self, tag: EventTag, ability: AbilityName, owner_idx: usize) {
        self.slots[tag.index()].push(Subscription { ability, owner_idx });
    }

    /// Removes every subscription owned by `racer_idx`.
    pub(crate) fn unsubscribe_all(&mut self, racer_idx: usize) {
        for slot in &mut self.slots {
            slot.retain(|s| s.owner_idx != racer_idx);
        }
    }

    /// Subscriptions registered for `tag`, in insertion order.
    pub(crate) fn subscribers_for(&self, tag: EventTag) -> &[Subscription] {
        &self.slots[tag.index()]
    }

    /// The ability set implied by `racer_idx`'s subscriptions plus the
    /// non-subscribing (roll-modifier) abilities cannot be derived from the
    /// table alone; this returns the subscribed portion, which the coherence
    /// check compares against the racer's subscribing abilities.
    pub(crate) fn subscribed_abilities_of(&self, racer_idx: usize) -> BTreeSet<AbilityName> {
        let mut out = BTreeSet::new();
        for slot in &self.slots {
            for s in slot {
                if s.owner_idx == racer_idx {
                    out.insert(s.ability);
                }
            }
        }
        out
    }
}
