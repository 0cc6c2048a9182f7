//! Dispatch engine behaviour with scripted test effects.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cooldown::{CooldownState, CooldownStore};
use crate::dispatch::{
    BlockInteract, Disposition, EntityCombust, HookContext, InteractAction, Rejection, Scan,
    WorldEvent,
};
use crate::effect::{
    Effect, EffectBuilder, EffectDescriptor, EffectId, HandRequirement, HookOutcome, HookResult,
};
use crate::error::HookError;
use crate::host::World;
use crate::item::{CategorySet, EquipmentSlot, Hand, Material};

use super::helpers::{item, Harness, PIG, PLAYER};

// =============================================================================
// Test Effects
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Outcome(HookOutcome),
    Fail,
    Panic,
    ClearSlot,
    /// Replaces the item in the slot with a bare one of this material.
    SwapTo(&'static str),
}

/// Effect that counts its calls and then does what it is told. Applies to
/// swords unless built with [`Scripted::on`].
struct Scripted {
    id: EffectId,
    applicable: CategorySet,
    hand: HandRequirement,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(id: u32, hand: HandRequirement, behaviour: Behaviour) -> (Arc<Self>, Arc<AtomicUsize>) {
        Self::on(CategorySet::SWORD, id, hand, behaviour)
    }

    fn on(
        applicable: CategorySet,
        id: u32,
        hand: HandRequirement,
        behaviour: Behaviour,
    ) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let scripted = Arc::new(Self {
            id: EffectId::new(id),
            applicable,
            hand,
            behaviour,
            calls: Arc::clone(&calls),
        });
        (scripted, calls)
    }

    fn react(&self, ctx: &mut HookContext<'_>) -> HookResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Outcome(outcome) => Ok(outcome),
            Behaviour::Fail => Err(HookError::Other("scripted failure".to_string())),
            Behaviour::Panic => panic!("scripted panic"),
            Behaviour::ClearSlot => {
                ctx.world.set_equipment(ctx.actor, ctx.slot, None);
                Ok(HookOutcome::Applied)
            }
            Behaviour::SwapTo(material) => {
                ctx.world.set_equipment(ctx.actor, ctx.slot, Some(item(material)));
                Ok(HookOutcome::Applied)
            }
        }
    }
}

impl Effect for Scripted {
    fn defaults(&self) -> EffectBuilder {
        EffectDescriptor::builder(self.id)
            .name(format!("scripted-{}", self.id.as_u32()))
            .applicable(self.applicable)
            .hand(self.hand)
            .max_level(3)
    }

    fn on_block_interact(&self, ctx: &mut HookContext<'_>, _event: &mut BlockInteract) -> HookResult {
        self.react(ctx)
    }

    fn on_scan(&self, ctx: &mut HookContext<'_>, _event: &Scan) -> HookResult {
        self.react(ctx)
    }

    fn on_combust(&self, ctx: &mut HookContext<'_>, _event: &mut EntityCombust) -> HookResult {
        self.react(ctx)
    }
}

fn click(hand: Hand) -> WorldEvent {
    WorldEvent::from(BlockInteract::new(PLAYER, None, hand, InteractAction::RightClickAir))
}

fn sword_with(effects: &[(u32, u8)]) -> crate::item::ItemStack {
    let mut sword = item("DIAMOND_SWORD");
    for &(id, level) in effects {
        sword.push_effect(EffectId::new(id), level);
    }
    sword
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn level_zero_and_unknown_ids_are_never_invoked() {
    let (scripted, calls) = Scripted::new(900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 0), (12_345, 2)]));

    let report = h.dispatch(&mut click(Hand::Main));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let dispositions: Vec<_> = report.records.iter().map(|r| r.disposition).collect();
    assert_eq!(
        dispositions,
        vec![
            Disposition::Rejected(Rejection::LevelZero),
            Disposition::Rejected(Rejection::UnknownEffect),
        ]
    );
}

#[test]
fn wrong_equipment_is_rejected() {
    let (scripted, calls) = Scripted::new(900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    let mut stick = item("STICK");
    stick.push_effect(EffectId::new(900), 1);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, stick);

    let report = h.dispatch(&mut click(Hand::Main));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.records[0].disposition, Disposition::Rejected(Rejection::WrongEquipment));
}

#[test]
fn any_tool_effects_match_materials_listed_under_all() {
    let (scripted, calls) = Scripted::on(CategorySet::ALL, 900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    let mut flint = item("FLINT_AND_STEEL");
    flint.push_effect(EffectId::new(900), 1);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, flint);

    let report = h.dispatch(&mut click(Hand::Main));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.records[0].disposition, Disposition::Applied);

    // A sword is not listed under `all`.
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1)]));
    let report = h.dispatch(&mut click(Hand::Main));
    assert_eq!(report.records[0].disposition, Disposition::Rejected(Rejection::WrongEquipment));
}

#[test]
fn non_actors_are_skipped() {
    let (scripted, calls) = Scripted::new(900, HandRequirement::None, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    h.world.equip(PIG, EquipmentSlot::MainHand, sword_with(&[(900, 1)]));

    let report = h.dispatch(&mut WorldEvent::from(Scan::new(PIG)));

    assert!(report.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn duplicate_attachments_dispatch_once() {
    let (scripted, calls) = Scripted::new(900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1), (900, 3)]));

    let report = h.dispatch(&mut click(Hand::Main));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.invocations(EffectId::new(900)), 1);
}

// =============================================================================
// Hands
// =============================================================================

#[test]
fn other_hand_only_serves_either_hand_effects() {
    let (right, right_calls) = Scripted::new(900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let (either, either_calls) = Scripted::new(901, HandRequirement::Either, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![right, either]);
    h.world.equip(PLAYER, EquipmentSlot::OffHand, sword_with(&[(900, 1), (901, 1)]));

    let report = h.dispatch(&mut click(Hand::Main));

    assert_eq!(right_calls.load(Ordering::SeqCst), 0);
    assert_eq!(either_calls.load(Ordering::SeqCst), 1);
    let right_record = report.for_effect(EffectId::new(900)).next().unwrap();
    assert_eq!(right_record.slot, EquipmentSlot::OffHand);
    assert_eq!(right_record.disposition, Disposition::Rejected(Rejection::WrongHand));
}

#[test]
fn left_hand_effects_fire_from_the_off_hand() {
    let (left, calls) = Scripted::new(900, HandRequirement::Left, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![left]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1)]));
    h.world.equip(PLAYER, EquipmentSlot::OffHand, sword_with(&[(900, 1)]));

    let report = h.dispatch(&mut click(Hand::Off));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let records: Vec<_> = report.for_effect(EffectId::new(900)).collect();
    assert_eq!(records[0].slot, EquipmentSlot::OffHand);
    assert_eq!(records[0].disposition, Disposition::Applied);
    assert_eq!(records[1].disposition, Disposition::Rejected(Rejection::WrongHand));
}

#[test]
fn armour_only_serves_hand_free_effects() {
    let (left, left_calls) = Scripted::on(CategorySet::BOOTS, 900, HandRequirement::Left, Behaviour::Outcome(HookOutcome::Applied));
    let (either, either_calls) = Scripted::on(CategorySet::BOOTS, 901, HandRequirement::Either, Behaviour::Outcome(HookOutcome::Applied));
    let (worn, worn_calls) = Scripted::on(CategorySet::BOOTS, 902, HandRequirement::None, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![left, either, worn]);
    let mut boots = item("IRON_BOOTS");
    for id in [900, 901, 902] {
        boots.push_effect(EffectId::new(id), 1);
    }
    h.world.equip(PLAYER, EquipmentSlot::Feet, boots);

    let report = h.dispatch(&mut WorldEvent::from(EntityCombust::new(PLAYER, None, 100)));

    assert_eq!(left_calls.load(Ordering::SeqCst), 0);
    assert_eq!(either_calls.load(Ordering::SeqCst), 0);
    assert_eq!(worn_calls.load(Ordering::SeqCst), 1);
    let dispositions: Vec<_> = report.records.iter().map(|r| (r.slot, r.disposition)).collect();
    assert_eq!(
        dispositions,
        vec![
            (EquipmentSlot::Feet, Disposition::Rejected(Rejection::WrongHand)),
            (EquipmentSlot::Feet, Disposition::Rejected(Rejection::WrongHand)),
            (EquipmentSlot::Feet, Disposition::Applied),
        ]
    );
}

// =============================================================================
// Cooldowns
// =============================================================================

#[test]
fn cooling_down_and_disabled_effects_are_rejected() {
    let (scripted, calls) = Scripted::new(900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1)]));
    let id = EffectId::new(900);

    CooldownStore::new(&mut h.store, &h.clock).set_cooldown(PLAYER, id, 500);
    let report = h.dispatch(&mut click(Hand::Main));
    assert_eq!(report.records[0].disposition, Disposition::Rejected(Rejection::CoolingDown));

    h.clock.advance(500);
    let report = h.dispatch(&mut click(Hand::Main));
    assert_eq!(report.records[0].disposition, Disposition::Applied);

    CooldownStore::new(&mut h.store, &h.clock).disable(PLAYER, id);
    let report = h.dispatch(&mut click(Hand::Main));
    assert_eq!(report.records[0].disposition, Disposition::Rejected(Rejection::Disabled));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn disable_all_then_enable_all_restores_dispatch() {
    let (scripted, calls) = Scripted::new(900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1)]));

    let report = CooldownStore::new(&mut h.store, &h.clock).disable_all(PLAYER, h.engine.registry());
    assert!(report.is_complete());
    assert_eq!(report.attempted, h.engine.registry().len());
    h.dispatch(&mut click(Hand::Main));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let report = CooldownStore::new(&mut h.store, &h.clock).enable_all(PLAYER, h.engine.registry());
    assert!(report.is_complete());
    let cooldowns = CooldownStore::new(&mut h.store, &h.clock);
    for descriptor in h.engine.registry().all() {
        assert_eq!(cooldowns.state(PLAYER, descriptor.id()), CooldownState::Ready);
    }
    h.dispatch(&mut click(Hand::Main));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn engine_never_applies_a_cooldown_itself() {
    let (scripted, _) = Scripted::new(900, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![scripted]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1)]));

    h.dispatch(&mut click(Hand::Main));

    let cooldowns = CooldownStore::new(&mut h.store, &h.clock);
    assert_eq!(cooldowns.cooldown_end_ms(PLAYER, EffectId::new(900)), 0);
}

// =============================================================================
// Cancellation and Failures
// =============================================================================

#[test]
fn cancel_stops_the_item_but_not_the_event() {
    let (cancel, cancel_calls) = Scripted::new(900, HandRequirement::Either, Behaviour::Outcome(HookOutcome::Cancel));
    let (after, after_calls) = Scripted::new(901, HandRequirement::Either, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![cancel, after]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1), (901, 1)]));
    h.world.equip(PLAYER, EquipmentSlot::OffHand, sword_with(&[(901, 1)]));

    let mut event = click(Hand::Main);
    let report = h.dispatch(&mut event);

    assert!(event.is_cancelled());
    assert_eq!(cancel_calls.load(Ordering::SeqCst), 1);
    // Only the off-hand copy ran.
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);
    let after_record = report.for_effect(EffectId::new(901)).next().unwrap();
    assert_eq!(after_record.slot, EquipmentSlot::OffHand);
}

#[test]
fn cancel_on_a_scan_is_recorded_without_a_flag() {
    let (cancel, _) = Scripted::new(900, HandRequirement::None, Behaviour::Outcome(HookOutcome::Cancel));
    let mut h = Harness::with_effects(vec![cancel]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1)]));

    let mut event = WorldEvent::from(Scan::new(PLAYER));
    let report = h.dispatch(&mut event);

    assert!(!event.is_cancelled());
    assert_eq!(report.records[0].disposition, Disposition::Cancelled);
}

#[test]
fn failing_and_panicking_hooks_are_contained() {
    let (fail, _) = Scripted::new(900, HandRequirement::Right, Behaviour::Fail);
    let (panic, _) = Scripted::new(901, HandRequirement::Right, Behaviour::Panic);
    let (after, after_calls) = Scripted::new(902, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![fail, panic, after]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1), (901, 1), (902, 1)]));

    let mut event = click(Hand::Main);
    let report = h.dispatch(&mut event);

    let dispositions: Vec<_> = report.records.iter().map(|r| r.disposition).collect();
    assert_eq!(
        dispositions,
        vec![Disposition::Failed, Disposition::Failed, Disposition::Applied]
    );
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);
    assert!(!event.is_cancelled());
}

#[test]
fn emptied_slot_ends_the_item() {
    let (clear, _) = Scripted::new(900, HandRequirement::Right, Behaviour::ClearSlot);
    let (after, after_calls) = Scripted::new(901, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![clear, after]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1), (901, 1)]));

    let report = h.dispatch(&mut click(Hand::Main));

    assert_eq!(report.records.len(), 1);
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn swapped_item_is_filtered_by_its_own_categories() {
    let (swap, _) = Scripted::new(900, HandRequirement::Right, Behaviour::SwapTo("STICK"));
    let (after, after_calls) = Scripted::new(901, HandRequirement::Right, Behaviour::Outcome(HookOutcome::Applied));
    let mut h = Harness::with_effects(vec![swap, after]);
    h.world.equip(PLAYER, EquipmentSlot::MainHand, sword_with(&[(900, 1), (901, 1)]));

    let report = h.dispatch(&mut click(Hand::Main));

    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    let after_record = report.for_effect(EffectId::new(901)).next().unwrap();
    assert_eq!(after_record.disposition, Disposition::Rejected(Rejection::WrongEquipment));
    let held = h.world.equipment(PLAYER, EquipmentSlot::MainHand).unwrap();
    assert_eq!(held.material, Material::new("STICK"));
}

#[test]
fn dispatch_is_deterministic_for_a_seed() {
    use crate::effects::Spread;
    use crate::dispatch::ProjectileLaunch;
    use glam::DVec3;

    let velocities = || {
        let mut h = Harness::new();
        let mut bow = item("BOW");
        bow.push_effect(Spread::ID, 2);
        h.world.equip(PLAYER, EquipmentSlot::MainHand, bow);
        let arrow = h.world.launch_arrow(PLAYER, DVec3::new(2.0, 0.5, 0.0));
        h.dispatch(&mut WorldEvent::from(ProjectileLaunch::new(PLAYER, arrow, Hand::Main)));

        let mut arrows: Vec<_> = h.world.arrows().into_iter().map(|(id, p)| (id, p.velocity)).collect();
        arrows.sort_by_key(|(id, _)| *id);
        arrows.into_iter().map(|(_, v)| v).collect::<Vec<_>>()
    };

    assert_eq!(velocities(), velocities());
}
