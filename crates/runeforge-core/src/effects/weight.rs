//! Weight: heavy boots that slow the wearer, make them stronger and absorb
//! knockback.

use tracing::{debug, warn};

use crate::dispatch::{EntityDamage, HookContext, Scan};
use crate::effect::{Effect, EffectBuilder, EffectDescriptor, EffectId, HandRequirement, HookOutcome, HookResult};
use crate::error::HookError;
use crate::host::{damage_item_in_slot, StatusEffect, StatusKind, StoreKey};
use crate::item::{CategorySet, EquipmentSlot};

/// Store key marking that the wearer's slowness was applied by Weight.
pub const WEIGHT_ACTIVE_KEY: &str = "weight_active";

/// Boots effect.
///
/// - Being hit by a living attacker for less than the wearer's health
///   replaces the hit with direct damage and a dampened push away from the
///   attacker, and wears every worn item that carries Weight by `level`.
/// - While scanned, keeps slowness and strength applied at amplifier
///   `level * power`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weight;

impl Weight {
    /// Registry id.
    pub const ID: EffectId = EffectId::new(67);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn amplifier(ctx: &HookContext<'_>) -> u8 {
        ctx.scaled_level().clamp(0.0, f64::from(u8::MAX)) as u8
    }
}

impl Effect for Weight {
    fn defaults(&self) -> EffectBuilder {
        EffectDescriptor::builder(Self::ID)
            .name("Weight")
            .description("Slows the wearer down but makes them stronger and more resistant to knockback")
            .applicable(CategorySet::BOOTS)
            .hand(HandRequirement::None)
            .max_level(4)
            .power(1.0)
    }

    fn on_being_hit(&self, ctx: &mut HookContext<'_>, event: &mut EntityDamage) -> HookResult {
        let (victim, damager) = (ctx.actor, event.damager);
        if !ctx.world.is_actor(victim)
            || !ctx.world.is_living(damager)
            || !ctx.world.call_damage_event(victim, damager, 0.0)
        {
            return Ok(HookOutcome::Skipped);
        }

        let health = ctx.world.health(victim).ok_or(HookError::MissingEntity(victim))?;
        if event.damage >= health {
            return Ok(HookOutcome::Skipped);
        }

        event.cancel();
        ctx.world.damage(victim, event.damage);

        let here = ctx.world.location(victim).ok_or(HookError::MissingEntity(victim))?;
        let there = ctx.world.location(damager).ok_or(HookError::MissingEntity(damager))?;
        let push = (here - there) * (1.0 / (ctx.scaled_level() + 1.5));
        ctx.world.set_velocity(victim, push);

        let wear = u32::from(ctx.level);
        for slot in EquipmentSlot::ARMOR {
            let weighted = ctx
                .world
                .equipment(victim, slot)
                .is_some_and(|item| item.level_of(Self::ID).is_some());
            if weighted && damage_item_in_slot(&mut *ctx.world, victim, slot, wear, &mut *ctx.rng) {
                debug!(actor = %victim, slot = %slot, "Weighted armour broke");
            }
        }
        Ok(HookOutcome::Applied)
    }

    fn on_scan(&self, ctx: &mut HookContext<'_>, _event: &Scan) -> HookResult {
        if ctx.world.has_status(ctx.actor, StatusKind::Slowness) {
            return Ok(HookOutcome::Skipped);
        }

        let amplifier = Self::amplifier(ctx);
        for kind in [StatusKind::Slowness, StatusKind::Strength] {
            ctx.world.add_status(
                ctx.actor,
                StatusEffect {
                    kind,
                    duration_ticks: u32::MAX,
                    amplifier,
                },
            );
        }

        let actor = ctx.actor;
        if let Err(err) = ctx.store().set(actor, &StoreKey::named(WEIGHT_ACTIVE_KEY), 1) {
            warn!(actor = %actor, error = %err, "Could not record weight marker");
        }
        Ok(HookOutcome::Applied)
    }
}
