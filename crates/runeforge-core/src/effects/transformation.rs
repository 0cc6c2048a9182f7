//! Transformation: a sword that may turn a struck creature into another kind.

use rand::Rng;
use tracing::debug;

use crate::dispatch::{EntityDamage, HookContext};
use crate::effect::{Effect, EffectBuilder, EffectDescriptor, EffectId, HandRequirement, HookOutcome, HookResult};
use crate::error::HookError;
use crate::item::CategorySet;

/// Percent chance of transforming per scaled level.
const CHANCE_PER_LEVEL: f64 = 8.0;

/// On hit, with probability `8% * level * power`, replaces a living victim
/// with the kind the transformation table maps it to. The hit itself is
/// cancelled. Fatal hits are left alone. A custom name carries over to the
/// new entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformation;

impl Transformation {
    /// Registry id.
    pub const ID: EffectId = EffectId::new(64);
}

impl Effect for Transformation {
    fn defaults(&self) -> EffectBuilder {
        EffectDescriptor::builder(Self::ID)
            .name("Transformation")
            .description("Changes the type of entity when killed")
            .applicable(CategorySet::SWORD)
            .hand(HandRequirement::Right)
            .max_level(3)
            .power(1.0)
    }

    fn on_entity_hit(&self, ctx: &mut HookContext<'_>, event: &mut EntityDamage) -> HookResult {
        let victim = event.victim;
        if !ctx.world.is_living(victim) || !ctx.world.call_damage_event(ctx.actor, victim, 0.0) {
            return Ok(HookOutcome::Skipped);
        }
        let Some(kind) = ctx.world.entity_kind(victim) else {
            return Ok(HookOutcome::Skipped);
        };
        let Some(target) = ctx.tables.transformation().get(&kind).cloned() else {
            return Ok(HookOutcome::Skipped);
        };
        let health = ctx.world.health(victim).ok_or(HookError::MissingEntity(victim))?;
        if event.damage >= health {
            return Ok(HookOutcome::Skipped);
        }
        if f64::from(ctx.rng.gen_range(0_u32..100)) >= ctx.scaled_level() * CHANCE_PER_LEVEL {
            return Ok(HookOutcome::Skipped);
        }

        let at = ctx.world.location(victim).ok_or(HookError::MissingEntity(victim))?;
        let name = ctx.world.custom_name(victim);
        let spawned = ctx.world.spawn_entity(&target, at);
        if name.is_some() {
            ctx.world.set_custom_name(spawned, name);
        }
        ctx.world.remove_entity(victim);
        event.cancel();
        debug!(actor = %ctx.actor, %victim, %spawned, from = %kind, to = %target, "Entity transformed");
        Ok(HookOutcome::Applied)
    }
}
