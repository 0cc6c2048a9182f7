//! Spectral: a shovel that cycles clicked blocks through the spectral table.

use tracing::trace;

use crate::dispatch::{BlockInteract, HookContext, InteractAction};
use crate::effect::{Effect, EffectBuilder, EffectDescriptor, EffectId, HandRequirement, HookOutcome, HookResult};
use crate::item::CategorySet;

/// Right-clicking a block with a Spectral shovel replaces it with its
/// spectral counterpart, if the table has one and the actor may build there.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spectral;

impl Spectral {
    /// Registry id.
    pub const ID: EffectId = EffectId::new(54);
}

impl Effect for Spectral {
    fn defaults(&self) -> EffectBuilder {
        EffectDescriptor::builder(Self::ID)
            .name("Spectral")
            .description("Allows for cycling through a block's types")
            .applicable(CategorySet::SHOVEL)
            .hand(HandRequirement::Right)
            .max_level(1)
            .power(1.0)
            .cooldown_ms(250)
    }

    fn on_block_interact(&self, ctx: &mut HookContext<'_>, event: &mut BlockInteract) -> HookResult {
        let (InteractAction::RightClickBlock, Some(cell)) = (event.action, event.cell) else {
            return Ok(HookOutcome::Skipped);
        };
        let Some(current) = ctx.world.block(cell) else {
            return Ok(HookOutcome::Skipped);
        };
        let Some(next) = ctx.tables.spectral().get(&current).cloned() else {
            return Ok(HookOutcome::Skipped);
        };
        if !ctx.capabilities.query_build_permission(ctx.actor, cell) {
            trace!(actor = %ctx.actor, ?cell, "Spectral denied by permission provider");
            return Ok(HookOutcome::Skipped);
        }

        ctx.world.set_block(cell, next);
        ctx.damage_tool(1);
        ctx.apply_cooldown();
        Ok(HookOutcome::Applied)
    }
}
