//! Spread: a bow fires a fan of extra arrows alongside the original.

use glam::DVec3;
use tracing::debug;

use super::gaussian;
use crate::capability::ShootEventArgs;
use crate::dispatch::{HookContext, ProjectileLaunch};
use crate::effect::{Effect, EffectBuilder, EffectDescriptor, EffectId, HandRequirement, HookOutcome, HookResult};
use crate::error::HookError;
use crate::host::World;
use crate::item::CategorySet;

/// Tag on every arrow fired by Spread, including the original.
pub const SPREAD_ARROW_TAG: &str = "runeforge:spread";

/// Ticks after which the extra arrows are removed from the world.
pub const EXTRA_ARROW_LIFETIME_TICKS: u64 = 1200;

/// Largest sideways jitter added to an extra arrow's velocity.
const MAX_JITTER: f64 = 0.75;

/// Fires `round(power * level * 4)` additional arrows per shot.
///
/// Each extra arrow is published as a shoot event; the first one a listener
/// cancels is removed and ends the volley. The original arrow is never
/// touched by a cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spread;

impl Spread {
    /// Registry id.
    pub const ID: EffectId = EffectId::new(57);

    /// Number of extra arrows for a level and power.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn extra_arrows(level: u8, power: f64) -> usize {
        (power * f64::from(level) * 4.0).round().max(0.0) as usize
    }
}

impl Effect for Spread {
    fn defaults(&self) -> EffectBuilder {
        EffectDescriptor::builder(Self::ID)
            .name("Spread")
            .description("Fires an array of arrows simultaneously")
            .applicable(CategorySet::BOW)
            .hand(HandRequirement::Right)
            .max_level(5)
            .power(1.0)
    }

    fn on_projectile_launch(&self, ctx: &mut HookContext<'_>, event: &mut ProjectileLaunch) -> HookResult {
        let shooter = ctx.actor;
        let original = ctx
            .world
            .projectile_mut(event.projectile)
            .ok_or(HookError::MissingEntity(event.projectile))?;
        original.tags.push(SPREAD_ARROW_TAG.to_string());
        let original = original.clone();
        let speed = original.velocity.length();
        let bow = ctx.item().cloned();

        #[allow(clippy::cast_possible_truncation)]
        let mut shot = ctx.capabilities.construct_shoot_event(ShootEventArgs {
            shooter,
            bow: bow.clone(),
            consumable: None,
            projectile: event.projectile,
            hand: event.hand,
            force: speed as f32,
            consume_item: false,
        });
        ctx.world.call_shoot_event(&mut shot);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let wear = (f64::from(ctx.level) / 2.0 + 1.0).round() as u32;
        ctx.damage_tool(wear);

        let eye = ctx.world.eye_location(shooter).ok_or(HookError::MissingEntity(shooter))?;
        let facing = ctx.world.facing(shooter).ok_or(HookError::MissingEntity(shooter))?;
        let origin = eye + facing;

        let mut extra = Vec::new();
        let mut completed = true;
        for _ in 0..Self::extra_arrows(ctx.level, ctx.power()) {
            let jitter_x = (gaussian(&mut *ctx.rng) / 8.0).clamp(-MAX_JITTER, MAX_JITTER);
            let jitter_z = (gaussian(&mut *ctx.rng) / 8.0).clamp(-MAX_JITTER, MAX_JITTER);
            let direction = original.velocity + DVec3::new(jitter_x, 0.0, jitter_z);
            let velocity = direction.normalize_or_zero() * speed;

            let arrow = ctx.world.spawn_arrow(shooter, origin, velocity);
            if let Some(p) = ctx.world.projectile_mut(arrow) {
                p.fire_ticks = original.fire_ticks;
                p.knockback = original.knockback;
            }

            #[allow(clippy::cast_possible_truncation)]
            let mut shot = ctx.capabilities.construct_shoot_event(ShootEventArgs {
                shooter,
                bow: bow.clone(),
                consumable: None,
                projectile: arrow,
                hand: event.hand,
                force: velocity.length() as f32,
                consume_item: false,
            });
            ctx.world.call_shoot_event(&mut shot);
            if shot.is_cancelled() {
                ctx.world.remove_entity(arrow);
                completed = false;
                break;
            }

            if let Some(p) = ctx.world.projectile_mut(arrow) {
                p.tags.push(SPREAD_ARROW_TAG.to_string());
                p.critical = original.critical;
            }
            extra.push(arrow);
        }

        debug!(actor = %shooter, arrows = extra.len(), completed, "Spread volley fired");
        if !extra.is_empty() {
            ctx.run_later(
                EXTRA_ARROW_LIFETIME_TICKS,
                Box::new(move |world: &mut dyn World| {
                    for arrow in extra {
                        world.remove_entity(arrow);
                    }
                }),
            );
        }
        Ok(HookOutcome::from(completed))
    }
}
