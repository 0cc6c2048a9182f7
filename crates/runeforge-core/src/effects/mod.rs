//! Built-in effects.
//!
//! - [`Spread`] (57): bows fire a fan of extra arrows
//! - [`Weight`] (67): boots that trade speed for strength and knockback resistance
//! - [`Spectral`] (54): shovels convert clicked blocks through the spectral table
//! - [`Transformation`] (64): swords may turn a struck entity into another kind
//!
//! [`StaticEffect`] wraps a bare descriptor with no behaviour, for hosts that
//! only need an entry in the registry.

use std::sync::Arc;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::effect::{Effect, EffectBuilder, EffectDescriptor};

mod spectral;
mod spread;
mod transformation;
mod weight;

pub use spectral::Spectral;
pub use spread::{Spread, EXTRA_ARROW_LIFETIME_TICKS, SPREAD_ARROW_TAG};
pub use transformation::Transformation;
pub use weight::{Weight, WEIGHT_ACTIVE_KEY};

/// Every built-in effect, ready for [`RegistryBuilder::register_all`](crate::effect::RegistryBuilder::register_all).
#[must_use]
pub fn builtin() -> Vec<Arc<dyn Effect>> {
    vec![
        Arc::new(Spread),
        Arc::new(Weight),
        Arc::new(Spectral),
        Arc::new(Transformation),
    ]
}

/// An effect with a fixed descriptor and no hooks.
#[derive(Debug, Clone)]
pub struct StaticEffect {
    descriptor: EffectDescriptor,
}

impl StaticEffect {
    /// Wraps a descriptor.
    #[must_use]
    pub fn new(descriptor: EffectDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Effect for StaticEffect {
    fn defaults(&self) -> EffectBuilder {
        self.descriptor.to_builder()
    }
}

/// Standard normal sample.
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(StandardNormal)
}
