//! Decision functions
//!
//! A decision function maps a three-value observation to an action scalar;
//! the simulation requests a jump when the action exceeds
//! [`JUMP_THRESHOLD`](crate::consts::JUMP_THRESHOLD). The simulation never
//! looks inside one beyond this contract.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DecisionError;

/// What an agent senses each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Agent vertical position
    pub y: f32,
    /// Distance to the sensed obstacle's gap center
    pub to_gap_top: f32,
    /// Distance to the sensed obstacle's lower barrier
    pub to_gap_bottom: f32,
}

impl Observation {
    #[inline]
    pub fn as_array(&self) -> [f32; 3] {
        [self.y, self.to_gap_top, self.to_gap_bottom]
    }
}

/// Shared interface implemented by all agent controllers.
pub trait DecisionFunction {
    /// Action scalar for this observation. Must not depend on simulation state
    /// beyond the observation.
    fn evaluate(&self, observation: &Observation) -> Result<f32, DecisionError>;

    /// Construction-time sanity check; a failure rejects the whole session.
    fn validate(&self) -> Result<(), DecisionError> {
        Ok(())
    }

    /// Opaque serialized state for persistence.
    fn export_state(&self) -> Vec<u8>;
}

impl<T: DecisionFunction + ?Sized> DecisionFunction for Box<T> {
    fn evaluate(&self, observation: &Observation) -> Result<f32, DecisionError> {
        (**self).evaluate(observation)
    }

    fn validate(&self) -> Result<(), DecisionError> {
        (**self).validate()
    }

    fn export_state(&self) -> Vec<u8> {
        (**self).export_state()
    }
}

/// Always returns the same action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantBrain(pub f32);

impl ConstantBrain {
    /// Never jumps
    pub const IDLE: Self = Self(0.0);
    /// Jumps every tick
    pub const FLAP: Self = Self(1.0);
}

impl DecisionFunction for ConstantBrain {
    fn evaluate(&self, _observation: &Observation) -> Result<f32, DecisionError> {
        Ok(self.0)
    }

    fn validate(&self) -> Result<(), DecisionError> {
        if self.0.is_finite() {
            Ok(())
        } else {
            Err(DecisionError::Malformed(format!("constant output {}", self.0)))
        }
    }

    fn export_state(&self) -> Vec<u8> {
        self.0.to_le_bytes().to_vec()
    }
}

/// Single tanh neuron over the raw observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perceptron {
    pub weights: [f32; 3],
    pub bias: f32,
}

impl Perceptron {
    pub fn new(weights: [f32; 3], bias: f32) -> Self {
        Self { weights, bias }
    }

    /// Weights and bias uniform in [-1, 1)
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            weights: [
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            ],
            bias: rng.random_range(-1.0..1.0),
        }
    }

    /// Copy with every parameter nudged by up to `scale`
    pub fn perturbed<R: Rng>(&self, rng: &mut R, scale: f32) -> Self {
        let mut next = self.clone();
        for w in &mut next.weights {
            *w += rng.random_range(-scale..scale);
        }
        next.bias += rng.random_range(-scale..scale);
        next
    }

    /// Rebuild from [`DecisionFunction::export_state`] output
    pub fn from_state(bytes: &[u8]) -> Result<Self, DecisionError> {
        let perceptron: Self = serde_json::from_slice(bytes)
            .map_err(|e| DecisionError::Malformed(format!("perceptron state: {e}")))?;
        perceptron.validate()?;
        Ok(perceptron)
    }
}

impl DecisionFunction for Perceptron {
    fn evaluate(&self, observation: &Observation) -> Result<f32, DecisionError> {
        let sum: f32 = self
            .weights
            .iter()
            .zip(observation.as_array())
            .map(|(w, x)| w * x)
            .sum();
        Ok((sum + self.bias).tanh())
    }

    fn validate(&self) -> Result<(), DecisionError> {
        if self.weights.iter().all(|w| w.is_finite()) && self.bias.is_finite() {
            Ok(())
        } else {
            Err(DecisionError::Malformed("non-finite perceptron parameter".into()))
        }
    }

    fn export_state(&self) -> Vec<u8> {
        // Plain struct of floats; serialization cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn obs() -> Observation {
        Observation {
            y: 350.0,
            to_gap_top: 50.0,
            to_gap_bottom: 150.0,
        }
    }

    #[test]
    fn test_constant_brain() {
        assert_eq!(ConstantBrain::FLAP.evaluate(&obs()), Ok(1.0));
        assert!(ConstantBrain(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_perceptron_output_bounded() {
        let p = Perceptron::new([1.0, -2.0, 0.5], 0.1);
        let out = p.evaluate(&obs()).unwrap();
        assert!((-1.0..=1.0).contains(&out));
    }

    #[test]
    fn test_perceptron_state_restores() {
        let mut rng = Pcg32::seed_from_u64(3);
        let p = Perceptron::random(&mut rng);
        let restored = Perceptron::from_state(&p.export_state()).unwrap();
        assert_eq!(p, restored);
        assert!(Perceptron::from_state(b"not json").is_err());
    }

    #[test]
    fn test_perturbed_stays_close() {
        let mut rng = Pcg32::seed_from_u64(9);
        let p = Perceptron::new([0.0; 3], 0.0);
        let q = p.perturbed(&mut rng, 0.25);
        assert!(q.weights.iter().all(|w| w.abs() < 0.25));
        assert!(q.bias.abs() < 0.25);
    }

    #[test]
    fn test_boxed_dyn_delegates() {
        let boxed: Box<dyn DecisionFunction> = Box::new(ConstantBrain(0.7));
        assert_eq!(boxed.evaluate(&obs()), Ok(0.7));
        assert_eq!(boxed.export_state(), 0.7f32.to_le_bytes().to_vec());
    }
}
