//! Optimizer contract
//!
//! The optimizer proposes a population each generation and receives the
//! fitness of every member afterwards. Its learning algorithm is its own
//! business; the simulation only calls these two operations.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::brain::{ConstantBrain, DecisionFunction, Perceptron};

/// Position of a candidate in the population proposed for a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub usize);

pub trait Optimizer {
    type Candidate: DecisionFunction;

    /// Ordered population for `generation`; ids are positions in this vector.
    fn propose_population(&mut self, generation: u32) -> Vec<Self::Candidate>;

    /// Final fitness of every member proposed for `generation`, ordered by id.
    fn report_fitness(&mut self, generation: u32, scores: &[(CandidateId, f32)]);
}

/// Constant-output population; records every report it receives
#[derive(Debug, Clone)]
pub struct StubOptimizer {
    pub population_size: usize,
    pub output: f32,
    pub reports: Vec<(u32, Vec<(CandidateId, f32)>)>,
}

impl StubOptimizer {
    pub fn new(population_size: usize, output: f32) -> Self {
        Self {
            population_size,
            output,
            reports: Vec::new(),
        }
    }
}

impl Optimizer for StubOptimizer {
    type Candidate = ConstantBrain;

    fn propose_population(&mut self, _generation: u32) -> Vec<ConstantBrain> {
        vec![ConstantBrain(self.output); self.population_size]
    }

    fn report_fitness(&mut self, generation: u32, scores: &[(CandidateId, f32)]) {
        self.reports.push((generation, scores.to_vec()));
    }
}

/// Baseline search: keeps the best perceptron seen so far and proposes it
/// alongside perturbed copies.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    pub population_size: usize,
    /// Maximum per-parameter perturbation
    pub scale: f32,
    rng: Pcg32,
    proposed: Vec<Perceptron>,
    best: Option<(Perceptron, f32)>,
}

impl RandomSearch {
    pub fn new(population_size: usize, scale: f32, seed: u64) -> Self {
        Self {
            population_size,
            scale,
            rng: Pcg32::seed_from_u64(seed),
            proposed: Vec::new(),
            best: None,
        }
    }

    /// Best candidate and its fitness so far
    pub fn best(&self) -> Option<&(Perceptron, f32)> {
        self.best.as_ref()
    }
}

impl Optimizer for RandomSearch {
    type Candidate = Perceptron;

    fn propose_population(&mut self, _generation: u32) -> Vec<Perceptron> {
        let population: Vec<Perceptron> = match &self.best {
            None => (0..self.population_size)
                .map(|_| Perceptron::random(&mut self.rng))
                .collect(),
            Some((elite, _)) => {
                let elite = elite.clone();
                let mut next = Vec::with_capacity(self.population_size);
                next.push(elite.clone());
                while next.len() < self.population_size {
                    next.push(elite.perturbed(&mut self.rng, self.scale));
                }
                next.truncate(self.population_size);
                next
            }
        };
        self.proposed = population.clone();
        population
    }

    fn report_fitness(&mut self, generation: u32, scores: &[(CandidateId, f32)]) {
        let Some(&(id, fitness)) = scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            return;
        };
        let Some(candidate) = self.proposed.get(id.0) else {
            log::warn!("Generation {generation}: fitness reported for unknown candidate {}", id.0);
            return;
        };
        let improved = self.best.as_ref().is_none_or(|(_, best)| fitness > *best);
        if improved {
            log::debug!("Generation {generation}: new best fitness {fitness:.1}");
            self.best = Some((candidate.clone(), fitness));
        }
    }
}
