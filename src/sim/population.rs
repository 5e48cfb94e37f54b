//! Index-aligned population bookkeeping
//!
//! Agents, their decision functions and their fitness accumulators live in
//! three parallel vectors that always share length and order. Removal is
//! two-phase: entries are marked during a scan, then all three vectors are
//! compacted together in one pass. Removing mid-scan would shift a neighbour
//! into the vacated index and skip it.

use super::agent::Agent;
use crate::optimizer::CandidateId;

pub struct Population<'a, D: ?Sized> {
    agents: Vec<Agent>,
    brains: Vec<&'a D>,
    fitness: Vec<f32>,
    marked: Vec<bool>,
    /// Final fitness of members already removed
    settled: Vec<(CandidateId, f32)>,
}

impl<'a, D: ?Sized> Population<'a, D> {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            brains: Vec::new(),
            fitness: Vec::new(),
            marked: Vec::new(),
            settled: Vec::new(),
        }
    }

    /// Add a member with a zeroed fitness accumulator
    pub fn push(&mut self, agent: Agent, brain: &'a D) {
        self.agents.push(agent);
        self.brains.push(brain);
        self.fitness.push(0.0);
        self.marked.push(false);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[inline]
    pub fn agent(&self, index: usize) -> &Agent {
        &self.agents[index]
    }

    #[inline]
    pub fn agent_mut(&mut self, index: usize) -> &mut Agent {
        &mut self.agents[index]
    }

    #[inline]
    pub fn brain(&self, index: usize) -> &'a D {
        self.brains[index]
    }

    #[inline]
    pub fn fitness(&self) -> &[f32] {
        &self.fitness
    }

    #[inline]
    pub fn add_fitness(&mut self, index: usize, amount: f32) {
        self.fitness[index] += amount;
    }

    /// Add `amount` to every member not marked for removal
    pub fn reward_live(&mut self, amount: f32) {
        for (fitness, &marked) in self.fitness.iter_mut().zip(&self.marked) {
            if !marked {
                *fitness += amount;
            }
        }
    }

    #[inline]
    pub fn mark(&mut self, index: usize) {
        self.marked[index] = true;
    }

    #[inline]
    pub fn is_marked(&self, index: usize) -> bool {
        self.marked[index]
    }

    /// Members not yet marked for removal
    pub fn live_count(&self) -> usize {
        self.marked.iter().filter(|&&m| !m).count()
    }

    /// Drop every marked member from all three collections at once.
    ///
    /// Survivors keep their relative order. Returns the number removed.
    pub fn compact(&mut self) -> usize {
        let before = self.agents.len();
        if !self.marked.iter().any(|&m| m) {
            return 0;
        }

        let mut keep = 0;
        for i in 0..before {
            if self.marked[i] {
                self.settled.push((self.agents[i].candidate, self.fitness[i]));
                continue;
            }
            if keep != i {
                self.agents.swap(keep, i);
                self.brains.swap(keep, i);
                self.fitness.swap(keep, i);
            }
            keep += 1;
        }
        self.agents.truncate(keep);
        self.brains.truncate(keep);
        self.fitness.truncate(keep);
        self.marked.clear();
        self.marked.resize(keep, false);

        debug_assert_eq!(self.agents.len(), self.brains.len());
        debug_assert_eq!(self.agents.len(), self.fitness.len());
        before - keep
    }

    /// Removed members and their final fitness, in removal order
    pub fn settled(&self) -> &[(CandidateId, f32)] {
        &self.settled
    }

    /// Fitness of every member ever added (removed or live), ordered by id
    pub fn final_fitness(&self) -> Vec<(CandidateId, f32)> {
        let mut all = self.settled.clone();
        all.extend(
            self.agents
                .iter()
                .zip(&self.fitness)
                .map(|(a, &f)| (a.candidate, f)),
        );
        all.sort_by_key(|&(id, _)| id);
        all
    }
}

impl<D: ?Sized> Default for Population<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::silhouette::Silhouette;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn population(brains: &[u32]) -> Population<'_, u32> {
        let shape = Arc::new(Silhouette::ellipse(AGENT_WIDTH, AGENT_HEIGHT));
        let mut pop = Population::new();
        for (i, brain) in brains.iter().enumerate() {
            let agent = Agent::new(CandidateId(i), AGENT_SPAWN_X, AGENT_SPAWN_Y, shape.clone());
            pop.push(agent, brain);
            pop.add_fitness(i, i as f32);
        }
        pop
    }

    #[test]
    fn test_adjacent_removals_are_not_skipped() {
        let brains = [10, 11, 12, 13, 14];
        let mut pop = population(&brains);
        pop.mark(1);
        pop.mark(2);
        assert_eq!(pop.compact(), 2);

        let ids: Vec<_> = pop.agents().iter().map(|a| a.candidate.0).collect();
        assert_eq!(ids, vec![0, 3, 4]);
        assert_eq!(*pop.brain(1), 13);
        assert_eq!(pop.fitness(), &[0.0, 3.0, 4.0]);
        assert_eq!(pop.settled(), &[(CandidateId(1), 1.0), (CandidateId(2), 2.0)]);
    }

    #[test]
    fn test_reward_skips_marked() {
        let brains = [0, 0, 0];
        let mut pop = population(&brains);
        pop.mark(0);
        pop.reward_live(5.0);
        assert_eq!(pop.fitness(), &[0.0, 6.0, 7.0]);
        assert_eq!(pop.live_count(), 2);
    }

    #[test]
    fn test_final_fitness_covers_everyone() {
        let brains = [0, 0, 0, 0];
        let mut pop = population(&brains);
        pop.mark(3);
        pop.mark(0);
        pop.compact();
        let all = pop.final_fitness();
        assert_eq!(
            all,
            vec![
                (CandidateId(0), 0.0),
                (CandidateId(1), 1.0),
                (CandidateId(2), 2.0),
                (CandidateId(3), 3.0),
            ]
        );
    }

    proptest! {
        #[test]
        fn compaction_keeps_collections_aligned(marks in proptest::collection::vec(any::<bool>(), 0..40)) {
            let brains: Vec<u32> = (0..marks.len() as u32).collect();
            let mut pop = population(&brains);
            for (i, &m) in marks.iter().enumerate() {
                if m {
                    pop.mark(i);
                }
            }
            let removed = pop.compact();
            prop_assert_eq!(removed, marks.iter().filter(|&&m| m).count());
            prop_assert_eq!(pop.len(), marks.len() - removed);

            let mut last = None;
            for i in 0..pop.len() {
                let id = pop.agent(i).candidate.0;
                prop_assert!(!marks[id]);
                prop_assert_eq!(*pop.brain(i) as usize, id);
                prop_assert_eq!(pop.fitness()[i], id as f32);
                prop_assert!(last.is_none_or(|l| l < id));
                last = Some(id);
                prop_assert!(!pop.is_marked(i));
            }
            prop_assert_eq!(pop.final_fitness().len(), marks.len());
        }
    }
}
