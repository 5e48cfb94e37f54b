//! Fixed timestep session tick
//!
//! Advances one episode deterministically. Agents that die during a tick are
//! only marked; the population is compacted once at the end of the tick.

use super::collision::collides;
use super::obstacle::Obstacle;
use super::population::Population;
use super::state::{EpisodePhase, Session};
use crate::brain::{DecisionFunction, Observation};
use crate::consts::JUMP_THRESHOLD;
use crate::error::DecisionError;

/// Index of the obstacle agents sense this tick.
///
/// Once the lead agent is past the first obstacle's right edge, the next one
/// is the relevant gap.
pub fn sensing_index(obstacles: &[Obstacle], lead_x: Option<f32>) -> usize {
    match lead_x {
        Some(x) if obstacles.len() > 1 && x > obstacles[0].right_edge() => 1,
        _ => 0,
    }
}

/// Advance the session by one fixed tick and return the resulting phase.
///
/// A session that has already ended is left untouched.
pub fn tick<D: DecisionFunction + ?Sized>(session: &mut Session<'_, D>) -> EpisodePhase {
    if !session.phase.is_running() {
        return session.phase;
    }
    session.time_ticks += 1;

    // Sense, decide, move
    let lead_x = session.population.agents().first().map(|a| a.x);
    let sensed = &session.obstacles[sensing_index(&session.obstacles, lead_x)];
    let (gap_height, gap_bottom) = (sensed.height, sensed.bottom);
    decide_and_move(
        &mut session.population,
        gap_height,
        gap_bottom,
        session.config.survival_reward,
    );

    // Collide, pass, scroll
    let mut pass_flagged = false;
    let mut recycle = false;
    for obstacle in &mut session.obstacles {
        let population = &mut session.population;
        for i in 0..population.len() {
            if population.is_marked(i) {
                continue;
            }
            let agent = population.agent(i);
            let (agent_x, candidate) = (agent.x, agent.candidate);
            if collides(agent, obstacle) {
                population.add_fitness(i, -session.config.collision_penalty);
                population.mark(i);
                log::trace!("Agent {} hit obstacle at x={}", candidate.0, obstacle.x);
            }
            if !obstacle.passed && obstacle.x < agent_x {
                obstacle.passed = true;
                pass_flagged = true;
            }
        }
        obstacle.advance(session.config.scroll_velocity);
        if obstacle.is_off_screen() {
            recycle = true;
        }
    }

    if pass_flagged {
        session.score += 1;
        session.population.reward_live(session.config.pass_reward);
        let next = session.spawn_obstacle();
        log::debug!(
            "Generation {}: score {} at tick {}, next gap at {}",
            session.generation,
            session.score,
            session.time_ticks,
            next.height
        );
        session.obstacles.push(next);
    }

    if recycle {
        session.obstacles.retain(|o| !o.is_off_screen());
    }
    if session.obstacles.is_empty() {
        let next = session.spawn_obstacle();
        session.obstacles.push(next);
    }

    // Out of bounds
    let ground_y = session.ground.y;
    for i in 0..session.population.len() {
        if !session.population.is_marked(i) && session.population.agent(i).out_of_bounds(ground_y) {
            session.population.mark(i);
        }
    }

    session.population.compact();
    session.ground.advance(session.config.scroll_velocity);

    session.phase = if session.population.is_empty() {
        EpisodePhase::Extinct
    } else if session.score > session.config.score_cap {
        EpisodePhase::ScoreCapReached
    } else {
        EpisodePhase::Running
    };
    if !session.phase.is_running() {
        log::debug!(
            "Generation {}: episode ended {:?} after {} ticks, score {}",
            session.generation,
            session.phase,
            session.time_ticks,
            session.score
        );
    }
    session.phase
}

/// Evaluate every agent's decision function and integrate its motion.
///
/// A failing or non-finite decision marks that agent for removal with no
/// penalty; the rest of the population carries on.
fn decide_and_move<D: DecisionFunction + ?Sized>(
    population: &mut Population<'_, D>,
    gap_height: f32,
    gap_bottom: f32,
    survival_reward: f32,
) {
    for i in 0..population.len() {
        if population.is_marked(i) {
            continue;
        }
        let y = population.agent(i).y;
        let observation = Observation {
            y,
            to_gap_top: (y - gap_height).abs(),
            to_gap_bottom: (y - gap_bottom).abs(),
        };

        match checked_action(population.brain(i), &observation) {
            Ok(action) => {
                population.agent_mut(i).advance(action > JUMP_THRESHOLD);
                population.add_fitness(i, survival_reward);
            }
            Err(e) => {
                log::warn!("Agent {} decision failed: {e}; removing", population.agent(i).candidate.0);
                population.mark(i);
            }
        }
    }
}

/// Evaluate `brain`, treating a non-finite action as a failure
fn checked_action<D: DecisionFunction + ?Sized>(
    brain: &D,
    observation: &Observation,
) -> Result<f32, DecisionError> {
    let action = brain.evaluate(observation)?;
    if action.is_finite() {
        Ok(action)
    } else {
        Err(DecisionError::NonFinite(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::ConstantBrain;
    use crate::consts::*;
    use crate::optimizer::CandidateId;
    use crate::settings::SessionConfig;
    use crate::sim::state::Shapes;

    /// Flaps whenever it sinks below `floor`, holding a band around it
    struct Hover {
        floor: f32,
    }

    impl DecisionFunction for Hover {
        fn evaluate(&self, observation: &Observation) -> Result<f32, DecisionError> {
            Ok(if observation.y > self.floor { 1.0 } else { 0.0 })
        }

        fn export_state(&self) -> Vec<u8> {
            self.floor.to_le_bytes().to_vec()
        }
    }

    struct Broken;

    /// Always answers NaN
    struct Undefined;

    impl DecisionFunction for Undefined {
        fn evaluate(&self, _observation: &Observation) -> Result<f32, DecisionError> {
            Ok(f32::NAN)
        }

        fn export_state(&self) -> Vec<u8> {
            Vec::new()
        }
    }

    impl DecisionFunction for Broken {
        fn evaluate(&self, _observation: &Observation) -> Result<f32, DecisionError> {
            Err(DecisionError::Evaluation("boom".into()))
        }

        fn export_state(&self) -> Vec<u8> {
            Vec::new()
        }
    }

    /// Every gap centered at 300, so a hovering agent never collides
    fn fixed_gap_config() -> SessionConfig {
        SessionConfig {
            gap_center_range: (300, 301),
            ..Default::default()
        }
    }

    fn run_until_done<D: DecisionFunction + ?Sized>(session: &mut Session<'_, D>, limit: u64) {
        while session.phase.is_running() && session.time_ticks < limit {
            tick(session);
        }
    }

    #[test]
    fn test_sensing_switches_after_first_obstacle() {
        let brains = [ConstantBrain::IDLE];
        let session = Session::new(SessionConfig::default(), Shapes::standard(), 0, &brains).unwrap();
        let first = session.obstacle_at(100.0, 200.0);
        let second = session.obstacle_at(400.0, 200.0);
        let obstacles = vec![first, second];

        assert_eq!(sensing_index(&obstacles, Some(AGENT_SPAWN_X)), 1);
        assert_eq!(sensing_index(&obstacles, Some(150.0)), 0);
        assert_eq!(sensing_index(&obstacles[..1], Some(AGENT_SPAWN_X)), 0);
        assert_eq!(sensing_index(&obstacles, None), 0);
    }

    #[test]
    fn test_survival_reward_per_tick() {
        let brains = [ConstantBrain::IDLE];
        let mut session = Session::new(SessionConfig::default(), Shapes::standard(), 0, &brains).unwrap();
        for _ in 0..10 {
            tick(&mut session);
        }
        assert_eq!(session.population.len(), 1);
        assert!((session.population.fitness()[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_collision_on_tenth_tick_nets_zero() {
        let brains = [ConstantBrain::IDLE];
        let mut session = Session::new(SessionConfig::default(), Shapes::standard(), 0, &brains).unwrap();
        for _ in 0..9 {
            tick(&mut session);
        }
        // Upper barrier reaching down to y=600 right in front of the agent
        let wall = session.obstacle_at(AGENT_SPAWN_X + 5.0, 600.0);
        session.obstacles = vec![wall];

        assert_eq!(tick(&mut session), EpisodePhase::Extinct);
        let fitness = session.final_fitness();
        assert_eq!(fitness.len(), 1);
        assert!(fitness[0].1.abs() < 1e-5, "fitness {}", fitness[0].1);
    }

    #[test]
    fn test_clear_then_collide() {
        let brains = [Hover { floor: 420.0 }];
        let mut session = Session::new(fixed_gap_config(), Shapes::standard(), 0, &brains).unwrap();

        while session.score == 0 {
            assert_eq!(tick(&mut session), EpisodePhase::Running);
        }
        // Close the next gap
        let next = session.obstacles.len() - 1;
        let closed = session.obstacle_at(session.obstacles[next].x, 600.0);
        session.obstacles[next] = closed;

        run_until_done(&mut session, 1000);
        assert_eq!(session.phase, EpisodePhase::Extinct);
        let expected = session.time_ticks as f32 * SURVIVAL_REWARD + PASS_REWARD - COLLISION_PENALTY;
        let fitness = session.final_fitness()[0].1;
        assert!((fitness - expected).abs() < 1e-3, "{fitness} vs {expected}");
    }

    #[test]
    fn test_idle_population_goes_extinct_with_zero_score() {
        let brains = [ConstantBrain::IDLE; 3];
        let mut session = Session::new(SessionConfig::default(), Shapes::standard(), 0, &brains).unwrap();
        run_until_done(&mut session, 500);
        assert_eq!(session.phase, EpisodePhase::Extinct);
        assert_eq!(session.score, 0);
        assert!(session.population.is_empty());
        assert_eq!(session.final_fitness().len(), 3);

        // Further ticks are no-ops
        let ticks = session.time_ticks;
        assert_eq!(tick(&mut session), EpisodePhase::Extinct);
        assert_eq!(session.time_ticks, ticks);
    }

    #[test]
    fn test_score_cap_ends_episode_with_survivors() {
        let brains = [Hover { floor: 420.0 }, Hover { floor: 420.0 }];
        let config = SessionConfig {
            score_cap: 2,
            ..fixed_gap_config()
        };
        let mut session = Session::new(config, Shapes::standard(), 0, &brains).unwrap();
        run_until_done(&mut session, 2000);
        assert_eq!(session.phase, EpisodePhase::ScoreCapReached);
        assert_eq!(session.score, 3);
        assert_eq!(session.population.len(), 2);
        // Three passes worth of bonus on top of survival
        let expected = session.time_ticks as f32 * SURVIVAL_REWARD + 3.0 * PASS_REWARD;
        for &f in session.population.fitness() {
            assert!((f - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_recycled_obstacles_leave_immediately() {
        let brains = [Hover { floor: 420.0 }];
        let mut session = Session::new(fixed_gap_config(), Shapes::standard(), 0, &brains).unwrap();
        for _ in 0..400 {
            tick(&mut session);
            assert!(session.obstacles.iter().all(|o| o.right_edge() >= 0.0));
        }
        assert_eq!(session.phase, EpisodePhase::Running);
        // Every pass spawned one obstacle on top of the initial one
        let spawned = 1 + session.score as usize;
        assert!(spawned > session.obstacles.len(), "nothing was recycled");
    }

    #[test]
    fn test_always_jumping_agent_climbs_without_collision() {
        let brains = [ConstantBrain::FLAP];
        let config = SessionConfig {
            agent_spawn: glam::Vec2::new(AGENT_SPAWN_X, 350.0),
            ..Default::default()
        };
        let mut session = Session::new(config, Shapes::standard(), 0, &brains).unwrap();
        session.obstacles = vec![session.obstacle_at(600.0, 300.0)];

        let mut last_y = 350.0;
        for _ in 0..50 {
            if !session.phase.is_running() {
                break;
            }
            tick(&mut session);
            if let Some(agent) = session.population.agents().first() {
                assert!(agent.y <= 350.0);
                assert!(agent.y < last_y);
                last_y = agent.y;
                // Obstacle has not reached the agent yet
                assert!(session.obstacles[0].x > agent.x + AGENT_WIDTH as f32);
            }
        }
        // Left through the top, not through a barrier
        assert_eq!(session.phase, EpisodePhase::Extinct);
        let fitness = session.final_fitness()[0].1;
        assert!(fitness > 0.0);
        assert!((fitness - session.time_ticks as f32 * SURVIVAL_REWARD).abs() < 1e-3);
    }

    #[test]
    fn test_failing_brain_removed_without_penalty() {
        let hover = Hover { floor: 420.0 };
        let broken = Broken;
        let brains: [&dyn DecisionFunction; 3] = [&hover, &broken, &hover];
        let mut session =
            Session::new(fixed_gap_config(), Shapes::standard(), 0, brains.iter().copied()).unwrap();

        tick(&mut session);
        assert_eq!(session.population.len(), 2);
        let ids: Vec<_> = session.population.agents().iter().map(|a| a.candidate).collect();
        assert_eq!(ids, vec![CandidateId(0), CandidateId(2)]);
        assert_eq!(session.population.settled(), &[(CandidateId(1), 0.0)]);
        assert_eq!(session.phase, EpisodePhase::Running);
    }

    #[test]
    fn test_two_runs_are_identical() {
        let brains = [ConstantBrain::IDLE; 2];
        let config = SessionConfig {
            seed: 77,
            ..Default::default()
        };
        let mut a = Session::new(config.clone(), Shapes::standard(), 0, &brains).unwrap();
        let mut b = Session::new(config, Shapes::standard(), 0, &brains).unwrap();
        while a.phase.is_running() {
            tick(&mut a);
            tick(&mut b);
            assert_eq!(a.snapshot(), b.snapshot());
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(b.phase, EpisodePhase::Extinct);
    }

    #[test]
    fn test_simultaneous_deaths_all_removed() {
        let brains = [ConstantBrain::IDLE; 5];
        let mut session = Session::new(SessionConfig::default(), Shapes::standard(), 0, &brains).unwrap();
        let wall = session.obstacle_at(AGENT_SPAWN_X, 600.0);
        session.obstacles = vec![wall];
        tick(&mut session);
        assert!(session.population.is_empty());
        let fitness = session.final_fitness();
        assert_eq!(fitness.len(), 5);
        for (i, &(id, f)) in fitness.iter().enumerate() {
            assert_eq!(id, CandidateId(i));
            assert!((f - (SURVIVAL_REWARD - COLLISION_PENALTY)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_non_finite_action_removed_without_penalty() {
        let observation = Observation {
            y: 350.0,
            to_gap_top: 0.0,
            to_gap_bottom: 100.0,
        };
        assert!(matches!(
            checked_action(&Undefined, &observation),
            Err(DecisionError::NonFinite(a)) if a.is_nan()
        ));
        assert_eq!(checked_action(&ConstantBrain::FLAP, &observation), Ok(1.0));

        let hover = Hover { floor: 420.0 };
        let brains: [&dyn DecisionFunction; 2] = [&Undefined, &hover];
        let mut session =
            Session::new(fixed_gap_config(), Shapes::standard(), 0, brains.iter().copied()).unwrap();
        tick(&mut session);
        let ids: Vec<_> = session.population.agents().iter().map(|a| a.candidate).collect();
        assert_eq!(ids, vec![CandidateId(1)]);
        assert_eq!(session.population.settled(), &[(CandidateId(0), 0.0)]);
    }
}
