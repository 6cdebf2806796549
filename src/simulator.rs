//! Simulation of one episode.
//!
//! The controller picks an action from the current state, the environment applies it and the
//! step is recorded, until the robot is within tolerance of the target or the step budget is
//! used up.

use anyhow::Result;
use navigation_sim::domain::{Environment, Outcome, Step};
use tracing::debug;

use crate::controller::Controller;

#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub steps: usize,
    /// Time between two steps.
    pub dt: f64,
    /// Distance to the target at which the episode ends.
    pub tolerance: f64,
}

pub type Episode<S> = Outcome<Vec<f64>, Vec<f64>, S>;

pub fn simulate<E, C>(
    environment: &mut E,
    controller: &mut C,
    settings: Settings,
) -> Result<Episode<E::State>>
where
    E: Environment,
    E::State: Clone,
    C: Controller<E::State>,
{
    let mut outcome = Outcome::new();
    for i in 0..settings.steps {
        let distance = environment.distance_to_target();
        if distance <= settings.tolerance {
            debug!(step = i, distance, "target reached");
            break;
        }
        let t = i as f64 * settings.dt;
        let observation = environment.observe();
        let action = controller.act(environment.state());
        environment.step(t, &action)?;
        outcome.push(
            t,
            Step::new(observation, action, environment.state().clone()),
        )?;
    }
    Ok(outcome)
}
