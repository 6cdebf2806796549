//! Controller steering the robot.
//!
//! The built-in controller heads straight for the target. It reads the state rather than the
//! observation, so it works whatever sensors and rescaling the environment is configured with.

use navigation_sim::domain::{navigation, point_navigation};

pub trait Controller<S> {
    fn act(&mut self, state: &S) -> Vec<f64>;
}

/// Turns towards the target and drives to it, without looking out for walls.
pub struct SeekTarget;

impl Controller<navigation::State> for SeekTarget {
    fn act(&mut self, state: &navigation::State) -> Vec<f64> {
        let configuration = state.configuration();
        let offset = state.target_position() - state.robot_position();
        let bearing = (offset.direction() - state.robot_direction())
            .normalized()
            .radians();
        let max_turn = configuration.robot_max_turn;
        let velocity = if bearing.abs() > max_turn {
            0.0
        } else {
            offset.magnitude().min(configuration.robot_max_v)
        };
        vec![velocity, bearing.clamp(-max_turn, max_turn)]
    }
}

impl Controller<point_navigation::State> for SeekTarget {
    fn act(&mut self, state: &point_navigation::State) -> Vec<f64> {
        let offset = state.target_position() - state.robot_position();
        vec![offset.x(), offset.y()]
    }
}
