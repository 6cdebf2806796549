//! Simulation of robots navigating a 2D arena towards a target.


pub mod domain;
