//! Grain physics, the simulation driver, and configuration for Regolith.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `regolith-config.yaml` into
//!   strongly-typed structs.
//! - [`physics`] -- [`Physics`]: the per-grain state machine.
//! - [`runner`] -- [`run_simulation`] and [`solve`], the turn loop and its
//!   [`TurnCallback`] hook.
//!
//! [`Physics`]: physics::Physics
//! [`run_simulation`]: runner::run_simulation
//! [`solve`]: runner::solve
//! [`TurnCallback`]: runner::TurnCallback

pub mod config;
pub mod physics;
pub mod runner;
