//! Pixel World - grid-world NPC simulation
//!
//! Agents with needs, memories and relationships move over a tile world.
//! Each agent's choices come from a pluggable brain: a rule-based planner or a
//! learned scorer modulated by emotional state.

pub mod actions;
pub mod core;
pub mod decision;
pub mod entity;
pub mod simulation;
pub mod spatial;
pub mod ui;
pub mod world;
