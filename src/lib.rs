//! Traffic Camera Simulation Library
//!
//! A grid traffic simulation that counts cars and trucks passing up to three
//! cameras. It runs headless, either ticked directly or on a tokio scheduler.

pub mod simulation;
