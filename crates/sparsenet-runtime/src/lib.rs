//! # Sparsenet Runtime
//!
//! Learning, retrieval dynamics and ensemble runs on top of
//! `sparsenet-core`.
//!
//! A [`network::Network`] owns one topology and its Hebbian weights. The
//! [`dynamics::DynamicsEngine`] iterates the synchronous update rule from an
//! initial condition until the order parameters stop changing, reporting
//! each step to a [`trace::TraceSink`]. The [`ensemble::Ensemble`] runner
//! drives many networks over sets of pattern files.

pub mod analysis;
pub mod dynamics;
pub mod ensemble;
pub mod hebbian;
pub mod network;
pub mod pattern_io;
pub mod prelude;
pub mod trace;
