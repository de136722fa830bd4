//! Ebb & Bloom Genesis Harness
//!
//! Drives the seeded engines of `bloom_core` end to end and checks the
//! properties every world must satisfy.
//!
//! # Core Principle: One Seed, One World
//!
//! Every stage runs on a seed derived from the master seed by label:
//! - **Accretion**: `"<seed>-accretion"` samples the disk
//! - **Terrain**: `"<seed>-terrain"` builds the permutation table
//! - **Ecology**: `"<seed>-ecology"` drives the population noise
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌───────────────┐    ┌───────────┐    ┌───────────┐
//! │ Accretion    │───►│ N-body        │───►│ Terrain   │───►│ Ecology   │
//! │ (disk draw)  │    │ (merge/eject) │    │ (fBm)     │    │ (LV SDE)  │
//! └──────────────┘    └───────────────┘    └───────────┘    └───────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use bloom_sim::{GenesisWorld, SimConfig};
//!
//! let config = SimConfig::default().with_seed("test-determinism");
//! let report = GenesisWorld::new(config)?.run()?;
//! println!("{} bodies survived", report.bodies.len());
//! # Ok::<(), bloom_env::BloomError>(())
//! ```

mod exporter;
mod runner;
pub mod scenarios;
mod world;

pub use exporter::{record_genesis, BodyPosition, PopulationSample, SimEvent, SimExport, SimFrame};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{fingerprint, GenesisReport, GenesisWorld, SimConfig, TerrainSummary};
