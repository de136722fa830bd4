//! Ebb & Bloom Core - Deterministic seeded world genesis
//!
//! Every engine is a pure function of its seed and inputs:
//! 1. **Randomness**: `SeededRandom`, a ChaCha8 stream keyed by an FNV-1a seed hash
//! 2. **Terrain**: `NoiseField`, seeded 2D simplex noise with octave (fBm) layering
//! 3. **Ecology**: `StochasticPopulationDynamics`, Euler-Maruyama Lotka-Volterra
//! 4. **Planets**: `MonteCarloAccretion` disks integrated by `NBodySimulator`
//!
//! Same seed, same parameters, same `dt` sequence: bit-identical results.

pub mod bloom_accretion;
pub mod bloom_ecology;
pub mod bloom_gravity;
pub mod bloom_noise;
pub mod bloom_random;
pub mod laws;
pub mod statistics;
pub mod viability;

// Re-export key types for convenience
pub use bloom_accretion::{AccretionOutcome, Composition, DiskParams, MonteCarloAccretion, PlanetClass, Protoplanet};
pub use bloom_ecology::{CompetitionParams, LotkaVolterraParams, PopulationState, StochasticPopulationDynamics};
pub use bloom_gravity::{Body, IntegrationReport, IntegrationScheme, NBodyConfig, NBodySimulator, NBodySystem};
pub use bloom_noise::{NoiseField, OctaveParams};
pub use bloom_random::SeededRandom;
pub use viability::{BirthDeathParams, PopulationViabilityAnalysis, ViabilityReport};
