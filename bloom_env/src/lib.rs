//! Ebb & Bloom Environment Layer
//!
//! Foundation types shared by the genesis engines and the simulation
//! harness:
//! - [`Seed`]: string or integer seeds, FNV-1a hashed, with labelled
//!   derivation of independent child streams
//! - [`BloomError`]: the narrow error taxonomy (`InvalidParameter` first)
//! - [`constants`]: physical constants in AU / M☉ / yr and SI
//! - [`Stepper`]: the `step(dt)` seam shared by time-integrated engines
//!
//! # Example
//!
//! ```
//! use bloom_env::Seed;
//!
//! let world = Seed::from("test-determinism");
//! let disk = world.derive("accretion");
//! assert_eq!(disk, Seed::from("test-determinism-accretion"));
//! ```

pub mod constants;
mod error;
mod stepper;
mod types;

pub use error::{ensure_finite, ensure_non_negative, ensure_positive, BloomError, BloomResult};
pub use stepper::Stepper;
pub use types::{fnv1a_64, Seed, FALLBACK_SEED};
