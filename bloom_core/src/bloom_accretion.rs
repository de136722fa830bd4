//! The "ACCRETION" Engine - Monte Carlo protoplanetary disks
//!
//! Two modes:
//! - [`MonteCarloAccretion::sample`] draws an initial N-body state (full
//!   position and velocity vectors) to hand to the gravity engine
//! - [`MonteCarloAccretion::collide`] evolves protoplanets in orbital-element
//!   space, merging bodies whose Hill spheres reach each other
//!
//! Surface density follows `Σ(r) ∝ r^(−p)`; `p = 1.5` is the Minimum Mass
//! Solar Nebula.

use crate::bloom_gravity::Body;
use crate::bloom_random::SeededRandom;
use crate::laws;
use bloom_env::constants::{density_to_astro, EARTH_MASS_SOLAR, EARTH_RADIUS, G_ASTRO, JUPITER_RADIUS, ROCK_DENSITY};
use bloom_env::{ensure_finite, ensure_non_negative, ensure_positive, BloomError, BloomResult, Seed};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

/// Years per collision iteration.
pub const ACCRETION_TIME_STEP: f64 = 1000.0;

/// Iterations before the stability check may stop a run.
const STABILITY_WARMUP: usize = 1000;

/// Bodies below which a run may be declared stable.
const STABILITY_MAX_BODIES: usize = 20;

/// Mutual Hill spacing needed for a stable neighbour pair.
const STABLE_HILL_SPACING: f64 = 3.0;

// =============================================================================
// DISK
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskParams {
    /// M☉
    pub star_mass: f64,
    /// Total mass shared by the sampled bodies (M☉)
    pub disk_mass: f64,
    /// AU
    pub inner_radius: f64,
    /// AU
    pub outer_radius: f64,
    /// Exponent `p` of `Σ ∝ r^(−p)`
    pub surface_density_index: f64,
    /// σ of the log-normal mass scatter
    pub mass_scatter: f64,
    /// Velocity perturbation as a fraction of circular speed
    pub velocity_dispersion: f64,
    /// Disk aspect ratio `h / r` for vertical scatter
    pub scale_height: f64,
}

impl Default for DiskParams {
    fn default() -> Self {
        Self {
            star_mass: 1.0,
            disk_mass: 0.01,
            inner_radius: 0.3,
            outer_radius: 30.0,
            surface_density_index: 1.5,
            mass_scatter: 0.5,
            velocity_dispersion: 0.01,
            scale_height: 0.02,
        }
    }
}

impl DiskParams {
    pub fn validate(&self) -> BloomResult<()> {
        ensure_positive("star_mass", self.star_mass)?;
        ensure_positive("disk_mass", self.disk_mass)?;
        ensure_positive("inner_radius", self.inner_radius)?;
        ensure_finite("outer_radius", self.outer_radius)?;
        if self.outer_radius <= self.inner_radius {
            return Err(BloomError::invalid(
                "outer_radius",
                format!("{} is not beyond inner_radius {}", self.outer_radius, self.inner_radius),
            ));
        }
        ensure_finite("surface_density_index", self.surface_density_index)?;
        ensure_non_negative("mass_scatter", self.mass_scatter)?;
        ensure_non_negative("velocity_dispersion", self.velocity_dispersion)?;
        ensure_non_negative("scale_height", self.scale_height)?;
        Ok(())
    }

    /// Relative surface density `r^(−p)`.
    pub fn surface_density(&self, radius: f64) -> f64 {
        radius.powf(-self.surface_density_index)
    }

    /// Frost line of the host star (AU).
    pub fn frost_line(&self) -> f64 {
        laws::frost_line(laws::main_sequence_luminosity(self.star_mass))
    }
}

// =============================================================================
// COMPOSITION
// =============================================================================

/// Mass fractions; they sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub rock: f64,
    pub ice: f64,
    pub gas: f64,
}

impl Composition {
    /// Condensation band at `orbit` relative to the frost line.
    pub fn for_orbit(orbit: f64, frost_line: f64) -> Self {
        let (rock, ice, gas) = if orbit < 0.5 * frost_line {
            (0.95, 0.0, 0.05)
        } else if orbit < frost_line {
            (0.7, 0.2, 0.1)
        } else if orbit < 3.0 * frost_line {
            (0.3, 0.5, 0.2)
        } else {
            (0.1, 0.2, 0.7)
        };
        Self { rock, ice, gas }
    }

    /// Mass-weighted mix of two bodies.
    pub fn mix(a: Composition, mass_a: f64, b: Composition, mass_b: f64) -> Self {
        let total = mass_a + mass_b;
        Self {
            rock: (a.rock * mass_a + b.rock * mass_b) / total,
            ice: (a.ice * mass_a + b.ice * mass_b) / total,
            gas: (a.gas * mass_a + b.gas * mass_b) / total,
        }
    }

    pub fn classify(&self) -> PlanetClass {
        if self.gas > 0.5 {
            PlanetClass::GasGiant
        } else if self.ice > 0.3 {
            PlanetClass::IceGiant
        } else {
            PlanetClass::Rocky
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetClass {
    Rocky,
    IceGiant,
    GasGiant,
}

impl std::fmt::Display for PlanetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Rocky => "rocky",
            Self::IceGiant => "ice_giant",
            Self::GasGiant => "gas_giant",
        };
        write!(f, "{}", name)
    }
}

/// Physical radius in metres from mass (M☉) and composition.
///
/// Gas giants sit near Jupiter's radius; solid bodies follow `R ∝ M^0.27`.
pub fn estimate_radius(mass: f64, composition: &Composition) -> f64 {
    if composition.gas > 0.5 {
        JUPITER_RADIUS
    } else {
        EARTH_RADIUS * (mass / EARTH_MASS_SOLAR).powf(0.27)
    }
}

// =============================================================================
// PROTOPLANETS
// =============================================================================

/// A body tracked by its orbital elements rather than a state vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protoplanet {
    pub id: u64,
    /// M☉
    pub mass: f64,
    /// Semi-major axis (AU)
    pub orbit: f64,
    pub eccentricity: f64,
    pub composition: Composition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccretionOutcome {
    pub bodies: Vec<Protoplanet>,
    pub collisions: usize,
    /// Years
    pub time: f64,
    pub iterations: usize,
    /// Stopped early on the mutual-Hill stability criterion
    pub stable: bool,
}

/// Final planet listing, innermost first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetSummary {
    pub index: usize,
    pub id: u64,
    pub mass: f64,
    /// Metres
    pub radius: f64,
    pub orbit: f64,
    pub eccentricity: f64,
    pub composition: Composition,
    pub class: PlanetClass,
}

// =============================================================================
// SAMPLER
// =============================================================================

/// Seeded disk sampler and collision model.
#[derive(Debug)]
pub struct MonteCarloAccretion {
    rng: SeededRandom,
    disk: DiskParams,
}

impl MonteCarloAccretion {
    pub fn new(seed: impl Into<Seed>, disk: DiskParams) -> BloomResult<Self> {
        disk.validate()?;
        Ok(Self {
            rng: SeededRandom::new(seed),
            disk,
        })
    }

    pub fn disk(&self) -> &DiskParams {
        &self.disk
    }

    /// Draws `body_count` bodies with ids `0..body_count`.
    pub fn sample(seed: impl Into<Seed>, body_count: usize, disk: &DiskParams) -> BloomResult<Vec<Body>> {
        let mut sampler = Self::new(seed, disk.clone())?;
        sampler.sample_bodies(body_count)
    }

    /// Draws state vectors for `body_count` bodies from this sampler's stream.
    pub fn sample_bodies(&mut self, body_count: usize) -> BloomResult<Vec<Body>> {
        let placements = self.place(body_count)?;
        let density = density_to_astro(ROCK_DENSITY);
        let star_mass = self.disk.star_mass;

        let mut bodies = Vec::with_capacity(body_count);
        for (id, (r, azimuth, mass)) in placements.into_iter().enumerate() {
            let (sin, cos) = azimuth.sin_cos();
            let z = self.rng.normal(0.0, self.disk.scale_height * r)?;

            let v_circ = laws::circular_velocity(G_ASTRO, star_mass, r);
            let sigma = self.disk.velocity_dispersion * v_circ;
            let perturbation = Vector3::new(
                self.rng.normal(0.0, sigma)?,
                self.rng.normal(0.0, sigma)?,
                self.rng.normal(0.0, sigma)?,
            );

            let mut body = Body::new(
                id as u64,
                mass,
                Vector3::new(r * cos, r * sin, z),
                Vector3::new(-v_circ * sin, v_circ * cos, 0.0) + perturbation,
            );
            body.radius = laws::sphere_radius(mass, density);
            bodies.push(body);
        }

        debug!(count = bodies.len(), seed = %self.rng.seed(), "disk sampled");
        Ok(bodies)
    }

    /// Draws protoplanets with near-circular orbits (`e ~ Beta(1, 10)`).
    pub fn initialize_protoplanets(&mut self, body_count: usize) -> BloomResult<Vec<Protoplanet>> {
        let placements = self.place(body_count)?;
        let frost_line = self.disk.frost_line();

        let mut bodies = Vec::with_capacity(body_count);
        for (id, (orbit, _, mass)) in placements.into_iter().enumerate() {
            bodies.push(Protoplanet {
                id: id as u64,
                mass,
                orbit,
                eccentricity: self.rng.beta(1.0, 10.0)?,
                composition: Composition::for_orbit(orbit, frost_line),
            });
        }
        Ok(bodies)
    }

    /// Hill radius of a protoplanet about this disk's star.
    pub fn hill_radius(&self, body: &Protoplanet) -> f64 {
        laws::hill_radius(body.orbit, body.mass, self.disk.star_mass)
    }

    /// Runs up to `iterations` collision rounds of [`ACCRETION_TIME_STEP`] years.
    ///
    /// Each round: every body collides at most once, merges keep the lower
    /// list position, then eccentricities random-walk. A run with fewer than
    /// 20 bodies may stop early once every neighbour pair is spaced by at
    /// least three mutual Hill radii.
    pub fn collide(&mut self, protoplanets: Vec<Protoplanet>, iterations: usize) -> BloomResult<AccretionOutcome> {
        for body in &protoplanets {
            ensure_positive("mass", body.mass)?;
            ensure_positive("orbit", body.orbit)?;
        }

        let mut bodies = protoplanets;
        let mut collisions = 0;
        let mut time = 0.0;
        let mut completed = 0;
        let mut stable = false;

        while completed < iterations && bodies.len() > 1 {
            time += ACCRETION_TIME_STEP;
            collisions += self.merge_round(&mut bodies);
            self.stir(&mut bodies)?;
            completed += 1;

            if bodies.len() < STABILITY_MAX_BODIES && completed > STABILITY_WARMUP && self.is_stable(&bodies) {
                stable = true;
                break;
            }
        }

        debug!(collisions, survivors = bodies.len(), time, "accretion finished");
        Ok(AccretionOutcome {
            bodies,
            collisions,
            time,
            iterations: completed,
            stable,
        })
    }

    /// Sorted planet listing with class and physical radius.
    pub fn planets(outcome: &AccretionOutcome) -> Vec<PlanetSummary> {
        let mut bodies = outcome.bodies.clone();
        bodies.sort_by(|a, b| a.orbit.total_cmp(&b.orbit));
        bodies
            .into_iter()
            .enumerate()
            .map(|(index, body)| PlanetSummary {
                index,
                id: body.id,
                mass: body.mass,
                radius: estimate_radius(body.mass, &body.composition),
                orbit: body.orbit,
                eccentricity: body.eccentricity,
                class: body.composition.classify(),
                composition: body.composition,
            })
            .collect()
    }

    /// True when every adjacent pair (by orbit) is Hill-stable.
    pub fn is_stable(&self, bodies: &[Protoplanet]) -> bool {
        let mut sorted: Vec<&Protoplanet> = bodies.iter().collect();
        sorted.sort_by(|a, b| a.orbit.total_cmp(&b.orbit));
        sorted.windows(2).all(|pair| {
            let spacing = pair[1].orbit - pair[0].orbit;
            spacing >= STABLE_HILL_SPACING * (self.hill_radius(pair[0]) + self.hill_radius(pair[1]))
        })
    }

    /// `(radius, azimuth, mass)` for each body, masses normalised to the disk mass.
    fn place(&mut self, body_count: usize) -> BloomResult<Vec<(f64, f64, f64)>> {
        // Bodies per annulus scale as r·Σ(r), i.e. a power law of index p − 1
        let alpha = self.disk.surface_density_index - 1.0;

        let mut raw = Vec::with_capacity(body_count);
        for _ in 0..body_count {
            let r = self.rng.power_law(alpha, self.disk.inner_radius, self.disk.outer_radius)?;
            let azimuth = self.rng.uniform() * TAU;
            let weight = self.disk.surface_density(r) * self.rng.log_normal(0.0, self.disk.mass_scatter)?;
            raw.push((r, azimuth, weight));
        }

        let total: f64 = raw.iter().map(|(_, _, w)| w).sum();
        Ok(raw
            .into_iter()
            .map(|(r, azimuth, w)| (r, azimuth, self.disk.disk_mass * w / total))
            .collect())
    }

    /// Contact reach of a pair: summed Hill radii plus eccentric excursions.
    fn reach(&self, a: &Protoplanet, b: &Protoplanet) -> (f64, f64) {
        let hill = self.hill_radius(a) + self.hill_radius(b);
        (hill, hill + a.eccentricity * a.orbit + b.eccentricity * b.orbit)
    }

    fn merge_round(&mut self, bodies: &mut Vec<Protoplanet>) -> usize {
        let n = bodies.len();
        let mut touched = vec![false; n];
        let mut absorbed = vec![false; n];
        let mut merges = 0;

        for i in 0..n {
            if touched[i] {
                continue;
            }
            for j in (i + 1)..n {
                if touched[j] {
                    continue;
                }
                let separation = (bodies[i].orbit - bodies[j].orbit).abs();
                let (hill, reach) = self.reach(&bodies[i], &bodies[j]);
                if separation >= reach {
                    continue;
                }
                let p = if separation > 0.0 { (hill / separation).min(1.0) } else { 1.0 };
                if self.rng.uniform() < p {
                    let other = bodies[j].clone();
                    merge_protoplanets(&mut bodies[i], &other);
                    touched[i] = true;
                    touched[j] = true;
                    absorbed[j] = true;
                    merges += 1;
                    break;
                }
            }
        }

        let mut index = 0;
        bodies.retain(|_| {
            let keep = !absorbed[index];
            index += 1;
            keep
        });
        merges
    }

    /// Gravitational stirring: eccentricity random walk clamped to `[0, 0.5]`.
    fn stir(&mut self, bodies: &mut [Protoplanet]) -> BloomResult<()> {
        let sigma = 0.001 * ACCRETION_TIME_STEP / 1000.0;
        for body in bodies {
            let e = body.eccentricity + self.rng.normal(0.0, sigma)?;
            body.eccentricity = e.clamp(0.0, 0.5);
        }
        Ok(())
    }
}

/// Inelastic merge in element space. Collisions damp eccentricity.
fn merge_protoplanets(body: &mut Protoplanet, other: &Protoplanet) {
    let mass = body.mass + other.mass;
    let eccentricity = (body.eccentricity * body.mass + other.eccentricity * other.mass) / mass * 0.7;

    body.orbit = (body.orbit * body.mass + other.orbit * other.mass) / mass;
    body.eccentricity = eccentricity.min(0.3);
    body.composition = Composition::mix(body.composition, body.mass, other.composition, other.mass);
    body.id = body.id.min(other.id);
    body.mass = mass;
}
