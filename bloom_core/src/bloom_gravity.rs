//! The "GRAVITY" Engine - Softened N-body integration
//!
//! Units are AU, solar masses and years, so `G = 4π²` and Earth's orbit has
//! speed `2π`. Forces are accumulated pairwise in O(n²):
//!
//! ```text
//! a_i = Σ_j G·m_j·r̂_ij / (|r_ij|² + ε²)
//! ```
//!
//! plus an optional fixed central mass at the origin. After every step the
//! body list is scanned for merges (in stable index order) and ejections,
//! so the same input always produces the same final set.

use crate::laws;
use bloom_env::constants::{density_to_astro, G_ASTRO, ROCK_DENSITY};
use bloom_env::{ensure_finite, ensure_non_negative, ensure_positive, BloomError, BloomResult, Stepper};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

// =============================================================================
// BODIES & CONFIG
// =============================================================================

/// A point mass with a collision radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: u64,
    /// M☉
    pub mass: f64,
    /// AU
    pub position: Vector3<f64>,
    /// AU / yr
    pub velocity: Vector3<f64>,
    /// AU. Recomputed from mass and body density by the simulator.
    pub radius: f64,
}

impl Body {
    pub fn new(id: u64, mass: f64, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            id,
            mass,
            position,
            velocity,
            radius: 0.0,
        }
    }

    pub fn momentum(&self) -> Vector3<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    /// Kick-drift-kick, symplectic
    #[default]
    Leapfrog,
    /// Classical fourth-order Runge-Kutta
    RungeKutta4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NBodyConfig {
    /// Gravitational constant (AU³ / M☉ / yr²)
    pub g: f64,
    /// Softening length ε (AU)
    pub softening: f64,
    /// Fixed mass at the origin (M☉), if any
    pub central_mass: Option<f64>,
    /// Body density (M☉ / AU³) used for collision radii
    pub body_density: f64,
    /// Merge when separation < merge_factor · (r_i + r_j)
    pub merge_factor: f64,
    /// Distance (AU) beyond which unbound bodies are removed
    pub ejection_radius: f64,
    pub scheme: IntegrationScheme,
}

impl Default for NBodyConfig {
    fn default() -> Self {
        Self {
            g: G_ASTRO,
            softening: 1e-4,
            central_mass: None,
            body_density: density_to_astro(ROCK_DENSITY),
            merge_factor: 1.0,
            ejection_radius: 100.0,
            scheme: IntegrationScheme::Leapfrog,
        }
    }
}

impl NBodyConfig {
    pub fn validate(&self) -> BloomResult<()> {
        ensure_positive("g", self.g)?;
        ensure_non_negative("softening", self.softening)?;
        if let Some(mass) = self.central_mass {
            ensure_positive("central_mass", mass)?;
        }
        ensure_positive("body_density", self.body_density)?;
        ensure_non_negative("merge_factor", self.merge_factor)?;
        ensure_positive("ejection_radius", self.ejection_radius)?;
        Ok(())
    }
}

/// Final state and bookkeeping of an integration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationReport {
    pub bodies: Vec<Body>,
    pub merges: usize,
    pub ejections: usize,
    pub steps: usize,
    pub time: f64,
}

/// Orbit request for [`NBodySimulator::initialize_planetary_system`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanetSpec {
    pub mass: f64,
    /// Starting distance from the star (AU), at periapsis
    pub orbit_radius: f64,
    pub eccentricity: f64,
}

// =============================================================================
// SIMULATOR
// =============================================================================

/// Stateless N-body integrator. Holds only its configuration.
#[derive(Debug, Clone)]
pub struct NBodySimulator {
    config: NBodyConfig,
}

impl NBodySimulator {
    pub fn new(config: NBodyConfig) -> BloomResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NBodyConfig {
        &self.config
    }

    /// Collision radius of a body of the given mass.
    pub fn collision_radius(&self, mass: f64) -> f64 {
        laws::sphere_radius(mass, self.config.body_density)
    }

    /// Integrates `bodies` for `steps` steps of length `dt`.
    ///
    /// An empty (or emptied) body set is a valid outcome.
    pub fn integrate(&self, bodies: Vec<Body>, steps: usize, dt: f64) -> BloomResult<IntegrationReport> {
        ensure_positive("dt", dt)?;
        let mut system = NBodySystem::new(self.clone(), bodies)?;
        system.advance(steps, dt)?;
        Ok(system.into_report())
    }

    /// Accelerations of every body at the given positions.
    pub fn accelerations(&self, positions: &[Vector3<f64>], masses: &[f64]) -> Vec<Vector3<f64>> {
        let g = self.config.g;
        let eps2 = self.config.softening * self.config.softening;
        let mut acc = vec![Vector3::zeros(); positions.len()];

        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let r = positions[j] - positions[i];
                let dist2 = r.norm_squared();
                if dist2 == 0.0 {
                    continue;
                }
                // r̂ / (r² + ε²)
                let scaled = r / (dist2.sqrt() * (dist2 + eps2));
                acc[i] += scaled * (g * masses[j]);
                acc[j] -= scaled * (g * masses[i]);
            }
        }

        if let Some(central) = self.config.central_mass {
            for (a, x) in acc.iter_mut().zip(positions) {
                let dist2 = x.norm_squared();
                if dist2 == 0.0 {
                    continue;
                }
                *a -= x / (dist2.sqrt() * (dist2 + eps2)) * (g * central);
            }
        }

        acc
    }

    /// Kinetic plus softened potential energy, including the central mass.
    ///
    /// The potential `−G·m_i·m_j·atan(ε/r)/ε` is the exact integral of the
    /// softened force and tends to `−G·m_i·m_j/r` as ε → 0.
    pub fn total_energy(&self, bodies: &[Body]) -> f64 {
        let g = self.config.g;
        let eps = self.config.softening;
        let kinetic: f64 = bodies.iter().map(Body::kinetic_energy).sum();

        let mut potential = 0.0;
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let dist = (bodies[j].position - bodies[i].position).norm();
                potential += softened_potential(g * bodies[i].mass * bodies[j].mass, dist, eps);
            }
        }
        if let Some(central) = self.config.central_mass {
            for body in bodies {
                potential += softened_potential(g * central * body.mass, body.position.norm(), eps);
            }
        }

        kinetic + potential
    }

    /// Star at the origin (id 0) and planets spread evenly in azimuth on
    /// prograde orbits in the XY plane, each starting at periapsis.
    pub fn initialize_planetary_system(&self, star_mass: f64, planets: &[PlanetSpec]) -> BloomResult<Vec<Body>> {
        ensure_positive("star_mass", star_mass)?;

        let mut star = Body::new(0, star_mass, Vector3::zeros(), Vector3::zeros());
        star.radius = self.collision_radius(star_mass);
        let mut bodies = vec![star];

        for (i, planet) in planets.iter().enumerate() {
            ensure_positive("mass", planet.mass)?;
            ensure_positive("orbit_radius", planet.orbit_radius)?;
            if !(0.0..1.0).contains(&planet.eccentricity) {
                return Err(BloomError::invalid("eccentricity", format!("{} is outside [0, 1)", planet.eccentricity)));
            }

            let angle = i as f64 / planets.len() as f64 * TAU;
            let (sin, cos) = angle.sin_cos();
            let r = planet.orbit_radius;
            let v = circular_orbit_velocity(self.config.g, star_mass, r, planet.eccentricity);

            let mut body = Body::new(
                i as u64 + 1,
                planet.mass,
                Vector3::new(r * cos, r * sin, 0.0),
                Vector3::new(-v * sin, v * cos, 0.0),
            );
            body.radius = self.collision_radius(planet.mass);
            bodies.push(body);
        }

        Ok(bodies)
    }

    fn step_leapfrog(&self, bodies: &mut [Body], dt: f64) {
        let masses: Vec<f64> = bodies.iter().map(|b| b.mass).collect();
        let positions: Vec<Vector3<f64>> = bodies.iter().map(|b| b.position).collect();
        let acc = self.accelerations(&positions, &masses);

        for (body, a) in bodies.iter_mut().zip(&acc) {
            body.velocity += a * (0.5 * dt);
            body.position += body.velocity * dt;
        }

        let positions: Vec<Vector3<f64>> = bodies.iter().map(|b| b.position).collect();
        let acc = self.accelerations(&positions, &masses);
        for (body, a) in bodies.iter_mut().zip(&acc) {
            body.velocity += a * (0.5 * dt);
        }
    }

    fn step_rk4(&self, bodies: &mut [Body], dt: f64) {
        let masses: Vec<f64> = bodies.iter().map(|b| b.mass).collect();
        let x0: Vec<Vector3<f64>> = bodies.iter().map(|b| b.position).collect();
        let v0: Vec<Vector3<f64>> = bodies.iter().map(|b| b.velocity).collect();

        let offset = |base: &[Vector3<f64>], delta: &[Vector3<f64>], h: f64| -> Vec<Vector3<f64>> {
            base.iter().zip(delta).map(|(b, d)| b + d * h).collect()
        };

        let k1x = v0.clone();
        let k1v = self.accelerations(&x0, &masses);

        let k2x = offset(&v0, &k1v, 0.5 * dt);
        let k2v = self.accelerations(&offset(&x0, &k1x, 0.5 * dt), &masses);

        let k3x = offset(&v0, &k2v, 0.5 * dt);
        let k3v = self.accelerations(&offset(&x0, &k2x, 0.5 * dt), &masses);

        let k4x = offset(&v0, &k3v, dt);
        let k4v = self.accelerations(&offset(&x0, &k3x, dt), &masses);

        for (i, body) in bodies.iter_mut().enumerate() {
            body.position = x0[i] + (k1x[i] + k2x[i] * 2.0 + k3x[i] * 2.0 + k4x[i]) * (dt / 6.0);
            body.velocity = v0[i] + (k1v[i] + k2v[i] * 2.0 + k3v[i] * 2.0 + k4v[i]) * (dt / 6.0);
        }
    }

    /// Repeated merge passes until no pair overlaps. Returns the merge count.
    fn resolve_merges(&self, bodies: &mut Vec<Body>) -> usize {
        let mut total = 0;
        loop {
            let n = bodies.len();
            let mut touched = vec![false; n];
            let mut absorbed = vec![false; n];
            let mut merged_this_pass = 0;

            for i in 0..n {
                if touched[i] {
                    continue;
                }
                for j in (i + 1)..n {
                    if touched[j] {
                        continue;
                    }
                    let separation = (bodies[j].position - bodies[i].position).norm();
                    let threshold = self.config.merge_factor * (bodies[i].radius + bodies[j].radius);
                    if separation < threshold {
                        let other = bodies[j].clone();
                        self.absorb(&mut bodies[i], &other);
                        touched[i] = true;
                        touched[j] = true;
                        absorbed[j] = true;
                        merged_this_pass += 1;
                        break;
                    }
                }
            }

            if merged_this_pass == 0 {
                return total;
            }
            let mut index = 0;
            bodies.retain(|_| {
                let keep = !absorbed[index];
                index += 1;
                keep
            });
            total += merged_this_pass;
        }
    }

    /// Perfectly inelastic merge of `other` into `body`.
    fn absorb(&self, body: &mut Body, other: &Body) {
        let mass = body.mass + other.mass;
        debug!(survivor = body.id.min(other.id), lost = body.id.max(other.id), mass, "bodies merged");

        body.position = (body.position * body.mass + other.position * other.mass) / mass;
        body.velocity = (body.momentum() + other.momentum()) / mass;
        body.mass = mass;
        body.id = body.id.min(other.id);
        body.radius = self.collision_radius(mass);
    }

    /// Removes escaping bodies. Returns how many were removed.
    fn remove_ejected(&self, bodies: &mut Vec<Body>) -> usize {
        let limit = self.config.ejection_radius;
        let central = self.config.central_mass.unwrap_or(0.0);
        let system_mass: f64 = bodies.iter().map(|b| b.mass).sum();
        let g = self.config.g;

        let before = bodies.len();
        bodies.retain(|body| {
            let distance = body.position.norm();
            if distance <= limit {
                return true;
            }
            let escape = laws::escape_velocity(g, central + system_mass - body.mass, distance);
            let ejected = distance > 2.0 * limit || body.velocity.norm() > escape;
            if ejected {
                debug!(id = body.id, distance, "body ejected");
            }
            !ejected
        });
        before - bodies.len()
    }
}

fn softened_potential(g_m1_m2: f64, dist: f64, eps: f64) -> f64 {
    if eps > 0.0 {
        -g_m1_m2 * (eps / dist).atan() / eps
    } else {
        -g_m1_m2 / dist
    }
}

// =============================================================================
// STATEFUL SYSTEM
// =============================================================================

/// A body set advanced step by step, with merge and ejection bookkeeping.
#[derive(Debug, Clone)]
pub struct NBodySystem {
    simulator: NBodySimulator,
    bodies: Vec<Body>,
    time: f64,
    steps: usize,
    merges: usize,
    ejections: usize,
}

impl NBodySystem {
    /// Validates the bodies and assigns their collision radii.
    pub fn new(simulator: NBodySimulator, mut bodies: Vec<Body>) -> BloomResult<Self> {
        for body in &mut bodies {
            ensure_positive("mass", body.mass)?;
            for c in body.position.iter().chain(body.velocity.iter()) {
                ensure_finite("state", *c)?;
            }
            body.radius = simulator.collision_radius(body.mass);
        }
        Ok(Self {
            simulator,
            bodies,
            time: 0.0,
            steps: 0,
            merges: 0,
            ejections: 0,
        })
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn merges(&self) -> usize {
        self.merges
    }

    pub fn ejections(&self) -> usize {
        self.ejections
    }

    pub fn into_report(self) -> IntegrationReport {
        IntegrationReport {
            bodies: self.bodies,
            merges: self.merges,
            ejections: self.ejections,
            steps: self.steps,
            time: self.time,
        }
    }
}

impl Stepper for NBodySystem {
    fn step(&mut self, dt: f64) -> BloomResult<()> {
        ensure_positive("dt", dt)?;

        if !self.bodies.is_empty() {
            match self.simulator.config.scheme {
                IntegrationScheme::Leapfrog => self.simulator.step_leapfrog(&mut self.bodies, dt),
                IntegrationScheme::RungeKutta4 => self.simulator.step_rk4(&mut self.bodies, dt),
            }
            self.merges += self.simulator.resolve_merges(&mut self.bodies);
            self.ejections += self.simulator.remove_ejected(&mut self.bodies);
        }

        self.time += dt;
        self.steps += 1;
        Ok(())
    }

    fn time(&self) -> f64 {
        self.time
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Speed at the periapsis of an orbit about `central_mass`; circular when `e = 0`.
pub fn circular_orbit_velocity(g: f64, central_mass: f64, radius: f64, eccentricity: f64) -> f64 {
    laws::periapsis_velocity(g, central_mass, radius, eccentricity)
}

pub fn total_momentum(bodies: &[Body]) -> Vector3<f64> {
    bodies.iter().map(Body::momentum).sum()
}

/// Mass-weighted mean position. `None` for an empty set.
pub fn center_of_mass(bodies: &[Body]) -> Option<Vector3<f64>> {
    let mass: f64 = bodies.iter().map(|b| b.mass).sum();
    if bodies.is_empty() || mass == 0.0 {
        return None;
    }
    Some(bodies.iter().map(|b| b.position * b.mass).sum::<Vector3<f64>>() / mass)
}

/// Total angular momentum about the origin, `Σ m·(x × v)`.
pub fn angular_momentum(bodies: &[Body]) -> Vector3<f64> {
    bodies.iter().map(|b| b.position.cross(&b.velocity) * b.mass).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn earth_around_sun(scheme: IntegrationScheme) -> (NBodySimulator, Vec<Body>) {
        let config = NBodyConfig {
            central_mass: Some(1.0),
            scheme,
            ..NBodyConfig::default()
        };
        let sim = NBodySimulator::new(config).unwrap();
        let earth = Body::new(
            1,
            3e-6,
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, TAU, 0.0),
        );
        (sim, vec![earth])
    }

    #[test]
    fn test_overlapping_bodies_merge() {
        let sim = NBodySimulator::new(NBodyConfig::default()).unwrap();
        let bodies = vec![
            Body::new(7, 1e-6, Vector3::new(-2.5e-5, 0.0, 0.0), Vector3::zeros()),
            Body::new(3, 1e-6, Vector3::new(2.5e-5, 0.0, 0.0), Vector3::zeros()),
        ];
        let report = sim.integrate(bodies, 1, 1e-6).unwrap();

        assert_eq!(report.bodies.len(), 1);
        assert_eq!(report.merges, 1);
        let merged = &report.bodies[0];
        assert_eq!(merged.id, 3);
        assert_relative_eq!(merged.mass, 2e-6, epsilon = 1e-18);
        assert!(merged.momentum().norm() < 1e-18);
        assert!(merged.position.norm() < 1e-12);
        assert_relative_eq!(merged.radius, sim.collision_radius(2e-6));
    }

    #[test]
    fn test_bodies_at_rest_fall_together_and_merge() {
        let sim = NBodySimulator::new(NBodyConfig::default()).unwrap();
        let bodies = vec![
            Body::new(0, 1e-3, Vector3::new(-0.005, 0.0, 0.0), Vector3::zeros()),
            Body::new(1, 1e-3, Vector3::new(0.005, 0.0, 0.0), Vector3::zeros()),
        ];
        let report = sim.integrate(bodies, 1000, 1e-5).unwrap();

        assert_eq!(report.bodies.len(), 1);
        assert_relative_eq!(report.bodies[0].mass, 2e-3, epsilon = 1e-15);
        assert!(total_momentum(&report.bodies).norm() < 1e-12);
        assert_eq!(report.steps, 1000);
    }

    #[test]
    fn test_sterile_system_is_ok() {
        let sim = NBodySimulator::new(NBodyConfig::default()).unwrap();
        let report = sim.integrate(Vec::new(), 10, 0.01).unwrap();
        assert!(report.bodies.is_empty());
        assert_eq!(report.steps, 10);
        assert!(center_of_mass(&report.bodies).is_none());
        assert_eq!(total_momentum(&report.bodies), Vector3::zeros());
        assert_eq!(sim.total_energy(&report.bodies), 0.0);
    }

    #[test]
    fn test_escaping_bodies_removed() {
        let config = NBodyConfig {
            central_mass: Some(1.0),
            ejection_radius: 10.0,
            ..NBodyConfig::default()
        };
        let sim = NBodySimulator::new(config).unwrap();
        let bodies = vec![
            // bound, inside the cutoff
            Body::new(0, 3e-6, Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, TAU, 0.0)),
            // fast and far
            Body::new(1, 3e-6, Vector3::new(50.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)),
            // beyond twice the cutoff
            Body::new(2, 3e-6, Vector3::new(0.0, 25.0, 0.0), Vector3::zeros()),
        ];
        let report = sim.integrate(bodies, 1, 0.001).unwrap();

        assert_eq!(report.ejections, 2);
        assert_eq!(report.bodies.len(), 1);
        assert_eq!(report.bodies[0].id, 0);
    }

    #[test]
    fn test_leapfrog_conserves_energy_over_one_orbit() {
        let (sim, bodies) = earth_around_sun(IntegrationScheme::Leapfrog);
        let e0 = sim.total_energy(&bodies);
        let start = bodies[0].position;
        let report = sim.integrate(bodies, 1000, 0.001).unwrap();

        let e1 = sim.total_energy(&report.bodies);
        assert!(((e1 - e0) / e0).abs() < 1e-4, "drift {}", (e1 - e0) / e0);
        assert!((report.bodies[0].position - start).norm() < 0.01);
        assert_relative_eq!(report.time, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rk4_conserves_energy_over_one_orbit() {
        let (sim, bodies) = earth_around_sun(IntegrationScheme::RungeKutta4);
        let e0 = sim.total_energy(&bodies);
        let l0 = angular_momentum(&bodies);
        let report = sim.integrate(bodies, 1000, 0.001).unwrap();

        let e1 = sim.total_energy(&report.bodies);
        assert!(((e1 - e0) / e0).abs() < 1e-6);
        let l1 = angular_momentum(&report.bodies);
        assert!((l1 - l0).norm() / l0.norm() < 1e-6);
    }

    #[test]
    fn test_self_gravitating_system_conserves_momentum() {
        let sim = NBodySimulator::new(NBodyConfig::default()).unwrap();
        let planets = [
            PlanetSpec { mass: 3e-6, orbit_radius: 1.0, eccentricity: 0.0 },
            PlanetSpec { mass: 1e-3, orbit_radius: 5.2, eccentricity: 0.05 },
            PlanetSpec { mass: 3e-4, orbit_radius: 9.5, eccentricity: 0.0 },
        ];
        let bodies = sim.initialize_planetary_system(1.0, &planets).unwrap();
        assert_eq!(bodies.len(), 4);
        assert_eq!(bodies[0].id, 0);

        let p0 = total_momentum(&bodies);
        let report = sim.integrate(bodies.clone(), 500, 0.002).unwrap();
        let p1 = total_momentum(&report.bodies);

        assert_eq!(report.bodies.len(), 4);
        assert!((p1 - p0).norm() < 1e-12);

        // Same input, same output
        let again = sim.integrate(bodies, 500, 0.002).unwrap();
        assert_eq!(again, report);
    }

    #[test]
    fn test_initial_orbit_speed() {
        let sim = NBodySimulator::new(NBodyConfig::default()).unwrap();
        let planets = [PlanetSpec { mass: 3e-6, orbit_radius: 1.0, eccentricity: 0.0 }];
        let bodies = sim.initialize_planetary_system(1.0, &planets).unwrap();
        assert_relative_eq!(bodies[1].velocity.norm(), TAU, epsilon = 1e-12);
        assert_relative_eq!(bodies[1].position.dot(&bodies[1].velocity), 0.0, epsilon = 1e-12);

        let bad = [PlanetSpec { mass: 3e-6, orbit_radius: 1.0, eccentricity: 1.0 }];
        assert!(sim.initialize_planetary_system(1.0, &bad).is_err());
    }

    #[test]
    fn test_center_of_mass() {
        let bodies = vec![
            Body::new(0, 1.0, Vector3::new(0.0, 0.0, 0.0), Vector3::zeros()),
            Body::new(1, 3.0, Vector3::new(4.0, 0.0, 0.0), Vector3::zeros()),
        ];
        assert_relative_eq!(center_of_mass(&bodies).unwrap(), Vector3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let sim = NBodySimulator::new(NBodyConfig::default()).unwrap();
        let body = || vec![Body::new(0, 1e-6, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros())];

        assert!(sim.integrate(body(), 1, 0.0).unwrap_err().is_invalid_parameter());
        assert!(sim.integrate(body(), 1, -0.1).is_err());
        assert!(sim.integrate(body(), 1, f64::INFINITY).is_err());

        let negative = vec![Body::new(0, -1.0, Vector3::zeros(), Vector3::zeros())];
        assert!(sim.integrate(negative, 1, 0.01).is_err());

        let nan = vec![Body::new(0, 1.0, Vector3::new(f64::NAN, 0.0, 0.0), Vector3::zeros())];
        assert!(sim.integrate(nan, 1, 0.01).is_err());

        let bad_config = NBodyConfig {
            softening: -1.0,
            ..NBodyConfig::default()
        };
        assert!(NBodySimulator::new(bad_config).is_err());
        let bad_central = NBodyConfig {
            central_mass: Some(0.0),
            ..NBodyConfig::default()
        };
        assert!(NBodySimulator::new(bad_central).is_err());
    }

    #[test]
    fn test_config_partial_json() {
        let config: NBodyConfig = serde_json::from_str(r#"{"softening": 0.01, "scheme": "runge_kutta4"}"#).unwrap();
        assert_eq!(config.softening, 0.01);
        assert_eq!(config.scheme, IntegrationScheme::RungeKutta4);
        assert_eq!(config.g, G_ASTRO);
    }
}
