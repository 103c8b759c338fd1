use coulomb_common::{ParticleError, ParticleState, Vec2, MASS_TO_RADIUS_RATIO};

/// Sign of a particle's charge. Renderers use it to pick a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

/// One charged, massive point.
///
/// Mass, charge and radius are fixed at construction. Position, velocity and
/// the accumulated force change every tick and are only written by the
/// owning simulation; everyone else reads them through the accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    mass: f64,
    charge: f64,
    radius: f64,
    position: Vec2,
    velocity: Vec2,
    force: Vec2,
}

impl Particle {
    /// Creates a particle at rest with no accumulated force.
    ///
    /// The display radius is derived as `mass * MASS_TO_RADIUS_RATIO`.
    pub fn new(mass: f64, charge: f64, position: Vec2) -> Result<Self, ParticleError> {
        // NaN fails the comparison too
        if !(mass > 0.0) {
            return Err(ParticleError::NonPositiveMass { mass });
        }
        check_finite("mass", mass)?;
        check_finite("charge", charge)?;
        check_finite("position.x", position.x)?;
        check_finite("position.y", position.y)?;

        Ok(Self {
            mass,
            charge,
            radius: mass * MASS_TO_RADIUS_RATIO,
            position,
            velocity: Vec2::zero(),
            force: Vec2::zero(),
        })
    }

    /// Overrides the derived display radius.
    pub fn with_radius(mut self, radius: f64) -> Result<Self, ParticleError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(ParticleError::InvalidRadius { radius });
        }
        self.radius = radius;
        Ok(self)
    }

    /// Re-derives the display radius from a different mass-to-radius ratio.
    pub fn with_mass_to_radius_ratio(self, ratio: f64) -> Result<Self, ParticleError> {
        let radius = self.mass * ratio;
        self.with_radius(radius)
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Net force accumulated during the current (or most recent) tick.
    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn polarity(&self) -> Polarity {
        if self.charge > 0.0 {
            Polarity::Positive
        } else if self.charge < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Clears the accumulated force. Runs for every particle before any
    /// force is accumulated in a tick.
    pub fn reset(&mut self) {
        self.force = Vec2::zero();
    }

    pub fn add_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Force this particle exerts on `other` under the constant `k`.
    ///
    /// Returns `None` for coincident positions so that a degenerate pair
    /// contributes nothing instead of producing NaN.
    pub fn force_on(&self, other: &Particle, k: f64) -> Option<Vec2> {
        let direction = other.position - self.position;
        let distance_sq = direction.length_squared();
        let unit = direction.normalized().ok()?;
        Some(unit * (k * self.charge * other.charge / distance_sq))
    }

    /// Pushes this particle's force onto every particle in `others`.
    ///
    /// The contribution lands on the other particle's accumulator only; the
    /// reaction on `self` is added when the roles are swapped.
    pub fn act<'a, I>(&self, others: I, k: f64)
    where
        I: IntoIterator<Item = &'a mut Particle>,
    {
        for other in others {
            if let Some(force) = self.force_on(other, k) {
                other.add_force(force);
            }
        }
    }

    /// Semi-implicit Euler: velocity first, then position with the new velocity.
    pub fn step(&mut self, dt: f64) {
        let acceleration = self.force / self.mass;
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Detached copy for snapshots.
    pub fn state(&self, index: usize) -> ParticleState {
        ParticleState {
            index,
            mass: self.mass,
            charge: self.charge,
            radius: self.radius,
            position: self.position,
            velocity: self.velocity,
            force: self.force,
        }
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ParticleError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParticleError::NonFinite { field, value })
    }
}
