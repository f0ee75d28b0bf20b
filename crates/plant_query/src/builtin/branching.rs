//! Branch placement along the parent stem.
//!
//! Both algorithms place branches at fractions of the parent's length along its local +Y
//! axis, tilted by a declination around Z and spun around Y. Under the plant base (no
//! parent) every branch starts at the origin.
use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::Rng as RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{BranchingAlg, BranchingFactory, StemInstance};
use crate::rng::{rand01_or, reborrow, uniform_count};

fn attachment(parent: Option<&dyn StemInstance>, t: f32) -> Vec3 {
    Vec3::Y * parent.map_or(0.0, |p| p.length() * t)
}

fn tilt(rotation: f32, declination: f32) -> Quat {
    Quat::from_rotation_y(rotation) * Quat::from_rotation_z(declination)
}

fn validate_span(start: f32, end: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
        return Err(Error::Other(format!("invalid attachment span [{start}, {end}]")));
    }
    Ok(())
}

/// Exactly `count` evenly spaced branches; never consumes the random stream itself.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FixedBranching {
    pub count: u32,
    /// Tilt away from the parent axis, radians.
    pub declination: f32,
    /// Spin around the parent axis between consecutive branches, radians.
    pub rotation_step: f32,
    /// Attachment span as fractions of the parent length.
    pub start: f32,
    pub end: f32,
}

impl FixedBranching {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            declination: 0.0,
            rotation_step: TAU / 3.0,
            start: 0.0,
            end: 1.0,
        }
    }

    pub fn with_declination(mut self, declination: f32) -> Self {
        self.declination = declination;
        self
    }

    pub fn with_rotation_step(mut self, rotation_step: f32) -> Self {
        self.rotation_step = rotation_step;
        self
    }

    pub fn with_span(mut self, start: f32, end: f32) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_span(self.start, self.end)
    }

    fn fraction(&self, i: u32) -> f32 {
        if self.count <= 1 {
            0.5 * (self.start + self.end)
        } else {
            self.start + (self.end - self.start) * i as f32 / (self.count - 1) as f32
        }
    }
}

impl BranchingAlg for FixedBranching {
    fn create_branches(
        &self,
        factory: &mut dyn BranchingFactory,
        parent: Option<&dyn StemInstance>,
        mut rng: Option<&mut dyn RngCore>,
    ) {
        for i in 0..self.count {
            let offset = attachment(parent, self.fraction(i));
            let orientation = tilt(self.rotation_step * i as f32, self.declination);
            factory.generate_branch(reborrow(&mut rng), offset, orientation);
        }
    }
}

/// Between `min` and `max` branches at random positions and spins.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBranching {
    pub min: u32,
    pub max: u32,
    pub declination: f32,
    /// Maximum random deviation from `declination`, radians.
    pub declination_jitter: f32,
    pub start: f32,
    pub end: f32,
}

impl RandomBranching {
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min,
            max,
            declination: 0.0,
            declination_jitter: 0.0,
            start: 0.0,
            end: 1.0,
        }
    }

    pub fn with_declination(mut self, declination: f32, jitter: f32) -> Self {
        self.declination = declination;
        self.declination_jitter = jitter;
        self
    }

    pub fn with_span(mut self, start: f32, end: f32) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(Error::Other(format!(
                "branch count range {}..={} is empty",
                self.min, self.max
            )));
        }
        validate_span(self.start, self.end)
    }
}

impl BranchingAlg for RandomBranching {
    fn create_branches(
        &self,
        factory: &mut dyn BranchingFactory,
        parent: Option<&dyn StemInstance>,
        mut rng: Option<&mut dyn RngCore>,
    ) {
        let count = uniform_count(reborrow(&mut rng), self.min, self.max);
        for i in 0..count {
            let even = (i as f32 + 0.5) / count as f32;
            let t = self.start + (self.end - self.start) * rand01_or(reborrow(&mut rng), even);
            let rotation = rand01_or(reborrow(&mut rng), i as f32 / count as f32) * TAU;
            let jitter = 2.0 * rand01_or(reborrow(&mut rng), 0.5) - 1.0;
            let declination = self.declination + self.declination_jitter * jitter;
            factory.generate_branch(reborrow(&mut rng), attachment(parent, t), tilt(rotation, declination));
        }
    }
}
