use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

/// Semantic coordinate range the unit plot cube represents, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            x: Interval::UNIT,
            y: Interval::UNIT,
            z: Interval::UNIT,
        }
    }
}

impl Domain {
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    pub fn axis(&self, axis: Axis) -> Interval {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Per-axis union.
    pub fn union(&self, other: &Domain) -> Domain {
        Domain {
            x: self.x.union(other.x),
            y: self.y.union(other.y),
            z: self.z.union(other.z),
        }
    }

    /// Union of all domains, `None` for an empty iterator.
    pub fn union_all<'a>(domains: impl IntoIterator<Item = &'a Domain>) -> Option<Domain> {
        domains
            .into_iter()
            .fold(None, |acc: Option<Domain>, d| match acc {
                Some(u) => Some(u.union(d)),
                None => Some(*d),
            })
    }

    pub fn extents(&self) -> [f64; 3] {
        [self.x.length(), self.y.length(), self.z.length()]
    }
}
