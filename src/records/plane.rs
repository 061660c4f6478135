use std::fmt;

use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Plane `{ x : <x, normal> = constant }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub constant: f64,
}

/// Binary layout of CSPICE's `SpicePlane`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpicePlane {
    pub normal: [f64; 3],
    pub constant: f64,
}

impl Plane {
    pub fn new(normal: Vector3<f64>, constant: f64) -> Self {
        Plane { normal, constant }
    }
}

impl From<SpicePlane> for Plane {
    fn from(raw: SpicePlane) -> Self {
        Plane {
            normal: Vector3::from(raw.normal),
            constant: raw.constant,
        }
    }
}

impl From<&Plane> for SpicePlane {
    fn from(plane: &Plane) -> Self {
        SpicePlane {
            normal: plane.normal.into(),
            constant: plane.constant,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Plane: normal={}; constant={}>",
            self.normal.iter().join(", "),
            self.constant
        )
    }
}
