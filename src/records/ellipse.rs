use std::fmt;

use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Ellipse in 3-space given by its center and semi-axis vectors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Vector3<f64>,
    pub semi_major: Vector3<f64>,
    pub semi_minor: Vector3<f64>,
}

/// Binary layout of CSPICE's `SpiceEllipse`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpiceEllipse {
    pub center: [f64; 3],
    pub semi_major: [f64; 3],
    pub semi_minor: [f64; 3],
}

impl Ellipse {
    pub fn new(center: Vector3<f64>, semi_major: Vector3<f64>, semi_minor: Vector3<f64>) -> Self {
        Ellipse {
            center,
            semi_major,
            semi_minor,
        }
    }
}

impl From<SpiceEllipse> for Ellipse {
    fn from(raw: SpiceEllipse) -> Self {
        Ellipse {
            center: Vector3::from(raw.center),
            semi_major: Vector3::from(raw.semi_major),
            semi_minor: Vector3::from(raw.semi_minor),
        }
    }
}

impl From<&Ellipse> for SpiceEllipse {
    fn from(ellipse: &Ellipse) -> Self {
        SpiceEllipse {
            center: ellipse.center.into(),
            semi_major: ellipse.semi_major.into(),
            semi_minor: ellipse.semi_minor.into(),
        }
    }
}

impl fmt::Display for Ellipse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<SpiceEllipse: center = [{}], semi_major = [{}], semi_minor = [{}]>",
            self.center.iter().join(", "),
            self.semi_major.iter().join(", "),
            self.semi_minor.iter().join(", ")
        )
    }
}

#[cfg(test)]
mod ellipse_test {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        let ellipse = Ellipse::default();
        assert_eq!(ellipse.center, Vector3::zeros());
        assert_eq!(ellipse.semi_major, Vector3::zeros());
        assert_eq!(ellipse.semi_minor, Vector3::zeros());
    }

    #[test]
    fn test_native_conversion() {
        let raw = SpiceEllipse {
            center: [1.0, 2.0, 3.0],
            semi_major: [4.0, 5.0, 6.0],
            semi_minor: [7.0, 8.0, 9.0],
        };
        let ellipse = Ellipse::from(raw);
        assert_eq!(ellipse.semi_major, Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(SpiceEllipse::from(&ellipse), raw);
    }

    #[test]
    fn test_display() {
        let ellipse = Ellipse::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 0.0, 0.0),
            Vector3::new(0.0, 2.5, 0.0),
        );
        assert_eq!(
            ellipse.to_string(),
            "<SpiceEllipse: center = [1, 2, 3], semi_major = [4, 0, 0], semi_minor = [0, 2.5, 0]>"
        );
    }
}
