use std::{convert::TryFrom, fmt};

use serde::{Deserialize, Serialize};

use crate::spice_errors::SpiceError;

/// Kind of element stored in a [`Cell`](crate::cell::Cell) or described by an
/// EK attribute descriptor.
///
/// The discriminants are the codes of CSPICE's `_SpiceDataType` enumeration
/// (`SpiceZdf.h`) and cross the native boundary as plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum TypeTag {
    Character = 0,
    DoublePrecision = 1,
    Integer = 2,
    Time = 3,
    Boolean = 4,
}

impl TypeTag {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl Default for TypeTag {
    fn default() -> Self {
        TypeTag::Character
    }
}

impl From<TypeTag> for i32 {
    fn from(tag: TypeTag) -> Self {
        tag as i32
    }
}

impl TryFrom<i32> for TypeTag {
    type Error = SpiceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        use TypeTag::*;
        match value {
            0 => Ok(Character),
            1 => Ok(DoublePrecision),
            2 => Ok(Integer),
            3 => Ok(Time),
            4 => Ok(Boolean),
            _ => Err(SpiceError::InvalidType(value)),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeTag::Character => "CHR",
            TypeTag::DoublePrecision => "DP",
            TypeTag::Integer => "INT",
            TypeTag::Time => "TIME",
            TypeTag::Boolean => "BOOL",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod test_type_tag {
    use super::*;

    #[test]
    fn test_from() {
        assert_eq!(TypeTag::try_from(0), Ok(TypeTag::Character));
        assert_eq!(TypeTag::try_from(1), Ok(TypeTag::DoublePrecision));
        assert_eq!(TypeTag::try_from(2), Ok(TypeTag::Integer));
        assert_eq!(TypeTag::try_from(3), Ok(TypeTag::Time));
        assert_eq!(TypeTag::try_from(4), Ok(TypeTag::Boolean));
        assert_eq!(TypeTag::try_from(5), Err(SpiceError::InvalidType(5)));
        assert_eq!(TypeTag::try_from(-1), Err(SpiceError::InvalidType(-1)));
    }

    #[test]
    fn test_native_codes() {
        assert_eq!(i32::from(TypeTag::Character), 0);
        assert_eq!(i32::from(TypeTag::DoublePrecision), 1);
        assert_eq!(i32::from(TypeTag::Integer), 2);
        assert_eq!(TypeTag::Time.code(), 3);
        assert_eq!(TypeTag::Boolean.code(), 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeTag::Character.to_string(), "CHR");
        assert_eq!(TypeTag::DoublePrecision.to_string(), "DP");
        assert_eq!(TypeTag::Boolean.to_string(), "BOOL");
    }
}
