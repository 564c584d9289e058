//! Type-safe 3-vector argument for pose options.
//!
//! Provides a clap-compatible type for command-line `x,y,z` arguments with
//! automatic parsing, validation, and display formatting.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse a comma-separated triple of finite floats.
///
/// # Format
/// Input format: "x,y,z" (whitespace around components is ignored)
///
/// # Returns
/// * `Ok((f64, f64, f64))` - Parsed components
/// * `Err(String)` - Validation error naming the offending component
///
/// # Examples
/// Valid: "10,0,0", "0.5, -1.25, 3e2"
///
/// Invalid:
/// - "1,2" - Missing component
/// - "1,2,abc" - Non-numeric component
/// - "1,inf,0" - Non-finite component
pub fn parse_vec3(s: &str) -> Result<(f64, f64, f64), String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("Vector must be in format 'x,y,z', got '{s}'"));
    }

    let mut values = [0.0; 3];
    for (value, (part, axis)) in values.iter_mut().zip(parts.iter().zip(["x", "y", "z"])) {
        let parsed = part
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid {axis} value '{}'", part.trim()))?;
        if !parsed.is_finite() {
            return Err(format!("Non-finite {axis} value '{}'", part.trim()));
        }
        *value = parsed;
    }

    Ok((values[0], values[1], values[2]))
}

/// Command-line 3-vector (position, offset, or XYZ Euler radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3Arg(pub f64, pub f64, pub f64);

impl Vec3Arg {
    /// Same value on all three components
    pub fn splat(v: f64) -> Self {
        Vec3Arg(v, v, v)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.0, self.1, self.2)
    }
}

impl FromStr for Vec3Arg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y, z) = parse_vec3(s)?;
        Ok(Vec3Arg(x, y, z))
    }
}

impl fmt::Display for Vec3Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0, self.1, self.2)
    }
}

impl From<Vec3Arg> for Vector3<f64> {
    fn from(arg: Vec3Arg) -> Self {
        arg.to_vector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_parsing() {
        assert_eq!(parse_vec3("10,0,0").unwrap(), (10.0, 0.0, 0.0));
        assert_eq!(parse_vec3(" 0.5, -1.25 ,3e2").unwrap(), (0.5, -1.25, 300.0));

        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,2,3,4").is_err());
        assert!(parse_vec3("1,2,abc").unwrap_err().contains("Invalid z value"));
        assert!(parse_vec3("1,inf,0").unwrap_err().contains("Non-finite y"));
    }

    #[test]
    fn test_vec3_arg_roundtrip_display() {
        let arg: Vec3Arg = "1.5,2,-3".parse().unwrap();
        assert_eq!(arg, Vec3Arg(1.5, 2.0, -3.0));
        assert_eq!(arg.to_string(), "1.5,2,-3");
        assert_eq!(arg.to_vector(), Vector3::new(1.5, 2.0, -3.0));
    }

    #[test]
    fn test_splat() {
        assert_eq!(Vec3Arg::splat(25.0), Vec3Arg(25.0, 25.0, 25.0));
    }
}
