use serde::Serialize;
use std::fmt;

/// Coarse crowding label for a predicted hourly ridership.
///
/// | Ridership   | Level  |
/// |-------------|--------|
/// | > 2000      | High   |
/// | > 500       | Medium |
/// | otherwise   | Low    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrowdLevel {
    Low,
    Medium,
    High,
}

pub fn crowd_level(ridership: f64) -> CrowdLevel {
    match ridership {
        r if r > 2000.0 => CrowdLevel::High,
        r if r > 500.0 => CrowdLevel::Medium,
        _ => CrowdLevel::Low,
    }
}

impl fmt::Display for CrowdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrowdLevel::Low => "Low",
            CrowdLevel::Medium => "Medium",
            CrowdLevel::High => "High",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crowd_level_boundaries() {
        assert_eq!(crowd_level(2500.0), CrowdLevel::High);
        assert_eq!(crowd_level(2000.0), CrowdLevel::Medium);
        assert_eq!(crowd_level(501.0), CrowdLevel::Medium);
        assert_eq!(crowd_level(500.0), CrowdLevel::Low);
        assert_eq!(crowd_level(0.0), CrowdLevel::Low);
        assert_eq!(CrowdLevel::High.to_string(), "High");
    }
}
