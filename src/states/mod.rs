//! The canonical US state roster.
//!
//! Map documents may only mark names from this roster as visited. The
//! denominator for visit statistics is the 50 states; DC and the
//! territories are not part of the map.

use serde::Serialize;

/// Number of states on the map.
pub const STATE_COUNT: usize = 50;

/// The 50 state names, exactly as they appear in the GeoJSON boundary
/// data (`feature.properties.name`).
pub const US_STATES: [&str; STATE_COUNT] = [
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

/// Whether `name` is one of the 50 canonical state names. Matching is
/// exact; the boundary data and the roster agree on spelling and casing.
pub fn is_state(name: &str) -> bool {
    US_STATES.contains(&name)
}

/// Visit statistics as shown on the shared map view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisitStats {
    /// Number of visited states.
    pub visited: usize,
    /// Visited share of the 50 states, rounded to a whole percent.
    pub percentage: u32,
}

/// Compute stats for a visited-state count.
pub fn visit_stats(visited: usize) -> VisitStats {
    let percentage = ((visited as f64 / STATE_COUNT as f64) * 100.0).round() as u32;
    VisitStats {
        visited,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_has_fifty_states() {
        assert_eq!(US_STATES.len(), STATE_COUNT);

        // No duplicates
        let mut sorted: Vec<&str> = US_STATES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), STATE_COUNT);
    }

    #[test]
    fn test_is_state() {
        assert!(is_state("California"));
        assert!(is_state("New Hampshire"));
        assert!(!is_state("california"));
        assert!(!is_state("Puerto Rico"));
        assert!(!is_state("District of Columbia"));
        assert!(!is_state(""));
    }

    #[test]
    fn test_visit_stats_rounding() {
        assert_eq!(visit_stats(0).percentage, 0);
        assert_eq!(visit_stats(1).percentage, 2);
        assert_eq!(visit_stats(25).percentage, 50);
        // 17/50 = 34%
        assert_eq!(visit_stats(17).percentage, 34);
        assert_eq!(visit_stats(50).percentage, 100);
    }
}
