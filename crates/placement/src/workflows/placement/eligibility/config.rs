use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ACTIVE_APPLICATIONS: usize = 3;
pub const DEFAULT_MAX_INTERNSHIPS_PER_REPRESENTATIVE: usize = 5;
pub const DEFAULT_BASIC_ONLY_THROUGH_YEAR: u8 = 2;

/// Tunable limits applied when students apply and representatives author postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementPolicy {
    pub max_active_applications: usize,
    pub max_internships_per_representative: usize,
    /// Students at or below this year of study may only apply to Basic postings.
    pub basic_only_through_year: u8,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            max_active_applications: DEFAULT_MAX_ACTIVE_APPLICATIONS,
            max_internships_per_representative: DEFAULT_MAX_INTERNSHIPS_PER_REPRESENTATIVE,
            basic_only_through_year: DEFAULT_BASIC_ONLY_THROUGH_YEAR,
        }
    }
}
