use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Internship, InternshipLevel, InternshipStatus};

/// Optional criteria for narrowing internship listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternshipFilter {
    pub status: Option<InternshipStatus>,
    pub level: Option<InternshipLevel>,
    pub preferred_major: Option<String>,
    pub company_name: Option<String>,
    /// Postings that close on or before this date; open-ended postings never match.
    pub closing_before: Option<NaiveDate>,
    pub visible: Option<bool>,
}

impl InternshipFilter {
    pub fn matches(&self, internship: &Internship) -> bool {
        self.status.map_or(true, |status| internship.status() == status)
            && self.level.map_or(true, |level| internship.level == level)
            && self.preferred_major.as_deref().map_or(true, |major| {
                internship.preferred_major.eq_ignore_ascii_case(major)
            })
            && self.company_name.as_deref().map_or(true, |company| {
                internship.company_name.eq_ignore_ascii_case(company)
            })
            && self.closing_before.map_or(true, |date| {
                internship
                    .closing_date
                    .map_or(false, |closing| closing <= date)
            })
            && self.visible.map_or(true, |visible| internship.visible() == visible)
    }

    /// Keep matching postings, ordered by title ignoring case.
    pub fn apply(&self, internships: Vec<Internship>) -> Vec<Internship> {
        let mut matched: Vec<Internship> = internships
            .into_iter()
            .filter(|internship| self.matches(internship))
            .collect();
        matched.sort_by_cached_key(|internship| (internship.title.to_lowercase(), internship.id));
        matched
    }
}
