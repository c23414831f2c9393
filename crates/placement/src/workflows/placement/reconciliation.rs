use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationStatus, Internship, InternshipId, InternshipStatus, StudentId,
};

/// One internship whose stored seat count or status disagreed with its applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAdjustment {
    pub internship_id: InternshipId,
    pub previous_confirmed: u8,
    pub confirmed: u8,
    pub previous_status: InternshipStatus,
    pub status: InternshipStatus,
    /// More acceptances were counted than the posting has slots.
    pub clamped: bool,
}

/// Summary of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub examined: usize,
    pub adjustments: Vec<SlotAdjustment>,
    /// Applications pointing at internships that are not loaded.
    pub orphaned: Vec<Application>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.adjustments.is_empty() && self.orphaned.is_empty()
    }

    pub fn adjusted_ids(&self) -> BTreeSet<InternshipId> {
        self.adjustments
            .iter()
            .map(|adjustment| adjustment.internship_id)
            .collect()
    }
}

/// Statuses that count toward a student's single-engagement check. Unlike
/// [`ApplicationStatus::is_active`], an outstanding offer does not count.
fn counts_as_engagement(status: ApplicationStatus) -> bool {
    matches!(
        status,
        ApplicationStatus::Pending
            | ApplicationStatus::SuccessfulAccepted
            | ApplicationStatus::SuccessfulRejected
    )
}

/// Recompute every internship's confirmed seat count from the loaded
/// applications. An acceptance is only counted when it is the student's
/// sole engagement; internships with no countable acceptance drop to zero.
/// Running the pass twice leaves the second run with nothing to adjust.
pub fn reconcile(
    internships: &mut [Internship],
    applications: &[Application],
) -> ReconciliationReport {
    let mut engagements: HashMap<&StudentId, usize> = HashMap::new();
    for application in applications {
        if counts_as_engagement(application.status()) {
            *engagements.entry(&application.student_id).or_default() += 1;
        }
    }

    let mut confirmed: BTreeMap<InternshipId, usize> = BTreeMap::new();
    for application in applications {
        if application.status() == ApplicationStatus::SuccessfulAccepted
            && engagements.get(&application.student_id).copied() == Some(1)
        {
            *confirmed.entry(application.internship_id).or_default() += 1;
        }
    }

    let known: BTreeSet<InternshipId> =
        internships.iter().map(|internship| internship.id).collect();
    let orphaned: Vec<Application> = applications
        .iter()
        .filter(|application| !known.contains(&application.internship_id))
        .cloned()
        .collect();
    for application in &orphaned {
        warn!(
            application_id = %application.id,
            internship_id = %application.internship_id,
            "application references an unknown internship"
        );
    }

    let mut adjustments = Vec::new();
    for internship in internships.iter_mut() {
        let previous_confirmed = internship.confirmed_offers();
        let previous_status = internship.status();
        let count = confirmed.get(&internship.id).copied().unwrap_or(0);
        let clamped = internship.restore_confirmed_offers(count);

        if clamped {
            warn!(
                internship_id = %internship.id,
                counted = count,
                slots = internship.slots(),
                "accepted applications exceed slots; clamping confirmed offers"
            );
        }

        if internship.confirmed_offers() != previous_confirmed
            || internship.status() != previous_status
        {
            adjustments.push(SlotAdjustment {
                internship_id: internship.id,
                previous_confirmed,
                confirmed: internship.confirmed_offers(),
                previous_status,
                status: internship.status(),
                clamped,
            });
        }
    }

    info!(
        examined = internships.len(),
        adjusted = adjustments.len(),
        orphaned = orphaned.len(),
        "reconciled confirmed offers"
    );

    ReconciliationReport {
        examined: internships.len(),
        adjustments,
        orphaned,
    }
}
