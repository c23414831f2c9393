use chrono::NaiveDate;

use super::super::domain::{
    Application, Internship, InternshipDraft, InternshipLevel, StudentProfile, MAX_SLOTS,
};
use super::config::PlacementPolicy;
use super::EligibilityViolation;

pub(crate) fn listing_open(internship: &Internship) -> Result<(), EligibilityViolation> {
    if internship.is_accepting_applications() {
        return Ok(());
    }

    Err(EligibilityViolation::NotAcceptingApplications {
        internship_id: internship.id,
        status: internship.status(),
        visible: internship.visible(),
    })
}

pub(crate) fn has_free_slot(internship: &Internship) -> Result<(), EligibilityViolation> {
    if internship.has_available_slots() {
        return Ok(());
    }

    Err(EligibilityViolation::NoAvailableSlots {
        internship_id: internship.id,
        confirmed: internship.confirmed_offers(),
        slots: internship.slots(),
    })
}

pub(crate) fn within_window(
    internship: &Internship,
    today: NaiveDate,
) -> Result<(), EligibilityViolation> {
    if internship.is_open_on(today) {
        return Ok(());
    }

    Err(EligibilityViolation::OutsideApplicationWindow {
        internship_id: internship.id,
        today,
    })
}

pub(crate) fn level_permitted(
    student: &StudentProfile,
    internship: &Internship,
    policy: &PlacementPolicy,
) -> Result<(), EligibilityViolation> {
    if student.year_of_study > policy.basic_only_through_year
        || internship.level == InternshipLevel::Basic
    {
        return Ok(());
    }

    Err(EligibilityViolation::LevelRestricted {
        year_of_study: student.year_of_study,
        level: internship.level,
    })
}

pub(crate) fn major_matches(
    student: &StudentProfile,
    internship: &Internship,
) -> Result<(), EligibilityViolation> {
    if student
        .major
        .trim()
        .eq_ignore_ascii_case(internship.preferred_major.trim())
    {
        return Ok(());
    }

    Err(EligibilityViolation::MajorMismatch {
        major: student.major.clone(),
        preferred_major: internship.preferred_major.clone(),
    })
}

pub(crate) fn under_active_limit(
    existing: &[Application],
    policy: &PlacementPolicy,
) -> Result<(), EligibilityViolation> {
    let active = existing
        .iter()
        .filter(|application| application.status().is_active())
        .count();
    if active < policy.max_active_applications {
        return Ok(());
    }

    Err(EligibilityViolation::ActiveApplicationLimit {
        active,
        limit: policy.max_active_applications,
    })
}

pub(crate) fn not_duplicate(
    existing: &[Application],
    internship: &Internship,
) -> Result<(), EligibilityViolation> {
    match existing
        .iter()
        .find(|application| {
            application.internship_id == internship.id && application.status().is_open()
        }) {
        Some(application) => Err(EligibilityViolation::DuplicateApplication {
            internship_id: internship.id,
            existing: application.id,
        }),
        None => Ok(()),
    }
}

pub(crate) fn draft_valid(draft: &InternshipDraft) -> Result<(), EligibilityViolation> {
    if draft.title.trim().is_empty() {
        return Err(EligibilityViolation::MissingTitle);
    }

    if draft.slots == 0 || draft.slots > MAX_SLOTS {
        return Err(EligibilityViolation::SlotLimit {
            requested: draft.slots,
            max: MAX_SLOTS,
        });
    }

    if let (Some(opening), Some(closing)) = (draft.opening_date, draft.closing_date) {
        if closing < opening {
            return Err(EligibilityViolation::InvalidDateRange { opening, closing });
        }
    }

    Ok(())
}
