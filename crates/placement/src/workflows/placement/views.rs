use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Internship, InternshipId, InternshipLevel,
    InternshipStatus, RepresentativeId, StudentId,
};
use super::service::{AcceptedOffer, PlacementError, ResultCode};

/// Sanitized representation of an application for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    pub withdrawal_requested: bool,
}

impl From<&Application> for ApplicationView {
    fn from(application: &Application) -> Self {
        Self {
            application_id: application.id,
            student_id: application.student_id.clone(),
            internship_id: application.internship_id,
            status: application.status(),
            status_label: application.status().label(),
            withdrawal_requested: application.withdrawal_requested(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InternshipView {
    pub internship_id: InternshipId,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub owner_id: RepresentativeId,
    pub level: InternshipLevel,
    pub preferred_major: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_date: Option<NaiveDate>,
    pub status: InternshipStatus,
    pub status_label: &'static str,
    pub visible: bool,
    pub slots: u8,
    pub confirmed_offers: u8,
    pub available_slots: u8,
}

impl From<&Internship> for InternshipView {
    fn from(internship: &Internship) -> Self {
        Self {
            internship_id: internship.id,
            title: internship.title.clone(),
            description: internship.description.clone(),
            company_name: internship.company_name.clone(),
            owner_id: internship.owner_id.clone(),
            level: internship.level,
            preferred_major: internship.preferred_major.clone(),
            opening_date: internship.opening_date,
            closing_date: internship.closing_date,
            status: internship.status(),
            status_label: internship.status().label(),
            visible: internship.visible(),
            slots: internship.slots(),
            confirmed_offers: internship.confirmed_offers(),
            available_slots: internship.available_slots(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedOfferView {
    pub application: ApplicationView,
    pub internship: InternshipView,
    pub withdrawn: Vec<ApplicationView>,
}

impl From<&AcceptedOffer> for AcceptedOfferView {
    fn from(accepted: &AcceptedOffer) -> Self {
        Self {
            application: ApplicationView::from(&accepted.application),
            internship: InternshipView::from(&accepted.internship),
            withdrawn: accepted.withdrawn.iter().map(ApplicationView::from).collect(),
        }
    }
}

/// Success flag plus result code, returned by every engine entry point
/// exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome<T> {
    pub success: bool,
    pub code: ResultCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> OperationOutcome<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            code: ResultCode::Ok,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(error: &PlacementError) -> Self {
        Self {
            success: false,
            code: error.code(),
            message: error.to_string(),
            data: None,
        }
    }
}
