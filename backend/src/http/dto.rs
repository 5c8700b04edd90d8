//! Data Transfer Objects for the HTTP API.
//!
//! Domain types already derive Serialize/Deserialize and are returned as-is;
//! the types here are request bodies, query strings and list envelopes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::models::{
    DateGroup, DateGroupTimes, DateRange, Registration, RegistrationFilter, RegistrationId,
    RegistrationStatus, SessionKey, SessionPeriod,
};
use crate::scheduling::{ArchiveSelection, BulkAssignOutcome, CanonicalDelta};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub repository: String,
}

/// Query string for `GET /v1/sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionListQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl SessionListQuery {
    pub fn range(&self) -> Option<DateRange> {
        if self.start.is_none() && self.end.is_none() {
            None
        } else {
            Some(DateRange::new(self.start, self.end))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub date_groups: Vec<DateGroup>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDateGroupRequest {
    pub date: NaiveDate,
    /// Defaults to the configured `default_capacity`
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub times: Option<DateGroupTimes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCapacityRequest {
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCodeRequest {
    pub exam_ref: String,
}

/// An explicit `(date, period)` target in a request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetDto {
    pub date: NaiveDate,
    pub period: SessionPeriod,
}

impl From<TargetDto> for SessionKey {
    fn from(t: TargetDto) -> Self {
        SessionKey::new(t.date, t.period)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForceCloseRequest {
    #[serde(default)]
    pub reschedule_target: Option<TargetDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub to_period: SessionPeriod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub examinee_ref: String,
    pub registration_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignRequest {
    pub ids: Vec<RegistrationId>,
    pub date: NaiveDate,
    pub period: SessionPeriod,
}

/// Body of `POST /v1/registrations/archive`. No ids (or `all: true`)
/// archives every eligible registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveRequest {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub ids: Option<Vec<RegistrationId>>,
}

impl ArchiveRequest {
    pub fn selection(self) -> Result<ArchiveSelection, String> {
        match (self.all, self.ids) {
            (true, Some(_)) => Err("give either `all` or `ids`, not both".to_string()),
            (_, None) => Ok(ArchiveSelection::AllEligible),
            (false, Some(ids)) => Ok(ArchiveSelection::Ids(ids)),
        }
    }
}

/// Query string for `GET /v1/registrations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationListQuery {
    /// Accepts the legacy `finished` alias
    pub status: Option<String>,
    pub assigned_date: Option<NaiveDate>,
    #[serde(default)]
    pub include_archived: bool,
}

impl RegistrationListQuery {
    pub fn filter(&self) -> Result<RegistrationFilter, String> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<RegistrationStatus>)
            .transpose()?;
        Ok(RegistrationFilter {
            status,
            assigned_date: self.assigned_date,
            include_archived: self.include_archived,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationListResponse {
    pub registrations: Vec<Registration>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignItemDto {
    pub id: RegistrationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<Registration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignResponse {
    pub target: SessionKey,
    pub assigned: usize,
    pub failed: usize,
    pub items: Vec<BulkAssignItemDto>,
    pub delta: CanonicalDelta,
}

impl From<BulkAssignOutcome> for BulkAssignResponse {
    fn from(outcome: BulkAssignOutcome) -> Self {
        let assigned = outcome.assigned_count();
        let failed = outcome.failed_count();
        let items = outcome
            .items
            .into_iter()
            .map(|item| match item.result {
                Ok(registration) => BulkAssignItemDto {
                    id: item.id,
                    registration: Some(registration),
                    error: None,
                },
                Err(e) => BulkAssignItemDto {
                    id: item.id,
                    registration: None,
                    error: Some(ApiError::from(&e)),
                },
            })
            .collect();
        Self {
            target: outcome.target,
            assigned,
            failed,
            items,
            delta: outcome.delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_request_selection() {
        assert_eq!(
            ArchiveRequest::default().selection().unwrap(),
            ArchiveSelection::AllEligible
        );
        let ids = ArchiveRequest {
            all: false,
            ids: Some(vec![RegistrationId::new(3)]),
        };
        assert_eq!(
            ids.selection().unwrap(),
            ArchiveSelection::Ids(vec![RegistrationId::new(3)])
        );
        let both = ArchiveRequest {
            all: true,
            ids: Some(vec![]),
        };
        assert!(both.selection().is_err());
    }

    #[test]
    fn test_registration_query_accepts_finished_alias() {
        let query = RegistrationListQuery {
            status: Some("finished".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap().status, Some(RegistrationStatus::Completed));
    }
}
