use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{
    AgencyId, CaseContact, CaseId, CaseRecord, ConfiguredViolation, ContactType, CustomFieldDefinition,
    LocationCustomFieldValues, LocationSnapshot, Signature, UserId, UserProfile, ViolationId,
};

/// Failures reported by data-store adapters. Resolvers never inspect these;
/// they become internal errors at the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("geodata lookup failed: {0}")]
    Geodata(String),
}

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

// Case-side ports
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// `None` when the case does not exist under `agency_id`.
    async fn find_case(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<CaseRecord>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, agency_id: AgencyId, user_id: UserId) -> RepoResult<Option<UserProfile>>;

    /// Users allowed to be assigned a case citing any of `violation_ids`.
    async fn eligible_assignees(
        &self,
        agency_id: AgencyId,
        violation_ids: &[ViolationId],
    ) -> RepoResult<Vec<UserProfile>>;

    async fn signature(&self, agency_id: AgencyId, user_id: UserId) -> RepoResult<Option<Signature>>;
}

// Location-side ports
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn find_location(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<LocationSnapshot>>;

    /// Reason recorded on the most recent flag-history entry of the location.
    async fn latest_flag_reason(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<String>>;

    async fn custom_field_values(
        &self,
        agency_id: AgencyId,
        case_id: CaseId,
    ) -> RepoResult<LocationCustomFieldValues>;

    /// Parcel APN from the geodata service.
    async fn parcel_apn(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<String>>;
}

// Contact-side ports
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Contacts currently on the case, ordered by contact id.
    async fn case_contacts(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Vec<CaseContact>>;
}

// Agency configuration ports
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn location_field_definitions(&self, agency_id: AgencyId) -> RepoResult<Vec<CustomFieldDefinition>>;

    async fn contact_field_definitions(
        &self,
        agency_id: AgencyId,
        contact_type: ContactType,
    ) -> RepoResult<Vec<CustomFieldDefinition>>;

    /// Configured violations among `ids`, with their municipal code.
    async fn configured_violations(
        &self,
        agency_id: AgencyId,
        ids: &[ViolationId],
    ) -> RepoResult<Vec<ConfiguredViolation>>;
}

/// Repositories bound to one point-in-time view of a case. Every resolver in
/// a resolution reads through the same snapshot.
#[derive(Clone)]
pub struct MergeSnapshot {
    pub cases: Arc<dyn CaseRepository>,
    pub users: Arc<dyn UserRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub config: Arc<dyn ConfigRepository>,
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn open_snapshot(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<MergeSnapshot>;
}
