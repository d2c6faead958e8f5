use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::app::ports::{
    CaseRepository, ConfigRepository, ContactRepository, LocationRepository, MergeSnapshot, RepoResult,
    RepositoryError, SnapshotSource, UserRepository,
};
use crate::domain::{
    Address, AgencyId, CaseContact, CaseId, CaseRecord, ConfiguredViolation, ContactType, CustomFieldDefinition,
    LocationCustomFieldValues, LocationSnapshot, Signature, UserId, UserProfile, ViolationId,
};

/// Everything the in-memory store serves, in the shape of a JSON fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeFixture {
    #[serde(default)]
    pub cases: Vec<CaseRecord>,
    #[serde(default)]
    pub users: Vec<FixtureUser>,
    #[serde(default)]
    pub locations: Vec<FixtureLocation>,
    #[serde(default)]
    pub contacts: Vec<FixtureContact>,
    #[serde(default)]
    pub location_fields: Vec<FixtureFieldDefinition>,
    #[serde(default)]
    pub contact_fields: Vec<FixtureContactFieldDefinition>,
    #[serde(default)]
    pub violations: Vec<FixtureViolation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureUser {
    pub agency_id: AgencyId,
    pub user: UserProfile,
    /// Configured violations this user may be assigned cases for.
    #[serde(default)]
    pub assignable_violation_ids: Vec<ViolationId>,
    #[serde(default)]
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureLocation {
    pub agency_id: AgencyId,
    pub case_id: CaseId,
    pub address: Address,
    #[serde(default)]
    pub flag_history: Vec<FlagHistoryEntry>,
    #[serde(default)]
    pub custom_field_values: LocationCustomFieldValues,
    #[serde(default)]
    pub apn: Option<String>,
    /// Makes the geodata lookup fail for this case.
    #[serde(default)]
    pub geodata_unavailable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagHistoryEntry {
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureContact {
    pub agency_id: AgencyId,
    pub case_id: CaseId,
    pub contact: CaseContact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureFieldDefinition {
    pub agency_id: AgencyId,
    pub definition: CustomFieldDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureContactFieldDefinition {
    pub agency_id: AgencyId,
    pub contact_type: ContactType,
    pub definition: CustomFieldDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureViolation {
    pub agency_id: AgencyId,
    pub violation: ConfiguredViolation,
}

/// In-memory data store for development/testing.
///
/// Snapshots copy the data at open time, so writes made afterwards are not
/// seen by a resolution already in flight.
pub struct InMemoryStore {
    data: Arc<RwLock<MergeFixture>>,
    unavailable: Arc<AtomicBool>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(MergeFixture::default())
    }
}

impl InMemoryStore {
    pub fn new(fixture: MergeFixture) -> Self {
        Self {
            data: Arc::new(RwLock::new(fixture)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read fixture '{}': {}", path.display(), e))?;
        let fixture: MergeFixture = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse fixture '{}': {}", path.display(), e))?;
        Ok(Self::new(fixture))
    }

    /// Applies `f` to the stored data.
    pub fn update<F: FnOnce(&mut MergeFixture)>(&self, f: F) -> RepoResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))?;
        f(&mut *data);
        Ok(())
    }

    /// Simulates a data store outage: every read fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn view(&self) -> RepoResult<Arc<StoreView>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("in-memory store offline".to_string()));
        }
        let data = self
            .data
            .read()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))?;
        Ok(Arc::new(StoreView {
            data: data.clone(),
            unavailable: self.unavailable.clone(),
        }))
    }
}

#[async_trait]
impl SnapshotSource for InMemoryStore {
    async fn open_snapshot(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<MergeSnapshot> {
        let view = self.view()?;
        debug!("Opened in-memory snapshot for agency {} case {}", agency_id, case_id);
        Ok(MergeSnapshot {
            cases: view.clone(),
            users: view.clone(),
            locations: view.clone(),
            contacts: view.clone(),
            config: view,
        })
    }
}

/// Frozen copy of the store backing one snapshot.
struct StoreView {
    data: MergeFixture,
    unavailable: Arc<AtomicBool>,
}

impl StoreView {
    fn check(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("in-memory store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn location(&self, agency_id: AgencyId, case_id: CaseId) -> Option<&FixtureLocation> {
        self.data
            .locations
            .iter()
            .find(|l| l.agency_id == agency_id && l.case_id == case_id)
    }

    fn user(&self, agency_id: AgencyId, user_id: UserId) -> Option<&FixtureUser> {
        self.data
            .users
            .iter()
            .find(|u| u.agency_id == agency_id && u.user.id == user_id)
    }
}

#[async_trait]
impl CaseRepository for StoreView {
    async fn find_case(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<CaseRecord>> {
        self.check()?;
        Ok(self
            .data
            .cases
            .iter()
            .find(|c| c.agency_id == agency_id && c.id == case_id)
            .cloned())
    }
}

#[async_trait]
impl UserRepository for StoreView {
    async fn find_user(&self, agency_id: AgencyId, user_id: UserId) -> RepoResult<Option<UserProfile>> {
        self.check()?;
        Ok(self.user(agency_id, user_id).map(|u| u.user.clone()))
    }

    async fn eligible_assignees(
        &self,
        agency_id: AgencyId,
        violation_ids: &[ViolationId],
    ) -> RepoResult<Vec<UserProfile>> {
        self.check()?;
        Ok(self
            .data
            .users
            .iter()
            .filter(|u| u.agency_id == agency_id)
            .filter(|u| {
                violation_ids.is_empty()
                    || violation_ids.iter().any(|id| u.assignable_violation_ids.contains(id))
            })
            .map(|u| u.user.clone())
            .collect())
    }

    async fn signature(&self, agency_id: AgencyId, user_id: UserId) -> RepoResult<Option<Signature>> {
        self.check()?;
        Ok(self.user(agency_id, user_id).and_then(|u| u.signature.clone()))
    }
}

#[async_trait]
impl LocationRepository for StoreView {
    async fn find_location(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<LocationSnapshot>> {
        self.check()?;
        Ok(self.location(agency_id, case_id).map(|l| l.address.clone()))
    }

    async fn latest_flag_reason(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<String>> {
        self.check()?;
        Ok(self
            .location(agency_id, case_id)
            .and_then(|l| l.flag_history.iter().max_by_key(|e| e.flagged_at))
            .map(|e| e.reason.clone()))
    }

    async fn custom_field_values(
        &self,
        agency_id: AgencyId,
        case_id: CaseId,
    ) -> RepoResult<LocationCustomFieldValues> {
        self.check()?;
        Ok(self
            .location(agency_id, case_id)
            .map(|l| l.custom_field_values.clone())
            .unwrap_or_default())
    }

    async fn parcel_apn(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Option<String>> {
        self.check()?;
        match self.location(agency_id, case_id) {
            Some(l) if l.geodata_unavailable => Err(RepositoryError::Geodata(format!(
                "parcel lookup timed out for case {}",
                case_id
            ))),
            Some(l) => Ok(l.apn.clone()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ContactRepository for StoreView {
    async fn case_contacts(&self, agency_id: AgencyId, case_id: CaseId) -> RepoResult<Vec<CaseContact>> {
        self.check()?;
        let mut contacts: Vec<CaseContact> = self
            .data
            .contacts
            .iter()
            .filter(|c| c.agency_id == agency_id && c.case_id == case_id)
            .map(|c| c.contact.clone())
            .collect();
        contacts.sort_by_key(|c| c.contact_id);
        Ok(contacts)
    }
}

#[async_trait]
impl ConfigRepository for StoreView {
    async fn location_field_definitions(&self, agency_id: AgencyId) -> RepoResult<Vec<CustomFieldDefinition>> {
        self.check()?;
        Ok(self
            .data
            .location_fields
            .iter()
            .filter(|f| f.agency_id == agency_id)
            .map(|f| f.definition.clone())
            .collect())
    }

    async fn contact_field_definitions(
        &self,
        agency_id: AgencyId,
        contact_type: ContactType,
    ) -> RepoResult<Vec<CustomFieldDefinition>> {
        self.check()?;
        Ok(self
            .data
            .contact_fields
            .iter()
            .filter(|f| f.agency_id == agency_id && f.contact_type == contact_type)
            .map(|f| f.definition.clone())
            .collect())
    }

    async fn configured_violations(
        &self,
        agency_id: AgencyId,
        ids: &[ViolationId],
    ) -> RepoResult<Vec<ConfiguredViolation>> {
        self.check()?;
        // Keep the caller's id order
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.data
                    .violations
                    .iter()
                    .find(|v| v.agency_id == agency_id && v.violation.id == *id)
                    .map(|v| v.violation.clone())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture() -> MergeFixture {
        MergeFixture {
            cases: vec![CaseRecord {
                id: 10,
                agency_id: 1,
                case_number: "CE-10".to_string(),
                issue_description: None,
                created_at: Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap(),
                closed_at: None,
                config_violation_ids: vec![],
            }],
            locations: vec![FixtureLocation {
                agency_id: 1,
                case_id: 10,
                address: Address::default(),
                flag_history: vec![
                    FlagHistoryEntry {
                        reason: "Vacant".to_string(),
                        flagged_at: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
                    },
                    FlagHistoryEntry {
                        reason: "Dangerous dog".to_string(),
                        flagged_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
                    },
                ],
                custom_field_values: LocationCustomFieldValues::default(),
                apn: Some("123-456-789".to_string()),
                geodata_unavailable: false,
            }],
            ..MergeFixture::default()
        }
    }

    #[tokio::test]
    async fn test_cases_are_scoped_to_agency() {
        let store = InMemoryStore::new(fixture());
        let snapshot = store.open_snapshot(1, 10).await.unwrap();
        assert!(snapshot.cases.find_case(1, 10).await.unwrap().is_some());
        assert!(snapshot.cases.find_case(2, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_flag_reason_is_most_recent() {
        let store = InMemoryStore::new(fixture());
        let snapshot = store.open_snapshot(1, 10).await.unwrap();
        let reason = snapshot.locations.latest_flag_reason(1, 10).await.unwrap();
        assert_eq!(reason.as_deref(), Some("Dangerous dog"));
    }

    #[tokio::test]
    async fn test_snapshot_does_not_see_later_writes() {
        let store = InMemoryStore::new(fixture());
        let snapshot = store.open_snapshot(1, 10).await.unwrap();

        store
            .update(|data| data.cases[0].case_number = "CE-10-AMENDED".to_string())
            .unwrap();

        let seen = snapshot.cases.find_case(1, 10).await.unwrap().unwrap();
        assert_eq!(seen.case_number, "CE-10");

        let fresh = store.open_snapshot(1, 10).await.unwrap();
        let seen = fresh.cases.find_case(1, 10).await.unwrap().unwrap();
        assert_eq!(seen.case_number, "CE-10-AMENDED");
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_reads() {
        let store = InMemoryStore::new(fixture());
        store.set_unavailable(true);
        assert!(store.open_snapshot(1, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_fixture_loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, serde_json::to_string(&fixture()).unwrap()).unwrap();

        let store = InMemoryStore::from_json_file(&path).unwrap();
        let snapshot = store.open_snapshot(1, 10).await.unwrap();
        assert_eq!(snapshot.locations.parcel_apn(1, 10).await.unwrap().as_deref(), Some("123-456-789"));
    }
}
