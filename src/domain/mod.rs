use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod template;

pub use template::{NoticeTemplate, TemplateSection};

pub type AgencyId = i64;
pub type CaseId = i64;
pub type ContactId = i64;
pub type FieldId = i64;
pub type UserId = i64;
pub type ViolationId = i64;

/// Per-request selections made by the user generating a notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeContext {
    pub agency_id: AgencyId,
    pub case_id: CaseId,
    #[serde(default)]
    pub recipient_contact_ids: Vec<ContactId>,
    #[serde(default)]
    pub responsible_contact_id: Option<ContactId>,
    #[serde(default)]
    pub open_violation_refs: Vec<OpenViolationRef>,
    #[serde(default)]
    pub resolution_actions: Vec<ResolutionAction>,
    #[serde(default)]
    pub next_inspection: Option<NextInspection>,
    #[serde(default)]
    pub case_assignee_id: Option<UserId>,
}

impl MergeContext {
    pub fn new(agency_id: AgencyId, case_id: CaseId) -> Self {
        Self {
            agency_id,
            case_id,
            recipient_contact_ids: Vec::new(),
            responsible_contact_id: None,
            open_violation_refs: Vec::new(),
            resolution_actions: Vec::new(),
            next_inspection: None,
            case_assignee_id: None,
        }
    }

    /// Configured-violation ids in first-seen order, without repeats.
    pub fn unique_violation_ids(&self) -> Vec<ViolationId> {
        let mut ids: Vec<ViolationId> = Vec::new();
        for r in &self.open_violation_refs {
            if !ids.contains(&r.config_violation_id) {
                ids.push(r.config_violation_id);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenViolationRef {
    pub config_violation_id: ViolationId,
    #[serde(default)]
    pub entity: String,
}

/// A corrective action selected for a municipal code article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionAction {
    pub article_number: String,
    #[serde(default)]
    pub comply_by_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NextInspection {
    pub planned_date: NaiveDate,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
}

/// An agency staff member: the acting user, a case assignee or an inspector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    pub fn first_last(&self) -> String {
        join_name(&self.first_name, &self.last_name, " ")
    }

    pub fn last_first(&self) -> String {
        join_name(&self.last_name, &self.first_name, ", ")
    }
}

fn join_name(a: &str, b: &str, sep: &str) -> String {
    match (a.trim(), b.trim()) {
        ("", b) => b.to_string(),
        (a, "") => a.to_string(),
        (a, b) => format!("{}{}{}", a, sep, b),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub block_text: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: CaseId,
    pub agency_id: AgencyId,
    pub case_number: String,
    #[serde(default)]
    pub issue_description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Distinct configured-violation ids recorded on the case.
    #[serde(default)]
    pub config_violation_ids: Vec<ViolationId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

impl Address {
    fn parts(&self) -> impl Iterator<Item = &str> {
        [&self.street, &self.city, &self.state, &self.zip]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// `12B High St, Huang Thai, Kin Toe, 12345`
    pub fn single_line(&self) -> String {
        self.parts().collect::<Vec<_>>().join(", ")
    }

    /// One address part per line, joined with `<br>`.
    pub fn stacked(&self) -> String {
        self.parts().collect::<Vec<_>>().join("<br>")
    }

    pub fn is_empty(&self) -> bool {
        self.parts().next().is_none()
    }
}

/// Location of a case as of the snapshot being resolved.
pub type LocationSnapshot = Address;

/// Custom-field values attached to a case location, split by origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCustomFieldValues {
    /// Agency-entered values.
    #[serde(default)]
    pub manual: BTreeMap<FieldId, String>,
    /// Values synced from GIS parcel data.
    #[serde(default)]
    pub parcel: BTreeMap<FieldId, String>,
}

impl LocationCustomFieldValues {
    pub fn get(&self, field_id: FieldId) -> Option<&str> {
        self.manual
            .get(&field_id)
            .or_else(|| self.parcel.get(&field_id))
            .map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Individual,
    LegalEntity,
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactType::Individual => write!(f, "INDIVIDUAL"),
            ContactType::LegalEntity => write!(f, "LEGAL_ENTITY"),
        }
    }
}

/// A contact as attached to a case, with its role on that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseContact {
    pub contact_id: ContactId,
    pub case_role: String,
    pub contact_type: ContactType,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub work_phone: Option<String>,
    #[serde(default)]
    pub cell_phone: Option<String>,
    #[serde(default)]
    pub mailing_address: Address,
    #[serde(default)]
    pub is_vendor: bool,
    #[serde(default)]
    pub is_billable: bool,
    #[serde(default)]
    pub custom_field_values: BTreeMap<FieldId, String>,
}

impl CaseContact {
    /// Entity name for legal entities, "First Last" for individuals.
    pub fn display_name(&self) -> String {
        let person = || {
            join_name(
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or(""),
                " ",
            )
        };
        match self.contact_type {
            ContactType::LegalEntity => self
                .entity_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(person),
            ContactType::Individual => person(),
        }
    }

    /// Name and mailing address stacked with `<br>`.
    pub fn name_and_address(&self) -> String {
        let name = self.display_name();
        if self.mailing_address.is_empty() {
            name
        } else {
            format!("{}<br>{}", name, self.mailing_address.stacked())
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Text,
    Date,
    Number,
    Picklist,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldDefinition {
    pub id: FieldId,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalCode {
    pub article_number: String,
    pub description: String,
    #[serde(default)]
    pub resolution: String,
}

/// An agency-configured violation type and the code it cites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredViolation {
    pub id: ViolationId,
    pub name: String,
    #[serde(default)]
    pub municipal_code: Option<MunicipalCode>,
}
