use serde::{Deserialize, Serialize};
use std::fmt;

/// Categories of single-value merge fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldCategory {
    #[serde(rename = "Case Information")]
    CaseInformation,
    #[serde(rename = "Location")]
    Location,
    /// Personalized per recipient contact.
    #[serde(rename = "Recipient")]
    Recipient,
}

/// Categories of merge tables, whose values are HTML fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableCategory {
    #[serde(rename = "Contact")]
    Contact,
    #[serde(rename = "Location")]
    Location,
    #[serde(rename = "Municipal Code")]
    MunicipalCode,
}

/// Every category a template can reference. Adding one means adding a
/// resolver arm in the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MergeCategory {
    Field(FieldCategory),
    Table(TableCategory),
}

impl MergeCategory {
    pub const ALL: [MergeCategory; 6] = [
        MergeCategory::Field(FieldCategory::CaseInformation),
        MergeCategory::Field(FieldCategory::Location),
        MergeCategory::Field(FieldCategory::Recipient),
        MergeCategory::Table(TableCategory::Contact),
        MergeCategory::Table(TableCategory::Location),
        MergeCategory::Table(TableCategory::MunicipalCode),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MergeCategory::Field(FieldCategory::CaseInformation) => "case_information",
            MergeCategory::Field(FieldCategory::Location) => "location_fields",
            MergeCategory::Field(FieldCategory::Recipient) => "recipient_fields",
            MergeCategory::Table(TableCategory::Contact) => "contact_tables",
            MergeCategory::Table(TableCategory::Location) => "location_tables",
            MergeCategory::Table(TableCategory::MunicipalCode) => "municipal_code_tables",
        }
    }

    /// Resolved once per recipient rather than once per notice.
    pub fn is_personalized(&self) -> bool {
        matches!(self, MergeCategory::Field(FieldCategory::Recipient))
    }
}

impl fmt::Display for MergeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<FieldCategory> for MergeCategory {
    fn from(c: FieldCategory) -> Self {
        MergeCategory::Field(c)
    }
}

impl From<TableCategory> for MergeCategory {
    fn from(c: TableCategory) -> Self {
        MergeCategory::Table(c)
    }
}
