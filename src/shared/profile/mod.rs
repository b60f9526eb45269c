//! GIS Member Profile Types
//!
//! The member registration form is split into tabs. Each tab is saved on its
//! own as a draft, so every tab payload carries only optional fields: a patch
//! sent by the client is merged into the stored payload, and completeness is
//! judged separately from format validation.
//!
//! # Module Structure
//!
//! ```text
//! profile/
//! ├── mod.rs          - TabForm trait, tab and status enums
//! ├── personal.rs     - Personal details tab
//! ├── professional.rs - Organisation and services tab
//! ├── equipment.rs    - Drone fleet and certification tab
//! └── documents.rs    - Document kinds and requirements
//! ```

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Personal details tab
pub mod personal;

/// Professional details tab
pub mod professional;

/// Equipment tab
pub mod equipment;

/// Uploaded documents
pub mod documents;

pub use documents::{required_documents, DocumentKind};
pub use equipment::{DroneCategory, DroneEntry, EquipmentDetails};
pub use personal::PersonalDetails;
pub use professional::{OrganizationType, ProfessionalDetails};

/// A tab of the registration form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationTab {
    Personal,
    Professional,
    Equipment,
    Documents,
}

impl RegistrationTab {
    /// All tabs in form order
    pub const ALL: [RegistrationTab; 4] = [
        RegistrationTab::Personal,
        RegistrationTab::Professional,
        RegistrationTab::Equipment,
        RegistrationTab::Documents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationTab::Personal => "personal",
            RegistrationTab::Professional => "professional",
            RegistrationTab::Equipment => "equipment",
            RegistrationTab::Documents => "documents",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "personal" => Some(RegistrationTab::Personal),
            "professional" => Some(RegistrationTab::Professional),
            "equipment" => Some(RegistrationTab::Equipment),
            "documents" => Some(RegistrationTab::Documents),
            _ => None,
        }
    }
}

/// Lifecycle of a member profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    /// Still being filled in; every tab can be edited
    #[default]
    Draft,
    /// Sent for review; read-only
    Submitted,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Draft => "draft",
            ProfileStatus::Submitted => "submitted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ProfileStatus::Draft),
            "submitted" => Some(ProfileStatus::Submitted),
            _ => None,
        }
    }

    pub fn is_editable(&self) -> bool {
        *self == ProfileStatus::Draft
    }
}

/// Behaviour shared by the JSON-backed form tabs
pub trait TabForm: Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Which tab this payload belongs to
    const TAB: RegistrationTab;

    /// Overwrite stored fields with those present in `patch`
    fn merge(&mut self, patch: Self);

    /// Check the format of every field that is present
    fn validate(&self, today: NaiveDate) -> Result<(), SharedError>;

    /// Required fields that are still absent
    fn missing_fields(&self) -> Vec<&'static str>;

    fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Replace `target` when `patch` carries a value
pub(crate) fn overwrite<T>(target: &mut Option<T>, patch: Option<T>) {
    if patch.is_some() {
        *target = patch;
    }
}

/// Reject a present string that is blank
pub(crate) fn require_not_blank(field: &str, value: &Option<String>) -> Result<(), SharedError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(SharedError::validation(field, "must not be blank"))
        }
        _ => Ok(()),
    }
}

/// Qualify field names with their tab, e.g. `personal.city`
pub fn qualify(tab: RegistrationTab, fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .map(|f| format!("{}.{}", tab.as_str(), f))
        .collect()
}
