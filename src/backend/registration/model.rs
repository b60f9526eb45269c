/**
 * Registration Model
 *
 * Database rows for member profiles and their documents, and the
 * completeness rules that decide whether a profile can be submitted.
 */

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::profile::{
    qualify, required_documents, EquipmentDetails, PersonalDetails, ProfessionalDetails,
};
use crate::shared::{DocumentKind, ProfileStatus, RegistrationTab, TabForm};

/// Raw `gis_profiles` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub status: String,
    pub personal: Option<Json<PersonalDetails>>,
    pub professional: Option<Json<ProfessionalDetails>>,
    pub equipment: Option<Json<EquipmentDetails>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A member profile with decoded tabs
#[derive(Debug, Clone)]
pub struct GisProfile {
    pub user_id: Uuid,
    pub status: ProfileStatus,
    pub personal: PersonalDetails,
    pub professional: ProfessionalDetails,
    pub equipment: EquipmentDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileRow> for GisProfile {
    type Error = BackendError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let status = ProfileStatus::from_str(&row.status).ok_or_else(|| {
            BackendError::state(format!("Unknown profile status '{}'", row.status))
        })?;
        Ok(Self {
            user_id: row.user_id,
            status,
            personal: row.personal.map(|j| j.0).unwrap_or_default(),
            professional: row.professional.map(|j| j.0).unwrap_or_default(),
            equipment: row.equipment.map(|j| j.0).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            submitted_at: row.submitted_at,
        })
    }
}

/// Raw `registration_documents` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub original_name: String,
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn document_kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_str(&self.kind)
    }
}

/// A document received in an upload, stored on disk but not yet recorded
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub original_name: String,
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl GisProfile {
    /// Required documents not uploaded yet
    pub fn missing_documents(&self, documents: &[DocumentRecord]) -> Vec<DocumentKind> {
        required_documents(Some(&self.professional), Some(&self.equipment))
            .into_iter()
            .filter(|kind| !documents.iter().any(|d| d.document_kind() == Some(*kind)))
            .collect()
    }

    /// Missing fields of one tab, qualified with the tab name
    pub fn missing_in_tab(&self, tab: RegistrationTab, documents: &[DocumentRecord]) -> Vec<String> {
        match tab {
            RegistrationTab::Personal => qualify(tab, &self.personal.missing_fields()),
            RegistrationTab::Professional => qualify(tab, &self.professional.missing_fields()),
            RegistrationTab::Equipment => qualify(tab, &self.equipment.missing_fields()),
            RegistrationTab::Documents => {
                let kinds: Vec<&str> = self
                    .missing_documents(documents)
                    .iter()
                    .map(DocumentKind::as_str)
                    .collect();
                qualify(tab, &kinds)
            }
        }
    }

    /// Everything still missing across all tabs, in form order
    pub fn missing_for_submission(&self, documents: &[DocumentRecord]) -> Vec<String> {
        RegistrationTab::ALL
            .iter()
            .flat_map(|tab| self.missing_in_tab(*tab, documents))
            .collect()
    }

    pub fn progress(&self, documents: &[DocumentRecord]) -> ProfileProgress {
        let mut missing = BTreeMap::new();
        let mut completed_tabs = Vec::new();
        for tab in RegistrationTab::ALL {
            let fields = self.missing_in_tab(tab, documents);
            if fields.is_empty() {
                completed_tabs.push(tab);
            }
            missing.insert(tab.as_str().to_string(), fields);
        }
        ProfileProgress { missing, completed_tabs }
    }
}

/// Per-tab completion state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileProgress {
    /// Missing fields keyed by tab name
    pub missing: BTreeMap<String, Vec<String>>,
    pub completed_tabs: Vec<RegistrationTab>,
}

/// A stored document as shown to its owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentResponse {
    pub kind: DocumentKind,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn from_record(record: &DocumentRecord) -> Option<Self> {
        Some(Self {
            kind: record.document_kind()?,
            original_name: record.original_name.clone(),
            content_type: record.content_type.clone(),
            size_bytes: record.size_bytes.max(0) as u64,
            uploaded_at: record.uploaded_at,
        })
    }
}

/// Body of `GET /api/gis/registration`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub status: ProfileStatus,
    pub personal: PersonalDetails,
    pub professional: ProfessionalDetails,
    pub equipment: EquipmentDetails,
    pub documents: Vec<DocumentResponse>,
    #[serde(flatten)]
    pub progress: ProfileProgress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl RegistrationResponse {
    pub fn new(profile: GisProfile, documents: &[DocumentRecord]) -> Self {
        let progress = profile.progress(documents);
        Self {
            status: profile.status,
            personal: profile.personal,
            professional: profile.professional,
            equipment: profile.equipment,
            documents: documents.iter().filter_map(DocumentResponse::from_record).collect(),
            progress,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            submitted_at: profile.submitted_at,
        }
    }
}
