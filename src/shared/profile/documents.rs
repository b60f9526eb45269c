//! Document kinds accepted by the documents tab

use serde::{Deserialize, Serialize};

use super::{EquipmentDetails, ProfessionalDetails};

/// Content types accepted for uploaded documents
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    IdProof,
    Photo,
    PilotCertificate,
    CompanyRegistration,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::IdProof,
        DocumentKind::Photo,
        DocumentKind::PilotCertificate,
        DocumentKind::CompanyRegistration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::IdProof => "id_proof",
            DocumentKind::Photo => "photo",
            DocumentKind::PilotCertificate => "pilot_certificate",
            DocumentKind::CompanyRegistration => "company_registration",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "id_proof" => Some(DocumentKind::IdProof),
            "photo" => Some(DocumentKind::Photo),
            "pilot_certificate" => Some(DocumentKind::PilotCertificate),
            "company_registration" => Some(DocumentKind::CompanyRegistration),
            _ => None,
        }
    }

    /// Content types accepted for this kind; the photo must be an image
    pub fn accepts(&self, content_type: &str) -> bool {
        match self {
            DocumentKind::Photo => matches!(content_type, "image/jpeg" | "image/png"),
            _ => ALLOWED_CONTENT_TYPES.contains(&content_type),
        }
    }
}

/// File extension used when storing an upload of the given content type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "application/pdf" => "pdf",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

/// Whether the leading bytes of a file match its declared content type
pub fn signature_matches(content_type: &str, head: &[u8]) -> bool {
    match content_type {
        "application/pdf" => head.starts_with(b"%PDF"),
        "image/png" => head.starts_with(&[0x89, b'P', b'N', b'G']),
        "image/jpeg" => head.starts_with(&[0xFF, 0xD8, 0xFF]),
        _ => false,
    }
}

/// Documents a member has to upload given what they declared elsewhere
pub fn required_documents(
    professional: Option<&ProfessionalDetails>,
    equipment: Option<&EquipmentDetails>,
) -> Vec<DocumentKind> {
    let mut required = vec![DocumentKind::IdProof, DocumentKind::Photo];
    if equipment.is_some_and(EquipmentDetails::declares_pilot_certificate) {
        required.push(DocumentKind::PilotCertificate);
    }
    if professional.is_some_and(ProfessionalDetails::is_company) {
        required.push(DocumentKind::CompanyRegistration);
    }
    required
}
