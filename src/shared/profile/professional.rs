//! Professional details tab

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{overwrite, require_not_blank, RegistrationTab, TabForm};
use crate::shared::error::SharedError;

/// Services a member can offer on the marketplace
pub const KNOWN_SERVICES: &[&str] = &[
    "aerial_survey",
    "mapping",
    "photogrammetry",
    "lidar",
    "inspection",
    "agriculture",
    "gis_analysis",
    "training",
];

const MAX_EXPERIENCE_YEARS: u32 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    Individual,
    Company,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfessionalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_type: Option<OrganizationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_regions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ProfessionalDetails {
    pub fn is_company(&self) -> bool {
        self.organization_type == Some(OrganizationType::Company)
    }
}

impl TabForm for ProfessionalDetails {
    const TAB: RegistrationTab = RegistrationTab::Professional;

    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.organization_type, patch.organization_type);
        overwrite(&mut self.organization_name, patch.organization_name);
        overwrite(&mut self.designation, patch.designation);
        overwrite(&mut self.years_of_experience, patch.years_of_experience);
        overwrite(&mut self.services, patch.services);
        overwrite(&mut self.service_regions, patch.service_regions);
        overwrite(&mut self.website, patch.website);
    }

    fn validate(&self, _today: NaiveDate) -> Result<(), SharedError> {
        require_not_blank("organization_name", &self.organization_name)?;
        require_not_blank("designation", &self.designation)?;

        if let Some(years) = self.years_of_experience {
            if years > MAX_EXPERIENCE_YEARS {
                return Err(SharedError::validation(
                    "years_of_experience",
                    format!("must be at most {}", MAX_EXPERIENCE_YEARS),
                ));
            }
        }

        if let Some(services) = &self.services {
            if let Some(unknown) = services.iter().find(|s| !KNOWN_SERVICES.contains(&s.as_str())) {
                return Err(SharedError::validation(
                    "services",
                    format!("unknown service '{}'", unknown),
                ));
            }
        }

        if let Some(regions) = &self.service_regions {
            if regions.iter().any(|r| r.trim().is_empty()) {
                return Err(SharedError::validation("service_regions", "must not contain blank entries"));
            }
        }

        if let Some(website) = &self.website {
            if !(website.starts_with("https://") || website.starts_with("http://")) {
                return Err(SharedError::validation("website", "must start with http:// or https://"));
            }
        }

        Ok(())
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.organization_type.is_none() {
            missing.push("organization_type");
        }
        if self.is_company() && self.organization_name.is_none() {
            missing.push("organization_name");
        }
        if self.years_of_experience.is_none() {
            missing.push("years_of_experience");
        }
        if self.services.as_ref().map_or(true, Vec::is_empty) {
            missing.push("services");
        }
        if self.service_regions.as_ref().map_or(true, Vec::is_empty) {
            missing.push("service_regions");
        }
        missing
    }
}
