//! Equipment tab: drone fleet, software and pilot certification

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{overwrite, require_not_blank, RegistrationTab, TabForm};
use crate::shared::error::SharedError;

/// Weight categories used by civil aviation drone rules
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DroneCategory {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
}

impl DroneCategory {
    /// Nano drones are exempt from unique identification
    pub fn requires_uin(&self) -> bool {
        *self != DroneCategory::Nano
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DroneEntry {
    pub manufacturer: String,
    pub model: String,
    pub category: DroneCategory,
    /// Unique identification number issued for the airframe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drones: Option<Vec<DroneEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_pilot_certificate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pilot_certificate_number: Option<String>,
}

impl EquipmentDetails {
    pub fn declares_pilot_certificate(&self) -> bool {
        self.has_pilot_certificate == Some(true)
    }
}

impl TabForm for EquipmentDetails {
    const TAB: RegistrationTab = RegistrationTab::Equipment;

    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.drones, patch.drones);
        overwrite(&mut self.software, patch.software);
        overwrite(&mut self.has_pilot_certificate, patch.has_pilot_certificate);
        overwrite(&mut self.pilot_certificate_number, patch.pilot_certificate_number);
    }

    fn validate(&self, _today: NaiveDate) -> Result<(), SharedError> {
        require_not_blank("pilot_certificate_number", &self.pilot_certificate_number)?;

        for (index, drone) in self.drones.iter().flatten().enumerate() {
            let field = format!("drones[{}]", index);
            if drone.manufacturer.trim().is_empty() || drone.model.trim().is_empty() {
                return Err(SharedError::validation(field, "manufacturer and model are required"));
            }
            match &drone.uin {
                Some(uin) if uin.trim().is_empty() => {
                    return Err(SharedError::validation(field, "uin must not be blank"));
                }
                None if drone.category.requires_uin() => {
                    return Err(SharedError::validation(field, "uin is required above nano category"));
                }
                _ => {}
            }
        }

        if let Some(software) = &self.software {
            if software.iter().any(|s| s.trim().is_empty()) {
                return Err(SharedError::validation("software", "must not contain blank entries"));
            }
        }

        Ok(())
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.drones.as_ref().map_or(true, Vec::is_empty) {
            missing.push("drones");
        }
        if self.has_pilot_certificate.is_none() {
            missing.push("has_pilot_certificate");
        }
        if self.declares_pilot_certificate() && self.pilot_certificate_number.is_none() {
            missing.push("pilot_certificate_number");
        }
        missing
    }
}
