//! Personal details tab

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{overwrite, require_not_blank, RegistrationTab, TabForm};
use crate::shared::contact::normalize_phone;
use crate::shared::error::SharedError;

/// Members must be adults
const MIN_AGE_YEARS: i32 = 18;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_phone: Option<String>,
}

/// Whole years between `born` and `today`
fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

impl TabForm for PersonalDetails {
    const TAB: RegistrationTab = RegistrationTab::Personal;

    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.full_name, patch.full_name);
        overwrite(&mut self.date_of_birth, patch.date_of_birth);
        overwrite(&mut self.gender, patch.gender);
        overwrite(&mut self.address_line, patch.address_line);
        overwrite(&mut self.city, patch.city);
        overwrite(&mut self.state, patch.state);
        overwrite(&mut self.pincode, patch.pincode);
        // Stored in canonical form; a malformed number is kept for validate to reject
        let alternate_phone = patch
            .alternate_phone
            .map(|raw| normalize_phone(&raw).unwrap_or(raw));
        overwrite(&mut self.alternate_phone, alternate_phone);
    }

    fn validate(&self, today: NaiveDate) -> Result<(), SharedError> {
        require_not_blank("full_name", &self.full_name)?;
        require_not_blank("gender", &self.gender)?;
        require_not_blank("address_line", &self.address_line)?;
        require_not_blank("city", &self.city)?;
        require_not_blank("state", &self.state)?;

        if let Some(born) = self.date_of_birth {
            if born > today {
                return Err(SharedError::validation("date_of_birth", "cannot be in the future"));
            }
            if age_on(born, today) < MIN_AGE_YEARS {
                return Err(SharedError::validation(
                    "date_of_birth",
                    format!("member must be at least {} years old", MIN_AGE_YEARS),
                ));
            }
        }

        if let Some(pincode) = &self.pincode {
            if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
                return Err(SharedError::validation("pincode", "must be 6 digits"));
            }
        }

        if let Some(phone) = &self.alternate_phone {
            normalize_phone(phone)
                .map_err(|_| SharedError::validation("alternate_phone", "Invalid phone number"))?;
        }

        Ok(())
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.full_name.is_none() {
            missing.push("full_name");
        }
        if self.date_of_birth.is_none() {
            missing.push("date_of_birth");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        if self.address_line.is_none() {
            missing.push("address_line");
        }
        if self.city.is_none() {
            missing.push("city");
        }
        if self.state.is_none() {
            missing.push("state");
        }
        if self.pincode.is_none() {
            missing.push("pincode");
        }
        missing
    }
}
