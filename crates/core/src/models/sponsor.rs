use serde::{Deserialize, Serialize};

use super::{input, FieldSpec, Resource, ResourceKind};
use crate::validate::{self, ValidationError};

/// A sponsor, keyed by sponsor name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sponsor {
    /// Sponsor name.
    pub sp_name: String,
    /// Contact phone number.
    pub contact: String,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("spName", "Sponsor name"),
    FieldSpec::text("contact", "Contact"),
];

impl Resource for Sponsor {
    type Key = String;

    const KIND: ResourceKind = ResourceKind::Sponsors;

    fn key(&self) -> String {
        self.sp_name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.sp_name.clone(), self.contact.clone()]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate::required("spName", "Sponsor name", &self.sp_name)?;
        validate::required("contact", "Contact", &self.contact)?;
        validate::phone("contact", "Contact", &self.contact)
    }

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn field_values(&self) -> Vec<String> {
        vec![self.sp_name.clone(), self.contact.clone()]
    }

    fn from_field_values(values: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            sp_name: input(values, 0).to_string(),
            contact: input(values, 1).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_contact_is_a_phone_error() {
        let sponsor = Sponsor {
            sp_name: "Acme".to_string(),
            contact: "abc".to_string(),
        };
        let err = sponsor.validate().unwrap_err();
        assert_eq!(err.field, "contact");
        assert!(err.message.contains("phone"));
    }

    #[test]
    fn empty_contact_reports_required_first() {
        let sponsor = Sponsor {
            sp_name: "Acme".to_string(),
            contact: String::new(),
        };
        assert_eq!(
            sponsor.validate().unwrap_err().to_string(),
            "Contact is required"
        );
    }
}
