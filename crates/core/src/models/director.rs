use serde::{Deserialize, Serialize};

use super::{input, FieldSpec, Resource, ResourceKind};
use crate::validate::{self, ValidationError};

/// A race director, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Director {
    /// Director name.
    pub name: String,
    /// Contact phone number.
    pub phone_no: String,
    /// Postal address.
    pub address: String,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("name", "Name"),
    FieldSpec::text("phoneNo", "Phone number"),
    FieldSpec::text("address", "Address"),
];

impl Resource for Director {
    type Key = String;

    const KIND: ResourceKind = ResourceKind::Directors;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.phone_no.clone(),
            self.address.clone(),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate::required("name", "Name", &self.name)?;
        validate::phone("phoneNo", "Phone number", &self.phone_no)?;
        validate::required("address", "Address", &self.address)
    }

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.phone_no.clone(),
            self.address.clone(),
        ]
    }

    fn from_field_values(values: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            name: input(values, 0).to_string(),
            phone_no: input(values, 1).to_string(),
            address: input(values, 2).to_string(),
        })
    }
}
