use serde::{Deserialize, Serialize};

use super::{input, FieldSpec, Resource, ResourceKind};
use crate::validate::{self, ValidationError};

/// A registered racer, keyed by membership number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Racer {
    /// Membership number.
    pub mem_num: String,
    /// Full name.
    pub name: String,
    /// Postal address.
    pub address: String,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("memNum", "Member number"),
    FieldSpec::text("name", "Name"),
    FieldSpec::text("address", "Address"),
];

impl Resource for Racer {
    type Key = String;

    const KIND: ResourceKind = ResourceKind::Racers;

    fn key(&self) -> String {
        self.mem_num.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.address.clone(),
            self.mem_num.clone(),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate::required("memNum", "Member number", &self.mem_num)?;
        validate::identifier("memNum", "Member number", &self.mem_num)?;
        validate::required("name", "Name", &self.name)?;
        validate::required("address", "Address", &self.address)
    }

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.mem_num.clone(),
            self.name.clone(),
            self.address.clone(),
        ]
    }

    fn from_field_values(values: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            mem_num: input(values, 0).to_string(),
            name: input(values, 1).to_string(),
            address: input(values, 2).to_string(),
        })
    }
}
