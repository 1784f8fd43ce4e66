use serde::{Deserialize, Serialize};

use super::{input, FieldSpec, Resource, ResourceKind};
use crate::validate::{self, ValidationError};

/// An event license, keyed by license number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    /// License number.
    pub lic_no: String,
    /// Host city.
    pub city: String,
    /// Issue date as `YYYY-MM-DD`.
    pub date: String,
    /// Description of the licensed issues.
    pub issues: String,
    /// License fee.
    pub cost: f64,
    /// Issuing department.
    pub dept: String,
    /// Contact details.
    pub contact: String,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("licNo", "License number"),
    FieldSpec::text("city", "City"),
    FieldSpec::text("date", "Date (YYYY-MM-DD)"),
    FieldSpec::text("issues", "Issues"),
    FieldSpec::text("cost", "Cost"),
    FieldSpec::text("dept", "Department"),
    FieldSpec::text("contact", "Contact"),
];

impl Resource for License {
    type Key = String;

    const KIND: ResourceKind = ResourceKind::Licenses;

    fn key(&self) -> String {
        self.lic_no.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.lic_no.clone(),
            self.city.clone(),
            self.issues.clone(),
            self.dept.clone(),
            self.contact.clone(),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate::required("licNo", "License number", &self.lic_no)?;
        validate::required("city", "City", &self.city)?;
        validate::iso_date("date", "Date", &self.date)?;
        validate::required("issues", "Issues", &self.issues)?;
        validate::positive_amount("cost", "Cost", self.cost)?;
        validate::required("dept", "Department", &self.dept)?;
        validate::required("contact", "Contact", &self.contact)
    }

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.lic_no.clone(),
            self.city.clone(),
            self.date.clone(),
            self.issues.clone(),
            self.cost.to_string(),
            self.dept.clone(),
            self.contact.clone(),
        ]
    }

    fn from_field_values(values: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            lic_no: input(values, 0).to_string(),
            city: input(values, 1).to_string(),
            date: input(values, 2).trim().to_string(),
            issues: input(values, 3).to_string(),
            cost: validate::parse_amount("cost", "Cost", input(values, 4))?,
            dept: input(values, 5).to_string(),
            contact: input(values, 6).to_string(),
        })
    }
}
