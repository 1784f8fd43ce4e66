use std::fmt;

use serde::{Deserialize, Serialize};

use super::{input, FieldSpec, NaturalKey, Resource, ResourceKind};
use crate::validate::{self, ValidationError};

/// A racer's entry in a race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participation {
    /// Racer membership number.
    pub mem_num: String,
    /// Race number.
    pub rno: i64,
    /// License of the race.
    pub lic_no: String,
}

/// Composite key of a [`Participation`]; every field is part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipationKey {
    /// Racer membership number.
    pub mem_num: String,
    /// Race number.
    pub rno: i64,
    /// License number.
    pub lic_no: String,
}

impl fmt::Display for ParticipationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.mem_num, self.rno, self.lic_no)
    }
}

impl NaturalKey for ParticipationKey {
    fn segments(&self) -> Vec<String> {
        vec![
            self.mem_num.clone(),
            self.rno.to_string(),
            self.lic_no.clone(),
        ]
    }
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("memNum", "Member number"),
    FieldSpec::key("rno", "Race number"),
    FieldSpec::key("licNo", "License number"),
];

impl Resource for Participation {
    type Key = ParticipationKey;

    const KIND: ResourceKind = ResourceKind::Participations;

    fn key(&self) -> ParticipationKey {
        ParticipationKey {
            mem_num: self.mem_num.clone(),
            rno: self.rno,
            lic_no: self.lic_no.clone(),
        }
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.mem_num.clone(),
            self.rno.to_string(),
            self.lic_no.clone(),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate::required("memNum", "Member number", &self.mem_num)?;
        validate::identifier("memNum", "Member number", &self.mem_num)?;
        validate::positive_int("rno", "Race number", self.rno)?;
        validate::required("licNo", "License number", &self.lic_no)?;
        validate::identifier("licNo", "License number", &self.lic_no)
    }

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.mem_num.clone(),
            self.rno.to_string(),
            self.lic_no.clone(),
        ]
    }

    fn from_field_values(values: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            mem_num: input(values, 0).to_string(),
            rno: validate::parse_int("rno", "Race number", input(values, 1))?,
            lic_no: input(values, 2).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_three_segments() {
        let entry = Participation {
            mem_num: "M1".to_string(),
            rno: 4,
            lic_no: "L1".to_string(),
        };
        assert_eq!(entry.key().segments(), ["M1", "4", "L1"]);
    }

    #[test]
    fn non_positive_race_number_is_rejected() {
        let entry = Participation {
            mem_num: "M1".to_string(),
            rno: 0,
            lic_no: "L1".to_string(),
        };
        assert_eq!(entry.validate().unwrap_err().field, "rno");
    }
}
