use std::fmt;

use serde::{Deserialize, Serialize};

use super::{input, optional_input, ChoiceSource, FieldSpec, NaturalKey, Resource, ResourceKind};
use crate::validate::{self, ValidationError};

/// A race, keyed by race number together with its license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    /// Race number.
    pub rno: i64,
    /// License the race runs under.
    pub lic_no: String,
    /// Director name.
    pub dir: String,
    /// Winner of the men's category.
    #[serde(default)]
    pub mal_win: Option<String>,
    /// Winner of the women's category.
    #[serde(default)]
    pub fem_win: Option<String>,
    /// Sponsor name.
    pub sp_name: String,
}

/// Composite key of a [`Race`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RaceKey {
    /// Race number.
    pub rno: i64,
    /// License number.
    pub lic_no: String,
}

impl fmt::Display for RaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rno, self.lic_no)
    }
}

impl NaturalKey for RaceKey {
    fn segments(&self) -> Vec<String> {
        vec![self.rno.to_string(), self.lic_no.clone()]
    }
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("rno", "Race number"),
    FieldSpec::key("licNo", "License").with_choices(ChoiceSource::Licenses),
    FieldSpec::text("dir", "Director").with_choices(ChoiceSource::Directors),
    FieldSpec::text("malWin", "Men's winner"),
    FieldSpec::text("femWin", "Women's winner"),
    FieldSpec::text("spName", "Sponsor").with_choices(ChoiceSource::Sponsors),
];

impl Resource for Race {
    type Key = RaceKey;

    const KIND: ResourceKind = ResourceKind::Races;

    fn key(&self) -> RaceKey {
        RaceKey {
            rno: self.rno,
            lic_no: self.lic_no.clone(),
        }
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.rno.to_string(),
            self.lic_no.clone(),
            self.dir.clone(),
            self.sp_name.clone(),
            self.mal_win.clone().unwrap_or_default(),
            self.fem_win.clone().unwrap_or_default(),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate::positive_int("rno", "Race number", self.rno)?;
        validate::required("licNo", "License number", &self.lic_no)?;
        validate::identifier("licNo", "License number", &self.lic_no)?;
        validate::required("dir", "Director", &self.dir)?;
        validate::required("spName", "Sponsor", &self.sp_name)
    }

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.rno.to_string(),
            self.lic_no.clone(),
            self.dir.clone(),
            self.mal_win.clone().unwrap_or_default(),
            self.fem_win.clone().unwrap_or_default(),
            self.sp_name.clone(),
        ]
    }

    fn from_field_values(values: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            rno: validate::parse_int("rno", "Race number", input(values, 0))?,
            lic_no: input(values, 1).to_string(),
            dir: input(values, 2).to_string(),
            mal_win: optional_input(values, 3),
            fem_win: optional_input(values, 4),
            sp_name: input(values, 5).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_winners_serialize_as_null() {
        let values: Vec<String> = ["7", "LIC-1", "Quang", "", " ", "Acme"]
            .iter()
            .map(|value| value.to_string())
            .collect();
        let race = Race::from_field_values(&values).unwrap();
        assert_eq!(
            serde_json::to_value(&race).unwrap(),
            json!({
                "rno": 7,
                "licNo": "LIC-1",
                "dir": "Quang",
                "malWin": null,
                "femWin": null,
                "spName": "Acme"
            })
        );
    }

    #[test]
    fn key_encodes_as_two_segments() {
        let key = RaceKey {
            rno: 3,
            lic_no: "L-9".to_string(),
        };
        assert_eq!(key.segments(), ["3", "L-9"]);
        assert_eq!(key.to_string(), "3/L-9");
    }

    #[test]
    fn search_covers_number_and_winners() {
        let race = Race {
            rno: 42,
            lic_no: "L1".to_string(),
            dir: "Quang".to_string(),
            mal_win: None,
            fem_win: Some("Anna".to_string()),
            sp_name: "Acme".to_string(),
        };
        assert!(race.matches("42"));
        assert!(race.matches("ANN"));
        assert!(!race.matches("bolt"));
    }

    #[test]
    fn license_must_be_identifier_safe() {
        let race = Race {
            rno: 1,
            lic_no: "L 1".to_string(),
            dir: "Quang".to_string(),
            mal_win: None,
            fem_win: None,
            sp_name: "Acme".to_string(),
        };
        assert_eq!(race.validate().unwrap_err().field, "licNo");
    }
}
