//! Record models managed by the client.

mod director;
mod license;
mod participation;
mod race;
mod racer;
mod sponsor;

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::validate::ValidationError;

pub use director::Director;
pub use license::License;
pub use participation::{Participation, ParticipationKey};
pub use race::{Race, RaceKey};
pub use racer::Racer;
pub use sponsor::Sponsor;

/// The six record types exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Registered racers.
    Racers,
    /// Races, keyed by race number and license.
    Races,
    /// Race directors.
    Directors,
    /// Event licenses.
    Licenses,
    /// Sponsors.
    Sponsors,
    /// Racer participation in races.
    Participations,
}

impl ResourceKind {
    /// Every kind, in sidebar order.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Racers,
        ResourceKind::Races,
        ResourceKind::Directors,
        ResourceKind::Licenses,
        ResourceKind::Sponsors,
        ResourceKind::Participations,
    ];

    /// Collection path segment below the API root.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Racers => "racers",
            ResourceKind::Races => "races",
            ResourceKind::Directors => "directors",
            ResourceKind::Licenses => "licenses",
            ResourceKind::Sponsors => "sponsors",
            ResourceKind::Participations => "participates",
        }
    }

    /// Lower-case noun for a single record, used in messages.
    pub fn singular(self) -> &'static str {
        match self {
            ResourceKind::Racers => "racer",
            ResourceKind::Races => "race",
            ResourceKind::Directors => "director",
            ResourceKind::Licenses => "license",
            ResourceKind::Sponsors => "sponsor",
            ResourceKind::Participations => "participation",
        }
    }

    /// Lower-case noun for the collection, used in messages.
    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Racers => "racers",
            ResourceKind::Races => "races",
            ResourceKind::Directors => "directors",
            ResourceKind::Licenses => "licenses",
            ResourceKind::Sponsors => "sponsors",
            ResourceKind::Participations => "participation records",
        }
    }

    /// Title shown in the sidebar and pane header.
    pub fn title(self) -> &'static str {
        match self {
            ResourceKind::Racers => "Racers",
            ResourceKind::Races => "Races",
            ResourceKind::Directors => "Directors",
            ResourceKind::Licenses => "Licenses",
            ResourceKind::Sponsors => "Sponsors",
            ResourceKind::Participations => "Participation",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Reference collection a selector field draws its options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSource {
    /// Director names.
    Directors,
    /// Sponsor names.
    Sponsors,
    /// License numbers.
    Licenses,
}

/// Describes one editable field of a record form.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire name.
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Part of the natural key; locked when editing.
    pub key: bool,
    /// Selector backed by reference data, if any.
    pub choices: Option<ChoiceSource>,
}

impl FieldSpec {
    pub(crate) const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            key: false,
            choices: None,
        }
    }

    pub(crate) const fn key(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            key: true,
            choices: None,
        }
    }

    pub(crate) const fn with_choices(mut self, source: ChoiceSource) -> Self {
        self.choices = Some(source);
        self
    }
}

/// A natural key; each part becomes one path segment.
pub trait NaturalKey:
    Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Path segments in API order.
    fn segments(&self) -> Vec<String>;
}

impl NaturalKey for String {
    fn segments(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

/// A record type the list controller can manage.
pub trait Resource:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Natural key type.
    type Key: NaturalKey;

    /// Which collection this record belongs to.
    const KIND: ResourceKind;

    /// Extract the natural key.
    fn key(&self) -> Self::Key;

    /// Stringified fields the search box matches against.
    fn search_fields(&self) -> Vec<String>;

    /// Resource-specific validation; the first failing rule wins.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Form schema, in display order.
    fn fields() -> &'static [FieldSpec];

    /// Current values, aligned with [`Resource::fields`].
    fn field_values(&self) -> Vec<String>;

    /// Build a record from form inputs aligned with [`Resource::fields`].
    fn from_field_values(values: &[String]) -> Result<Self, ValidationError>;

    /// Case-insensitive substring match against the search fields.
    fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Borrow form input `index`, treating missing entries as blank.
pub(crate) fn input(values: &[String], index: usize) -> &str {
    values.get(index).map(String::as_str).unwrap_or("")
}

/// Blank inputs become `None`.
pub(crate) fn optional_input(values: &[String], index: usize) -> Option<String> {
    let value = input(values, index);
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
