#![warn(clippy::all, missing_docs)]

//! Core domain logic for the RaceDesk administration client.
//!
//! This crate hosts the record models, validation rules, REST client,
//! the generic list-resource controller and configuration handling
//! used by the terminal UI and any future frontends.

pub mod api;
pub mod config;
pub mod controller;
pub mod models;
pub mod reference;
pub mod validate;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, ResourceStore};
pub use config::AppConfig;
pub use controller::{
    ActionError, Activity, ListController, LoadPhase, Notification, NotificationKind,
};
pub use models::{
    ChoiceSource, Director, FieldSpec, License, NaturalKey, Participation, ParticipationKey,
    Race, RaceKey, Racer, Resource, ResourceKind, Sponsor,
};
pub use reference::RaceReferenceData;
pub use validate::ValidationError;
