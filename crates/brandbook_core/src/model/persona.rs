//! Target persona collection.
//!
//! Personas are sequenced: each owner's personas are numbered 1, 2, ... and
//! clients address them by that number when upserting.

use crate::model::collection::{
    overwrite, require_text, Collection, RecordFields, RecordValidationError, SequencedCollection,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona;

impl Collection for Persona {
    const NAME: &'static str = "persona";
    const SEQUENCED: bool = true;
    type Fields = PersonaFields;
}

impl SequencedCollection for Persona {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaFields {
    /// Required when the persona is first created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whole years. Fractional or negative ages are rejected when the
    /// payload is decoded, before any store operation runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
}

impl RecordFields for PersonaFields {
    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.name, patch.name);
        overwrite(&mut self.age, patch.age);
        overwrite(&mut self.gender, patch.gender);
        overwrite(&mut self.relationship, patch.relationship);
        overwrite(&mut self.job, patch.job);
        overwrite(&mut self.location, patch.location);
        overwrite(&mut self.salary, patch.salary);
        overwrite(&mut self.budget, patch.budget);
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_text(Persona::NAME, "name", self.name.as_deref())
    }
}
