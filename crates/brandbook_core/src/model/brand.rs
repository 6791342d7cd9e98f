//! Brand statement collection.

use crate::model::collection::{overwrite, Collection, RecordFields, RecordValidationError};
use serde::{Deserialize, Serialize};

/// Brand statements are addressed only by storage id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brand;

impl Collection for Brand {
    const NAME: &'static str = "brand";
    const SEQUENCED: bool = false;
    type Fields = BrandFields;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
}

impl RecordFields for BrandFields {
    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.purpose, patch.purpose);
        overwrite(&mut self.vision, patch.vision);
        overwrite(&mut self.mission, patch.mission);
        overwrite(&mut self.values, patch.values);
    }

    // Every brand attribute is optional.
    fn validate(&self) -> Result<(), RecordValidationError> {
        Ok(())
    }
}
