//! Competitor profile collection.

use crate::model::collection::{
    overwrite, require_text, Collection, RecordFields, RecordValidationError, SequencedCollection,
};
use crate::model::value::StructuredValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Competitor;

impl Collection for Competitor {
    const NAME: &'static str = "competitor";
    const SEQUENCED: bool = true;
    type Fields = CompetitorFields;
}

impl SequencedCollection for Competitor {}

/// Competitor attributes. Wire names keep the client's camelCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorFields {
    /// Required when the competitor is first created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_prop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_product: Option<String>,
    /// Free-form persona breakdown. Replaced wholesale on merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personas: Option<StructuredValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication: Option<String>,
}

impl RecordFields for CompetitorFields {
    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.name, patch.name);
        overwrite(&mut self.look, patch.look);
        overwrite(&mut self.value_prop, patch.value_prop);
        overwrite(&mut self.tagline, patch.tagline);
        overwrite(&mut self.core_product, patch.core_product);
        overwrite(&mut self.personas, patch.personas);
        overwrite(&mut self.communication, patch.communication);
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_text(Competitor::NAME, "name", self.name.as_deref())?;
        if self.personas.as_ref().is_some_and(|value| !value.is_finite()) {
            return Err(RecordValidationError::NonFiniteNumber {
                collection: Competitor::NAME,
                field: "personas",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CompetitorFields;
    use crate::model::collection::RecordFields;
    use crate::model::value::StructuredValue;
    use serde_json::json;

    #[test]
    fn wire_names_are_camel_case() {
        let fields: CompetitorFields = serde_json::from_value(json!({
            "name": "Acme",
            "valueProp": "cheap",
            "coreProduct": "anvils"
        }))
        .unwrap();
        assert_eq!(fields.value_prop.as_deref(), Some("cheap"));
        assert_eq!(fields.core_product.as_deref(), Some("anvils"));
    }

    #[test]
    fn merge_replaces_personas_wholesale() {
        let mut stored = CompetitorFields {
            name: Some("Acme".to_string()),
            personas: Some(StructuredValue::from_json(json!({"a": 1, "b": 2}))),
            ..CompetitorFields::default()
        };
        stored.merge(CompetitorFields {
            personas: Some(StructuredValue::from_json(json!({"c": 3}))),
            ..CompetitorFields::default()
        });

        assert_eq!(
            stored.personas.as_ref().map(StructuredValue::to_json),
            Some(json!({"c": 3}))
        );
        assert_eq!(stored.name.as_deref(), Some("Acme"));
    }
}
