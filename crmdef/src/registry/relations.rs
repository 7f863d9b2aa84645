use serde::Serialize;

use super::MetadataRegistry;
use crate::{errors::RegistryResult, types::FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipDirection {
    /// A field on this object points at another object.
    Outgoing,
    /// A field on another object points at this one.
    Incoming,
}

/// A Lookup or MasterDetail link between two objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub direction: RelationshipDirection,
    pub kind: FieldType,
    /// Object that owns the relationship field.
    pub child_object: String,
    pub field_id: String,
    pub field_api_name: String,
    pub field_label: String,
    /// Object the field references.
    pub parent_object: String,
}

impl MetadataRegistry {
    /// Relationships touching `api_name`: outgoing ones first in field order,
    /// then incoming ones in object creation order. A self-reference is
    /// reported in both directions.
    pub fn relationships(&self, api_name: &str) -> RegistryResult<Vec<Relationship>> {
        let object = self.get_object(api_name)?;

        let mut relationships: Vec<Relationship> = object
            .fields
            .iter()
            .filter_map(|field| {
                let parent = field.kind.reference_object()?;
                Some(Relationship {
                    direction: RelationshipDirection::Outgoing,
                    kind: field.field_type(),
                    child_object: object.api_name.clone(),
                    field_id: field.id.clone(),
                    field_api_name: field.api_name.clone(),
                    field_label: field.label.clone(),
                    parent_object: parent.to_string(),
                })
            })
            .collect();

        for candidate in self.objects.values() {
            for field in &candidate.fields {
                if field.kind.reference_object() != Some(api_name) {
                    continue;
                }
                relationships.push(Relationship {
                    direction: RelationshipDirection::Incoming,
                    kind: field.field_type(),
                    child_object: candidate.api_name.clone(),
                    field_id: field.id.clone(),
                    field_api_name: field.api_name.clone(),
                    field_label: field.label.clone(),
                    parent_object: api_name.to_string(),
                });
            }
        }

        Ok(relationships)
    }
}
