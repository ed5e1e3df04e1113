use serde::{Deserialize, Serialize};

use super::{
    custom_field_values, lenient_ref, tag_ids, zero_as_none, CustomField, EntityRef, IdList,
    Resource, ResourceKind, Tag,
};
use crate::projection::{Mutation, Projection};

/// A deal moving through a sales pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, deserialize_with = "zero_as_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub responsible_user_id: Option<u64>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub account_id: Option<u64>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub status_id: Option<u64>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub pipeline_id: Option<u64>,
    #[serde(default)]
    pub sale: Option<u64>,
    #[serde(default, deserialize_with = "lenient_ref")]
    pub company: EntityRef,
    #[serde(default, deserialize_with = "lenient_ref")]
    pub contacts: IdList,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Resource for Lead {
    const KIND: ResourceKind = ResourceKind {
        path: "leads",
        name: "lead",
    };

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn project(&self, mutation: Mutation, now: i64) -> Projection {
        let projection = match mutation {
            Mutation::Add => Projection::new()
                .always("name", self.name.as_str())
                .when_set("responsible_user_id", self.responsible_user_id)
                .when_nonempty("custom_fields", custom_field_values(&self.custom_fields)),
            Mutation::Update => Projection::new()
                .always("id", self.id.unwrap_or(0))
                .always("name", self.name.as_str())
                .always("updated_at", now)
                .always("responsible_user_id", self.responsible_user_id.unwrap_or(0))
                .always("custom_fields", custom_field_values(&self.custom_fields))
                .always("created_by", self.created_by.unwrap_or(0)),
        };
        projection
            .when_set("company_id", self.company.id)
            .when_set("status_id", self.status_id)
            .when_set("pipeline_id", self.pipeline_id)
            .when_set("sale", self.sale)
            .when_nonempty("contacts_id", self.contacts.id.clone())
            .when_nonempty("tags", tag_ids(&self.tags))
    }
}
