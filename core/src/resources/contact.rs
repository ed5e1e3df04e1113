use serde::{Deserialize, Serialize};

use super::{
    custom_field_values, lenient_ref, tag_ids, zero_as_none, CustomField, EntityRef, IdList,
    Resource, ResourceKind, Tag,
};
use crate::projection::{Mutation, Projection};

/// A person in the CRM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
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
    pub updated_by: Option<u64>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub group_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_ref")]
    pub company: EntityRef,
    #[serde(default, deserialize_with = "lenient_ref")]
    pub leads: IdList,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub closest_task_at: i64,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Resource for Contact {
    const KIND: ResourceKind = ResourceKind {
        path: "contacts",
        name: "contact",
    };

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn project(&self, mutation: Mutation, now: i64) -> Projection {
        match mutation {
            Mutation::Add => Projection::new()
                .always("name", self.name.as_str())
                .when_set("responsible_user_id", self.responsible_user_id)
                .when_set("company_id", self.company.id)
                .when_nonempty("custom_fields", custom_field_values(&self.custom_fields))
                .when_nonempty("tags", tag_ids(&self.tags)),
            // Update restates ownership unconditionally; only the company
            // link follows the add-time rule.
            Mutation::Update => Projection::new()
                .always("id", self.id.unwrap_or(0))
                .always("name", self.name.as_str())
                .always("updated_at", now)
                .when_set("company_id", self.company.id)
                .always("responsible_user_id", self.responsible_user_id.unwrap_or(0))
                .always("custom_fields", custom_field_values(&self.custom_fields))
                .always("created_by", self.created_by.unwrap_or(0))
                .when_nonempty("tags", tag_ids(&self.tags)),
        }
    }
}
