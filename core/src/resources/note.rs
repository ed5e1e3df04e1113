use serde::{Deserialize, Serialize};

use super::{zero_as_none, Resource, ResourceKind};
use crate::projection::{Mutation, Projection};

/// What a note records. The server defines many more; these are the ones a
/// client typically creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteType(pub u32);

impl NoteType {
    pub const DEAL_CREATED: NoteType = NoteType(1);
    pub const CONTACT_CREATED: NoteType = NoteType(2);
    pub const DEAL_STATUS_CHANGED: NoteType = NoteType(3);
    pub const COMMON: NoteType = NoteType(4);
    pub const COMPANY_CREATED: NoteType = NoteType(12);
    pub const TASK_RESULT: NoteType = NoteType(13);
    pub const SYSTEM: NoteType = NoteType(25);
    pub const SMS_IN: NoteType = NoteType(102);
    pub const SMS_OUT: NoteType = NoteType(103);
}

/// The kind of entity a note is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementType(pub u32);

impl ElementType {
    pub const CONTACT: ElementType = ElementType(1);
    pub const LEAD: ElementType = ElementType(2);
    pub const COMPANY: ElementType = ElementType(3);
    pub const TASK: ElementType = ElementType(4);
    pub const CUSTOMER: ElementType = ElementType(12);
}

/// A note attached to another entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, deserialize_with = "zero_as_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub element_id: u64,
    #[serde(default)]
    pub element_type: ElementType,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub note_type: NoteType,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub responsible_user_id: Option<u64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Note {
    /// A plain text note on the given entity.
    pub fn common(element_type: ElementType, element_id: u64, text: &str) -> Self {
        Self {
            element_id,
            element_type,
            text: text.to_string(),
            note_type: NoteType::COMMON,
            ..Self::default()
        }
    }
}

impl Resource for Note {
    const KIND: ResourceKind = ResourceKind {
        path: "notes",
        name: "note",
    };

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn project(&self, mutation: Mutation, now: i64) -> Projection {
        let projection = match mutation {
            Mutation::Add => Projection::new(),
            Mutation::Update => Projection::new()
                .always("id", self.id.unwrap_or(0))
                .always("updated_at", now),
        };
        let projection = projection
            .always("element_id", self.element_id)
            .always("element_type", self.element_type.0)
            .always("text", self.text.as_str())
            .always("note_type", self.note_type.0);
        match mutation {
            Mutation::Add => projection.when_set("responsible_user_id", self.responsible_user_id),
            Mutation::Update => {
                projection.always("responsible_user_id", self.responsible_user_id.unwrap_or(0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn add_sends_attachment_and_text() {
        let note = Note::common(ElementType::CONTACT, 59144296, "Called, no answer");
        assert_eq!(
            note.project(Mutation::Add, 0).into_value(),
            json!({
                "element_id": 59144296,
                "element_type": 1,
                "text": "Called, no answer",
                "note_type": 4,
            })
        );
    }

    #[test]
    fn add_sends_responsible_only_when_set() {
        let mut note = Note::common(ElementType::LEAD, 7, "x");
        note.responsible_user_id = Some(11);
        assert_eq!(
            note.project(Mutation::Add, 0).get("responsible_user_id"),
            Some(&json!(11))
        );
    }

    #[test]
    fn update_restates_everything() {
        let note = Note {
            id: Some(3),
            note_type: NoteType::TASK_RESULT,
            ..Note::common(ElementType::LEAD, 7, "done")
        };
        assert_eq!(
            note.project(Mutation::Update, 99).into_value(),
            json!({
                "id": 3,
                "updated_at": 99,
                "element_id": 7,
                "element_type": 2,
                "text": "done",
                "note_type": 13,
                "responsible_user_id": 0,
            })
        );
    }

    #[test]
    fn decodes_wire_note() {
        let note: Note = serde_json::from_value(json!({
            "id": 3,
            "element_id": 7,
            "element_type": 2,
            "text": "done",
            "note_type": 13,
            "responsible_user_id": 0
        }))
        .unwrap();
        assert_eq!(note.element_type, ElementType::LEAD);
        assert_eq!(note.note_type, NoteType::TASK_RESULT);
        assert_eq!(note.responsible_user_id, None);
    }
}
