use crate::{
    entities::{Entity, FieldMap, FieldSource},
    error::HydrationError,
    schema::{
        TableSchema,
        profile::{self, AVATAR, DESCRIPTION, ID},
    },
};

/// The public face of a user: avatar and free text description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub avatar: String,
    pub description: String,
}

impl Profile {
    pub fn new(avatar: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            avatar: avatar.into(),
            description: description.into(),
        }
    }

    /// Placeholder holding only the identity, filled in by the user managers.
    pub fn reference(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

impl Entity for Profile {
    const SCHEMA: &'static TableSchema = &profile::SCHEMA;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn decode<S: FieldSource + ?Sized>(source: &S) -> Result<Self, HydrationError> {
        Ok(Self {
            id: source.int(ID)?,
            avatar: source.opt_text(AVATAR)?.unwrap_or_default(),
            description: source.opt_text(DESCRIPTION)?.unwrap_or_default(),
        })
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        if self.id != 0 {
            fields.insert(ID, self.id);
        }
        fields
            .insert(AVATAR, self.avatar.as_str())
            .insert(DESCRIPTION, self.description.as_str());
        fields
    }
}
