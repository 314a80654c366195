use crate::{
    entities::{Entity, FieldMap, FieldSource},
    error::HydrationError,
    schema::{self, TableSchema},
};

/// An entity identified by a unique name besides its identity.
pub trait NamedEntity: Entity {
    /// Column holding the name.
    const NAME_FIELD: &'static str;

    fn name(&self) -> &str;
}

// Author, City and Country share the same shape: an identity and a unique name.
macro_rules! named_entity {
    ($(#[$meta:meta])* $name:ident, $schema:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub id: i64,
            pub name: String,
        }

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    id: 0,
                    name: name.into(),
                }
            }

            pub fn with_id(id: i64, name: impl Into<String>) -> Self {
                Self {
                    id,
                    name: name.into(),
                }
            }

            /// Reference to an entity known only by its identity.
            pub fn reference(id: i64) -> Self {
                Self {
                    id,
                    name: String::new(),
                }
            }
        }

        impl Entity for $name {
            const SCHEMA: &'static TableSchema = &schema::$schema::SCHEMA;

            fn id(&self) -> i64 {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = id;
            }

            fn decode<S: FieldSource + ?Sized>(source: &S) -> Result<Self, HydrationError> {
                Ok(Self {
                    id: source.int(schema::$schema::ID)?,
                    name: source.text(schema::$schema::NAME)?,
                })
            }

            fn to_fields(&self) -> FieldMap {
                let mut fields = FieldMap::new();
                if self.id != 0 {
                    fields.insert(schema::$schema::ID, self.id);
                }
                fields.insert(schema::$schema::NAME, self.name.as_str());
                fields
            }
        }

        impl NamedEntity for $name {
            const NAME_FIELD: &'static str = schema::$schema::NAME;

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

named_entity!(
    /// A book author.
    Author,
    author
);

named_entity!(
    /// A city a user lives in.
    City,
    city
);

named_entity!(
    /// A country a user lives in.
    Country,
    country
);
