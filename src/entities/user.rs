use crate::{
    entities::{City, Country, Entity, FieldMap, FieldSource, Profile},
    error::HydrationError,
    schema::{
        TableSchema,
        user::{self, CITY, COUNTRY, EMAIL, ID, KEY, PASSWORD, PROFILE, PSEUDO},
    },
};

/// A user as cached locally: no personal data, only the pseudo and profile.
///
/// Decoding fills `profile` with a [`Profile::reference`]; the user manager
/// replaces it with the full profile on every load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub pseudo: String,
    pub profile: Profile,
}

impl PublicUser {
    pub fn new(id: i64, pseudo: impl Into<String>, profile: Profile) -> Self {
        Self {
            id,
            pseudo: pseudo.into(),
            profile,
        }
    }
}

impl Entity for PublicUser {
    const SCHEMA: &'static TableSchema = &user::SCHEMA;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn decode<S: FieldSource + ?Sized>(source: &S) -> Result<Self, HydrationError> {
        Ok(Self {
            id: source.int(ID)?,
            pseudo: source.text(PSEUDO)?,
            profile: Profile::reference(source.int(PROFILE)?),
        })
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        if self.id != 0 {
            fields.insert(ID, self.id);
        }
        fields
            .insert(PSEUDO, self.pseudo.as_str())
            .insert(PROFILE, self.profile.id);
        fields
    }
}

/// A user as known by the remote store, credentials included.
///
/// `password` is only ever a clear secret about to be written; the remote
/// store never answers its hashes, so loaded users carry an empty one. `key`
/// is only answered to a read authenticated by email and password.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateUser {
    pub id: i64,
    pub pseudo: String,
    pub password: String,
    pub email: String,
    pub key: String,
    pub profile: Profile,
    pub city: City,
    pub country: Country,
}

impl PrivateUser {
    pub fn new(
        pseudo: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
        profile: Profile,
        city: City,
        country: Country,
    ) -> Self {
        Self {
            id: 0,
            pseudo: pseudo.into(),
            password: password.into(),
            email: email.into(),
            key: String::new(),
            profile,
            city,
            country,
        }
    }

    /// The projection that is allowed into the local cache.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            pseudo: self.pseudo.clone(),
            profile: self.profile.clone(),
        }
    }
}

impl Entity for PrivateUser {
    const SCHEMA: &'static TableSchema = &user::SCHEMA;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn decode<S: FieldSource + ?Sized>(source: &S) -> Result<Self, HydrationError> {
        Ok(Self {
            id: source.int(ID)?,
            pseudo: source.text(PSEUDO)?,
            password: source.opt_text(PASSWORD)?.unwrap_or_default(),
            email: source.text(EMAIL)?,
            key: source.opt_text(KEY)?.unwrap_or_default(),
            profile: Profile::reference(source.int(PROFILE)?),
            city: City::reference(source.opt_int(CITY)?.unwrap_or_default()),
            country: Country::reference(source.opt_int(COUNTRY)?.unwrap_or_default()),
        })
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        if self.id != 0 {
            fields.insert(ID, self.id);
        }
        fields
            .insert(PSEUDO, self.pseudo.as_str())
            .insert(EMAIL, self.email.as_str())
            .insert(PROFILE, self.profile.id);
        if !self.password.is_empty() {
            fields.insert(PASSWORD, self.password.as_str());
        }
        if !self.key.is_empty() {
            fields.insert(KEY, self.key.as_str());
        }
        if self.city.id != 0 {
            fields.insert(CITY, self.city.id);
        }
        if self.country.id != 0 {
            fields.insert(COUNTRY, self.country.id);
        }
        fields
    }
}
