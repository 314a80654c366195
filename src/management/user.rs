use chrono::{DateTime, Utc};

use crate::{
    coordinator::RequestHandle,
    entities::{City, Country, Entity, FieldMap, PrivateUser, PublicUser},
    error::RemoteError,
    management::{CityManager, CountryManager, EntityManager, ManagerContext, ProfileManager},
    remote::Operation,
    schema::user::{EMAIL, PASSWORD, PSEUDO, PSEUDO_SIZE},
};

/// The authenticated user of a running client.
///
/// Returned by [`UserManager::login`] and handed around by the caller; there
/// is no process-wide current user.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: PrivateUser,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: PrivateUser) -> Self {
        Self {
            user,
            started_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn public(&self) -> PublicUser {
        self.user.to_public()
    }
}

/// Users are cached as [`PublicUser`] and served remotely as [`PrivateUser`].
///
/// Every load hydrates the owned profile eagerly. When the profile cannot be
/// loaded the user load is a miss. City and country are references on the
/// remote side and are filled in when available.
pub struct UserManager {
    context: ManagerContext,
    profiles: ProfileManager,
    cities: CityManager,
    countries: CountryManager,
}

impl UserManager {
    pub fn new(context: ManagerContext) -> Self {
        Self {
            profiles: ProfileManager::new(context.clone()),
            cities: CityManager::new(context.clone()),
            countries: CountryManager::new(context.clone()),
            context,
        }
    }

    pub fn profiles(&self) -> &ProfileManager {
        &self.profiles
    }

    pub fn load_local_by_pseudo(&self, pseudo: &str) -> Option<PublicUser> {
        self.load_local_by(PSEUDO, pseudo)
    }

    pub fn get_field_by_pseudo_local(&self, field: &str, pseudo: &str) -> Option<String> {
        self.get_field_local_by(field, PSEUDO, pseudo)
    }

    /// Caches the public part of a remote user along with its profile.
    pub fn cache_user(&self, user: &PrivateUser) -> bool {
        self.create_local(&user.to_public())
    }

    /// Caches the user of `session` unless a row with its identity exists.
    pub fn remember(&self, session: &Session) -> bool {
        self.load_local(session.user_id()).is_some() || self.cache_user(&session.user)
    }

    pub async fn is_pseudo_available_remote(&self, pseudo: &str, exclude_id: Option<i64>) -> bool {
        if pseudo.is_empty() || pseudo.chars().count() > PSEUDO_SIZE {
            return false;
        }
        self.is_available_remote(PSEUDO, pseudo, exclude_id).await
    }

    pub async fn is_email_available_remote(&self, email: &str, exclude_id: Option<i64>) -> bool {
        self.is_available_remote(EMAIL, email, exclude_id).await
    }

    /// Authenticated lookup by credential pair.
    ///
    /// Unlike the other loads the failure is returned: `NotFound` for wrong
    /// credentials or a user whose profile is gone, anything else for a
    /// failed request.
    pub async fn login(&self, email: &str, secret: &str) -> Result<Session, RemoteError> {
        let terms = credentials(email, secret);
        let fields = self
            .try_load_remote_fields(&terms)
            .await?
            .ok_or(RemoteError::NotFound)?;
        let user =
            PrivateUser::decode(&fields).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let user = self
            .complete_remote(user)
            .await
            .ok_or(RemoteError::NotFound)?;

        tracing::info!(user = user.id, "logged in");
        Ok(Session::new(user))
    }

    pub fn soft_delete_remote_with_credentials(
        &self,
        email: &str,
        secret: &str,
    ) -> RequestHandle<()> {
        self.by_credentials(Operation::SoftDelete, email, secret)
    }

    /// Restores a soft-deleted account; the credential pair is resolved
    /// against deleted accounts too.
    pub fn restore_remote_with_credentials(&self, email: &str, secret: &str) -> RequestHandle<()> {
        self.by_credentials(Operation::Restore, email, secret)
    }

    pub fn delete_remote_with_credentials(&self, email: &str, secret: &str) -> RequestHandle<()> {
        self.by_credentials(Operation::Delete, email, secret)
    }

    fn by_credentials(&self, operation: Operation, email: &str, secret: &str) -> RequestHandle<()> {
        let terms = credentials(email, secret);
        self.submit(self.endpoint(operation).map(|e| e.terms_from(&terms)))
    }
}

fn credentials(email: &str, secret: &str) -> FieldMap {
    FieldMap::new().with(EMAIL, email).with(PASSWORD, secret)
}

impl EntityManager for UserManager {
    type Local = PublicUser;
    type Remote = PrivateUser;

    fn context(&self) -> &ManagerContext {
        &self.context
    }

    /// The cache enforces the profile reference, so the profile goes first.
    fn create_local(&self, user: &PublicUser) -> bool {
        self.profiles.ensure_local(&user.profile) && self.create_local_fields(&user.to_fields())
    }

    fn complete_local(&self, mut user: PublicUser) -> Option<PublicUser> {
        user.profile = self.profiles.load_local(user.profile.id)?;
        Some(user)
    }

    async fn complete_remote(&self, mut user: PrivateUser) -> Option<PrivateUser> {
        user.profile = self.profiles.load_remote(user.profile.id).await?;

        if user.city.id != 0 {
            user.city = self
                .cities
                .load_remote(user.city.id)
                .await
                .unwrap_or(City::reference(user.city.id));
        }
        if user.country.id != 0 {
            user.country = self
                .countries
                .load_remote(user.country.id)
                .await
                .unwrap_or(Country::reference(user.country.id));
        }
        Some(user)
    }
}
