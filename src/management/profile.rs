use crate::{
    entities::Profile,
    management::{EntityManager, ManagerContext},
    schema::profile::{AVATAR, DESCRIPTION},
};

pub struct ProfileManager {
    context: ManagerContext,
}

impl ProfileManager {
    pub fn new(context: ManagerContext) -> Self {
        Self { context }
    }

    pub fn set_avatar_local(&self, id: i64, avatar: &str) -> bool {
        self.update_field_local(id, AVATAR, avatar)
    }

    pub fn set_description_local(&self, id: i64, description: &str) -> bool {
        self.update_field_local(id, DESCRIPTION, description)
    }

    /// Creates the profile locally unless a row with its identity exists.
    pub fn ensure_local(&self, profile: &Profile) -> bool {
        self.load_local(profile.id).is_some() || self.create_local(profile)
    }
}

impl EntityManager for ProfileManager {
    type Local = Profile;
    type Remote = Profile;

    fn context(&self) -> &ManagerContext {
        &self.context
    }
}
