use std::marker::PhantomData;

use crate::{
    entities::{Author, City, Country, NamedEntity},
    management::{EntityManager, ManagerContext},
};

pub type AuthorManager = NamedManager<Author>;
pub type CityManager = NamedManager<City>;
pub type CountryManager = NamedManager<Country>;

/// Manager of the name-keyed tables: authors, cities and countries.
pub struct NamedManager<E> {
    context: ManagerContext,
    entity: PhantomData<fn() -> E>,
}

impl<E: NamedEntity> NamedManager<E> {
    pub fn new(context: ManagerContext) -> Self {
        Self {
            context,
            entity: PhantomData,
        }
    }

    pub fn load_local_by_name(&self, name: &str) -> Option<E> {
        self.load_local_by(E::NAME_FIELD, name)
    }

    pub fn get_id_local_by_name(&self, name: &str) -> Option<i64> {
        self.get_id_local(E::NAME_FIELD, name)
    }

    pub fn query_by_name_local(&self, pattern: &str) -> Vec<E> {
        self.query_filtered_local(E::NAME_FIELD, pattern)
    }

    pub async fn load_remote_by_name(&self, name: &str) -> Option<E> {
        self.load_remote_by(E::NAME_FIELD, name).await
    }

    pub async fn is_name_available_remote(&self, name: &str, exclude_id: Option<i64>) -> bool {
        self.is_available_remote(E::NAME_FIELD, name, exclude_id)
            .await
    }

    /// Identity of the remote entity named like `entity`, creating it when
    /// the name is unknown. The identity is stored in `entity`.
    pub async fn resolve_remote(&self, entity: &mut E) -> bool {
        if let Some(found) = self.load_remote_by_name(entity.name()).await {
            entity.set_id(found.id());
            return true;
        }
        self.save_remote(entity).await
    }
}

impl<E: NamedEntity> EntityManager for NamedManager<E> {
    type Local = E;
    type Remote = E;

    fn context(&self) -> &ManagerContext {
        &self.context
    }
}
