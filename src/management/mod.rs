mod import;
mod manager;
mod named;
mod profile;
mod review;
mod user;

pub use import::{ImportReport, count_url, page_url};
pub use manager::{EntityManager, ManagerContext};
pub use named::{AuthorManager, CityManager, CountryManager, NamedManager};
pub use profile::ProfileManager;
pub use review::ReviewManager;
pub use user::{Session, UserManager};

/// One manager per table, all sharing a single context.
pub struct Managers {
    pub countries: CountryManager,
    pub cities: CityManager,
    pub authors: AuthorManager,
    pub profiles: ProfileManager,
    pub users: UserManager,
    pub reviews: ReviewManager,
}

impl Managers {
    pub fn new(context: ManagerContext) -> Self {
        Self {
            countries: CountryManager::new(context.clone()),
            cities: CityManager::new(context.clone()),
            authors: AuthorManager::new(context.clone()),
            profiles: ProfileManager::new(context.clone()),
            users: UserManager::new(context.clone()),
            reviews: ReviewManager::new(context),
        }
    }

    /// Imports every table, referenced tables first. Entity tables are read
    /// page by page, reviews in one request.
    pub async fn import_all(&self, page_size: usize) -> Vec<(&'static str, ImportReport)> {
        let mut reports = Vec::new();
        reports.push(import_table(&self.countries, page_size).await);
        reports.push(import_table(&self.cities, page_size).await);
        reports.push(import_table(&self.authors, page_size).await);
        reports.push(import_table(&self.profiles, page_size).await);
        reports.push(import_table(&self.users, page_size).await);
        reports.push((self.reviews.key(), self.reviews.import_from_remote().await));
        reports
    }

    /// Local row count per table.
    pub fn count_local(&self) -> Vec<(&'static str, i64)> {
        vec![
            (self.countries.key(), self.countries.count_local()),
            (self.cities.key(), self.cities.count_local()),
            (self.authors.key(), self.authors.count_local()),
            (self.profiles.key(), self.profiles.count_local()),
            (self.users.key(), self.users.count_local()),
            (self.reviews.key(), self.reviews.count_local()),
        ]
    }
}

/// Paginated import of everything `manager`'s read endpoint serves.
pub async fn import_table<M: EntityManager>(
    manager: &M,
    page_size: usize,
) -> (&'static str, ImportReport) {
    let report = match manager.endpoint(crate::remote::Operation::Read) {
        Ok(endpoint) => {
            manager
                .import_paginated_from_remote(endpoint.url().as_str(), page_size)
                .await
        }
        Err(e) => {
            manager.log_error("import_all", &e);
            ImportReport {
                errored: true,
                ..ImportReport::default()
            }
        }
    };
    (manager.key(), report)
}
