use clap::ValueEnum;
use serde::Serialize;
use tabled::Tabled;

use crate::{
    entities::{Author, City, Country, Profile, PublicUser, Review},
    management::ImportReport,
    utils,
};

/// Collections addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Authors,
    Cities,
    Countries,
    Profiles,
    Users,
    Reviews,
}

#[derive(Debug, Tabled, Serialize)]
pub struct NamedTableRow {
    pub id: i64,
    pub name: String,
}

impl From<Author> for NamedTableRow {
    fn from(a: Author) -> Self {
        Self { id: a.id, name: a.name }
    }
}

impl From<City> for NamedTableRow {
    fn from(c: City) -> Self {
        Self { id: c.id, name: c.name }
    }
}

impl From<Country> for NamedTableRow {
    fn from(c: Country) -> Self {
        Self { id: c.id, name: c.name }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct ProfileTableRow {
    pub id: i64,
    pub avatar: String,
    pub description: String,
}

impl From<Profile> for ProfileTableRow {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            avatar: p.avatar,
            description: utils::truncate(&p.description, 40),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct UserTableRow {
    pub id: i64,
    pub pseudo: String,
    pub profile: i64,
    pub avatar: String,
}

impl From<PublicUser> for UserTableRow {
    fn from(u: PublicUser) -> Self {
        Self {
            id: u.id,
            pseudo: u.pseudo,
            profile: u.profile.id,
            avatar: u.profile.avatar,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct ReviewTableRow {
    pub user: i64,
    pub book: i64,
    pub shared: bool,
    pub review: String,
}

impl From<Review> for ReviewTableRow {
    fn from(r: Review) -> Self {
        Self {
            user: r.user,
            book: r.book,
            shared: r.shared,
            review: utils::truncate(&r.review, 60),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct CountTableRow {
    pub table: String,
    pub local: i64,
    pub remote: String,
}

impl CountTableRow {
    pub fn new(table: &str, local: i64, remote: Option<usize>) -> Self {
        Self {
            table: table.to_string(),
            local,
            remote: remote.map_or_else(|| "-".to_string(), |n| n.to_string()),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct ImportTableRow {
    pub table: String,
    pub pages: usize,
    pub fetched: usize,
    pub imported: usize,
    pub failed: usize,
}

impl ImportTableRow {
    pub fn new(table: &str, report: &ImportReport) -> Self {
        Self {
            table: table.to_string(),
            pages: report.pages,
            fetched: report.fetched,
            imported: report.imported,
            failed: report.failed,
        }
    }
}
