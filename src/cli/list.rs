use serde::Serialize;
use tabled::{Table, Tabled};

use crate::{
    cli::open_context,
    management::{EntityManager, Managers},
    schema::{profile, review, user},
    types::{EntityKind, NamedTableRow, ProfileTableRow, ReviewTableRow, UserTableRow},
    warning,
};

pub fn list(kind: EntityKind, search: Option<String>, json: bool) {
    let managers = Managers::new(open_context());
    let search = search.as_deref();

    match kind {
        EntityKind::Authors => print_rows(named(&managers.authors, search), json),
        EntityKind::Cities => print_rows(named(&managers.cities, search), json),
        EntityKind::Countries => print_rows(named(&managers.countries, search), json),
        EntityKind::Profiles => print_rows(
            rows::<_, ProfileTableRow>(&managers.profiles, profile::DESCRIPTION, search),
            json,
        ),
        EntityKind::Users => print_rows(
            rows::<_, UserTableRow>(&managers.users, user::PSEUDO, search),
            json,
        ),
        EntityKind::Reviews => print_rows(
            managers
                .reviews
                .search_local(review::REVIEW, search)
                .into_iter()
                .map(ReviewTableRow::from)
                .collect::<Vec<_>>(),
            json,
        ),
    }
}

fn named<M>(manager: &M, search: Option<&str>) -> Vec<NamedTableRow>
where
    M: EntityManager,
    NamedTableRow: From<M::Local>,
{
    let field = manager.schema().alternate_key.unwrap_or(manager.schema().id);
    rows(manager, field, search)
}

fn rows<M, R>(manager: &M, field: &str, search: Option<&str>) -> Vec<R>
where
    M: EntityManager,
    R: From<M::Local>,
{
    manager
        .search_local(field, search)
        .into_iter()
        .map(R::from)
        .collect()
}

fn print_rows<R: Tabled + Serialize>(rows: Vec<R>, json: bool) {
    if json {
        match serde_json::to_string_pretty(&rows) {
            Ok(out) => println!("{}", out),
            Err(e) => warning!("Cannot serialize rows. Err: {}", e),
        }
        return;
    }

    if rows.is_empty() {
        warning!("Nothing cached yet. Run readeo import.");
        return;
    }
    println!("{}", Table::new(rows));
}
