use tabled::Table;

use crate::{
    cli::{open_context, spinner},
    management::{ImportReport, Managers, import_table},
    success,
    types::{EntityKind, ImportTableRow},
    warning,
};

pub async fn import(kind: Option<EntityKind>, page_size: usize) {
    let managers = Managers::new(open_context());

    let pb = spinner("Importing from the remote store...");
    let reports: Vec<(&'static str, ImportReport)> = match kind {
        None => managers.import_all(page_size).await,
        Some(EntityKind::Authors) => vec![import_table(&managers.authors, page_size).await],
        Some(EntityKind::Cities) => vec![import_table(&managers.cities, page_size).await],
        Some(EntityKind::Countries) => vec![import_table(&managers.countries, page_size).await],
        Some(EntityKind::Profiles) => vec![import_table(&managers.profiles, page_size).await],
        Some(EntityKind::Users) => vec![import_table(&managers.users, page_size).await],
        Some(EntityKind::Reviews) => {
            vec![(managers.reviews.key(), managers.reviews.import_from_remote().await)]
        }
    };
    pb.finish_and_clear();

    let rows: Vec<ImportTableRow> = reports
        .iter()
        .map(|(table, report)| ImportTableRow::new(table, report))
        .collect();
    println!("{}", Table::new(rows));

    let errored: Vec<&str> = reports
        .iter()
        .filter(|(_, report)| report.errored)
        .map(|(table, _)| *table)
        .collect();
    if errored.is_empty() {
        success!("Import finished.");
    } else {
        warning!("Import stopped early for {}.", errored.join(", "));
    }
}
