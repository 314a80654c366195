use tabled::Table;

use crate::{
    cli::{open_context, spinner},
    management::{EntityManager, Managers},
    types::CountTableRow,
    warning,
};

/// Prints local and remote record counts per table.
pub async fn info() {
    let managers = Managers::new(open_context());

    let pb = spinner("Counting remote records...");
    let remote = [
        managers.countries.count_remote().await,
        managers.cities.count_remote().await,
        managers.authors.count_remote().await,
        managers.profiles.count_remote().await,
        managers.users.count_remote().await,
        managers.reviews.count_remote().await,
    ];
    pb.finish_and_clear();

    let rows: Vec<CountTableRow> = managers
        .count_local()
        .into_iter()
        .zip(remote)
        .map(|((table, local), remote)| CountTableRow::new(table, local, remote))
        .collect();

    let stale = rows.iter().any(|r| r.remote != "-" && r.remote != r.local.to_string());
    let unreachable = rows.iter().any(|r| r.remote == "-");
    println!("{}", Table::new(rows));

    if unreachable {
        warning!("Remote store unreachable for some tables.");
    } else if stale {
        warning!("Local cache is outdated. Run readeo import.");
    }
}
