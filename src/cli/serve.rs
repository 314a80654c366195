use crate::{config, error, info, server, store::Database};

pub async fn serve() {
    let path = config::remote_db_path();
    let db = match Database::open_remote(&path) {
        Ok(db) => db,
        Err(e) => error!("Cannot open remote store {}. Err: {}", path.display(), e),
    };

    let addr = config::server_addr();
    let listener = match server::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => error!("Cannot bind {}. Err: {}", addr, e),
    };

    info!("Serving {} on http://{}", path.display(), addr);
    if let Err(e) = server::start_api_server(listener, db).await {
        error!("Remote store stopped. Err: {}", e);
    }
}
