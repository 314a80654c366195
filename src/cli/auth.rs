use crate::{
    cli::{open_context, spinner},
    error,
    error::RemoteError,
    management::UserManager,
    success, warning,
};

/// Checks `email`/`password` against the remote store and caches the user.
pub async fn login(email: &str, password: &str) {
    let users = UserManager::new(open_context());

    let pb = spinner("Logging in...");
    let session = users.login(email, password).await;
    pb.finish_and_clear();

    match session {
        Ok(session) => {
            if !users.remember(&session) {
                warning!("Cannot cache user {} locally.", session.user_id());
            }
            success!(
                "Logged in as {} (user {}) at {}.",
                session.user.pseudo,
                session.user_id(),
                session.started_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        Err(RemoteError::NotFound) => error!("Unknown email or wrong password."),
        Err(e) => error!("Login failed. Err: {}", e),
    }
}
