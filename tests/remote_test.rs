use std::time::Duration;

use readeo::entities::*;
use readeo::error::RemoteError;
use readeo::management::*;
use readeo::remote::{Operation, RemoteClient};
use readeo::schema::{LAST_UPDATE, author, profile, review, user};
use readeo::server;
use readeo::store::{Database, sql};
use tokio::net::TcpListener;

struct Harness {
    managers: Managers,
    context: ManagerContext,
    remote_db: Database,
}

// Reference remote store on an ephemeral port plus an empty local cache
async fn harness() -> Harness {
    let remote_db = Database::memory_remote().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::start_api_server(listener, remote_db.clone()));

    let remote = RemoteClient::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let context = ManagerContext::new(Database::memory_local().unwrap(), remote);
    Harness {
        managers: Managers::new(context.clone()),
        context,
        remote_db,
    }
}

fn seed_authors(db: &Database, count: usize) {
    db.with_connection(|conn| {
        for i in 0..count {
            let fields = FieldMap::new().with(author::NAME, format!("Author {i:03}"));
            sql::insert(conn, author::TABLE, &fields)?;
        }
        Ok(())
    })
    .unwrap();
}

async fn create_user(h: &Harness, pseudo: &str, email: &str, secret: &str) -> PrivateUser {
    let mut profile = Profile::new(format!("{pseudo}.png"), "Reads a lot");
    assert!(h.managers.profiles.save_remote(&mut profile).await);

    let mut city = City::new("Nantes");
    assert!(h.managers.cities.resolve_remote(&mut city).await);
    let mut country = Country::new("France");
    assert!(h.managers.countries.resolve_remote(&mut country).await);

    let mut created = PrivateUser::new(pseudo, secret, email, profile, city, country);
    assert!(h.managers.users.save_remote(&mut created).await);
    created
}

#[tokio::test]
async fn test_health() {
    let h = harness().await;
    let url = format!("{}/health", h.context.remote.api_url());
    let body: serde_json::Value = reqwest::get(url).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_then_load_remote() {
    let h = harness().await;
    let authors = &h.managers.authors;

    let mut created = Author::new("Marguerite Duras");
    assert!(authors.save_remote(&mut created).await);
    assert!(created.id > 0);

    let loaded = authors.load_remote(created.id).await.unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        authors.load_remote_by_name("Marguerite Duras").await,
        Some(created)
    );
}

#[tokio::test]
async fn test_create_remote_conflict() {
    let h = harness().await;
    let countries = &h.managers.countries;

    let first = countries.create_remote(&Country::new("France")).outcome().await;
    assert!(first.is_ok());

    // Unique name: the store answers 409
    let second = countries.create_remote(&Country::new("France")).outcome().await;
    assert_eq!(second, Err(RemoteError::Status(409)));
    assert_eq!(countries.count_remote().await, Some(1));
}

#[tokio::test]
async fn test_soft_delete_and_restore() {
    let h = harness().await;
    let cities = &h.managers.cities;

    let mut city = City::new("Brest");
    assert!(cities.save_remote(&mut city).await);

    cities.soft_delete_remote(city.id).outcome().await.unwrap();
    assert!(cities.load_remote(city.id).await.is_none());
    assert_eq!(cities.count_remote().await, Some(0));

    // Soft deleting twice finds nothing to delete
    assert_eq!(
        cities.soft_delete_remote(city.id).outcome().await,
        Err(RemoteError::NotFound)
    );

    cities.restore_remote(city.id).outcome().await.unwrap();
    assert_eq!(cities.load_remote(city.id).await, Some(city));
}

#[tokio::test]
async fn test_hard_delete() {
    let h = harness().await;
    let authors = &h.managers.authors;

    let mut created = Author::new("Rabelais");
    assert!(authors.save_remote(&mut created).await);
    authors.delete_remote(created.id).outcome().await.unwrap();

    assert!(authors.load_remote(created.id).await.is_none());
    // Gone for good, restore has nothing to find
    assert_eq!(
        authors.restore_remote(created.id).outcome().await,
        Err(RemoteError::NotFound)
    );
}

#[tokio::test]
async fn test_import_mirrors_remote() {
    let h = harness().await;
    seed_authors(&h.remote_db, 4);
    let authors = &h.managers.authors;

    let report = authors.import_all_from_remote().await;
    assert_eq!(report.fetched, 4);
    assert_eq!(report.imported, 4);
    assert_eq!(report.failed, 0);

    assert_eq!(authors.count_local(), 4);
    for i in 0..4 {
        let name = format!("Author {i:03}");
        let local = authors.load_local_by_name(&name).unwrap();
        let remote = authors.load_remote_by_name(&name).await.unwrap();
        assert_eq!(local, remote);
    }
}

#[tokio::test]
async fn test_import_isolates_failures() {
    let h = harness().await;
    seed_authors(&h.remote_db, 3);
    let authors = &h.managers.authors;

    // One record already cached: its insert fails, the others go through
    let existing = authors.load_remote_by_name("Author 001").await.unwrap();
    assert!(authors.create_local(&existing));

    let report = authors.import_all_from_remote().await;
    assert_eq!(report.fetched, 3);
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(authors.count_local(), 3);
}

#[tokio::test]
async fn test_import_empty_remote() {
    let h = harness().await;
    let report = h.managers.authors.import_all_from_remote().await;

    // The read endpoint answers 404 for an empty set
    assert_eq!(report.fetched, 0);
    assert!(!report.errored);
    assert_eq!(h.managers.authors.count_local(), 0);
}

async fn paginated(total: usize, page_size: usize) -> ImportReport {
    let h = harness().await;
    seed_authors(&h.remote_db, total);
    let authors = &h.managers.authors;

    let base = authors.endpoint(Operation::Read).unwrap().url();
    let report = authors
        .import_paginated_from_remote(base.as_str(), page_size)
        .await;

    assert_eq!(authors.count_local(), total as i64);
    let mut names: Vec<String> = authors
        .query_all_local()
        .into_iter()
        .map(|a| a.name)
        .collect();
    names.dedup();
    assert_eq!(names.len(), total);
    report
}

#[tokio::test]
async fn test_paginated_import_partial_last_page() {
    let report = paginated(7, 3).await;
    assert_eq!(report.pages, 3);
    assert_eq!(report.imported, 7);
}

#[tokio::test]
async fn test_paginated_import_exact_pages() {
    // 6 records in pages of 3: no trailing empty fetch
    let report = paginated(6, 3).await;
    assert_eq!(report.pages, 2);
    assert_eq!(report.imported, 6);
}

#[tokio::test]
async fn test_paginated_import_single_and_empty() {
    assert_eq!(paginated(2, 50).await.pages, 1);
    assert_eq!(paginated(0, 5).await.pages, 0);
}

#[tokio::test]
async fn test_paginated_import_keeps_filter() {
    let h = harness().await;
    seed_authors(&h.remote_db, 5);
    let authors = &h.managers.authors;

    let base = authors
        .endpoint(Operation::Read)
        .unwrap()
        .term(author::NAME, "Author 003")
        .url();
    let report = authors.import_paginated_from_remote(base.as_str(), 2).await;

    assert_eq!(report.pages, 1);
    assert_eq!(authors.count_local(), 1);
    assert!(authors.load_local_by_name("Author 003").is_some());
}

#[tokio::test]
async fn test_import_all_tables() {
    let h = harness().await;
    let owl = create_user(&h, "owl", "owl@example.org", "hoot").await;
    create_user(&h, "lark", "lark@example.org", "song").await;
    seed_authors(&h.remote_db, 3);
    h.managers
        .reviews
        .create_remote(&Review::new(ReviewKey::new(owl.id, 7), "Gripping"))
        .outcome()
        .await
        .unwrap();

    let reports = h.managers.import_all(2).await;
    assert_eq!(reports.len(), 6);
    assert!(reports.iter().all(|(_, r)| !r.errored && r.failed == 0));

    let counts = h.managers.count_local();
    assert!(counts.contains(&("Country", 1)));
    assert!(counts.contains(&("City", 1)));
    assert!(counts.contains(&("Author", 3)));
    assert!(counts.contains(&("Profile", 2)));
    assert!(counts.contains(&("User", 2)));
    assert!(counts.contains(&("Review", 1)));

    // Cached users come with their profile and without credentials
    let owl = h.managers.users.load_local_by_pseudo("owl").unwrap();
    assert_eq!(owl.profile.avatar, "owl.png");
}

#[tokio::test]
async fn test_update_field_remote_is_isolated() {
    let h = harness().await;
    let users = &h.managers.users;
    let created = create_user(&h, "owl", "owl@example.org", "hoot").await;

    let terms = FieldMap::new().with(user::ID, created.id);
    let before = users.load_remote_fields(&terms).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    users
        .update_field_remote(created.id, user::PSEUDO, "barn owl")
        .outcome()
        .await
        .unwrap();
    let after = users.load_remote_fields(&terms).await.unwrap();

    assert_eq!(after.get(user::PSEUDO), Some(&FieldValue::from("barn owl")));
    for field in [user::EMAIL, user::PASSWORD, user::KEY, user::PROFILE, user::CITY] {
        assert_eq!(before.get(field), after.get(field), "{field} changed");
    }

    let stamp_before = before.get(LAST_UPDATE).and_then(FieldValue::as_text).unwrap();
    let stamp_after = after.get(LAST_UPDATE).and_then(FieldValue::as_text).unwrap();
    assert!(stamp_after > stamp_before);
}

#[tokio::test]
async fn test_update_field_remote_refuses_identity() {
    let h = harness().await;
    let profiles = &h.managers.profiles;
    let mut created = Profile::new("a.png", "b");
    assert!(profiles.save_remote(&mut created).await);

    let outcome = profiles
        .update_field_remote(created.id, profile::ID, 99)
        .outcome()
        .await;
    assert!(matches!(outcome, Err(RemoteError::Rejected(_))));

    let outcome = profiles
        .update_field_remote(created.id, "unknown", "x")
        .outcome()
        .await;
    assert!(matches!(outcome, Err(RemoteError::Rejected(_))));
    assert_eq!(profiles.load_remote(created.id).await, Some(created));
}

fn stored_password(h: &Harness, id: i64) -> String {
    h.remote_db
        .with_connection(|conn| {
            Ok(conn.query_row(
                "SELECT password FROM User WHERE id_user = ?1",
                [id],
                |row| row.get::<_, String>(0),
            )?)
        })
        .unwrap()
}

#[tokio::test]
async fn test_update_remote() {
    let h = harness().await;
    let users = &h.managers.users;
    let mut created = create_user(&h, "owl", "owl@example.org", "hoot").await;
    let loaded = users.load_remote(created.id).await.unwrap();
    assert!(loaded.password.is_empty());
    let hoot = stored_password(&h, created.id);

    // A loaded user carries no password, so the stored hash stays
    let mut edited = loaded.clone();
    edited.email = "owl@example.com".to_string();
    users.update_remote(&edited).outcome().await.unwrap();
    let reloaded = users.load_remote(created.id).await.unwrap();
    assert_eq!(reloaded.email, "owl@example.com");
    assert_eq!(stored_password(&h, created.id), hoot);
    assert!(users.login("owl@example.com", "hoot").await.is_ok());

    // A new secret is hashed with a fresh salt
    created.email = "owl@example.com".to_string();
    created.password = "screech".to_string();
    users.update_remote(&created).outcome().await.unwrap();
    let screech = stored_password(&h, created.id);
    assert_ne!(screech, hoot);
    assert!(screech.starts_with("$argon2id$"));
    assert!(users.login("owl@example.com", "screech").await.is_ok());
    assert_eq!(
        users.login("owl@example.com", "hoot").await.unwrap_err(),
        RemoteError::NotFound
    );

    // Without identity nothing is sent
    let outcome = users.update_remote(&PrivateUser::default()).outcome().await;
    assert!(matches!(outcome, Err(RemoteError::Rejected(_))));
}

#[tokio::test]
async fn test_reads_hide_credentials() {
    let h = harness().await;
    let users = &h.managers.users;
    let created = create_user(&h, "owl", "owl@example.org", "hoot").await;

    let fields = users
        .load_remote_fields(&FieldMap::new().with(user::EMAIL, "owl@example.org"))
        .await
        .unwrap();
    assert_eq!(fields.id(&user::SCHEMA), Some(created.id));
    assert!(!fields.contains(user::PASSWORD));
    assert!(!fields.contains(user::KEY));

    // Only the account holder sees the key, never the hash
    let session = users.login("owl@example.org", "hoot").await.unwrap();
    assert!(session.user.password.is_empty());
    assert_eq!(session.user.key.len(), readeo::utils::KEY_LENGTH);

    // A password is no filter on its own
    let endpoint = h
        .context
        .remote
        .endpoint("users", Operation::Read)
        .unwrap()
        .term(user::PASSWORD, "hoot");
    assert_eq!(
        h.context.remote.send(&endpoint).await,
        Err(RemoteError::Status(400))
    );
    let endpoint = h
        .context
        .remote
        .endpoint("users", Operation::Count)
        .unwrap()
        .term(user::PASSWORD, stored_password(&h, created.id));
    assert_eq!(
        h.context.remote.send(&endpoint).await,
        Err(RemoteError::Status(400))
    );
}

#[tokio::test]
async fn test_uniqueness_checks() {
    let h = harness().await;
    let users = &h.managers.users;
    let created = create_user(&h, "testPseudo", "test@example.org", "secret").await;

    assert!(!users.is_available_remote(user::PSEUDO, "testPseudo", None).await);
    assert!(users.is_available_remote(user::PSEUDO, "freePseudo", None).await);
    assert!(
        users
            .is_available_remote(user::PSEUDO, "testPseudo", Some(created.id))
            .await
    );

    assert!(!users.is_email_available_remote("test@example.org", None).await);
    assert!(users.is_email_available_remote("free@example.org", None).await);
    assert!(users.is_pseudo_available_remote("free", None).await);
    // Too long for the pseudo column
    assert!(!users.is_pseudo_available_remote(&"x".repeat(60), None).await);

    assert!(!h.managers.cities.is_name_available_remote("Nantes", None).await);
    assert!(h.managers.cities.is_name_available_remote("Lyon", None).await);
}

#[tokio::test]
async fn test_soft_deleted_values_stay_taken() {
    let h = harness().await;
    let cities = &h.managers.cities;
    let mut brest = City::new("Brest");
    assert!(cities.save_remote(&mut brest).await);
    cities.soft_delete_remote(brest.id).outcome().await.unwrap();

    // The deleted row still holds the unique name
    assert!(cities.load_remote(brest.id).await.is_none());
    assert!(!cities.is_name_available_remote("Brest", None).await);
    assert!(cities.is_name_available_remote("Brest", Some(brest.id)).await);
    assert!(!cities.save_remote(&mut City::new("Brest")).await);

    let users = &h.managers.users;
    let owl = create_user(&h, "owl", "owl@example.org", "hoot").await;
    users.soft_delete_remote(owl.id).outcome().await.unwrap();
    assert!(!users.is_pseudo_available_remote("owl", None).await);
    assert!(!users.is_email_available_remote("owl@example.org", None).await);
    assert!(users.is_email_available_remote("owl@example.org", Some(owl.id)).await);

    // Once gone for good the name is free again
    cities.delete_remote(brest.id).outcome().await.unwrap();
    assert!(cities.is_name_available_remote("Brest", None).await);
}

#[tokio::test]
async fn test_login() {
    let h = harness().await;
    let users = &h.managers.users;
    let created = create_user(&h, "owl", "owl@example.org", "hoot").await;

    let session = users.login("owl@example.org", "hoot").await.unwrap();
    assert_eq!(session.user_id(), created.id);
    assert_eq!(session.user.pseudo, "owl");
    // Secrets never come back and keys are assigned by the store
    assert!(session.user.password.is_empty());
    assert_eq!(session.user.key.len(), readeo::utils::KEY_LENGTH);
    // Owned and referenced entities are hydrated
    assert_eq!(session.user.profile.avatar, "owl.png");
    assert_eq!(session.user.city.name, "Nantes");
    assert_eq!(session.user.country.name, "France");
    assert_eq!(session.public().profile.avatar, "owl.png");

    // The session user is cached once
    assert!(users.load_local(created.id).is_none());
    assert!(users.remember(&session));
    assert_eq!(users.load_local(created.id).unwrap().pseudo, "owl");
    assert!(users.remember(&session));
    assert_eq!(users.count_local(), 1);

    assert_eq!(
        users.login("owl@example.org", "wrong").await.unwrap_err(),
        RemoteError::NotFound
    );
    assert_eq!(
        users.login("nobody@example.org", "hoot").await.unwrap_err(),
        RemoteError::NotFound
    );
}

#[tokio::test]
async fn test_login_emits_events() {
    let h = harness().await;
    let users = &h.managers.users;
    create_user(&h, "owl", "owl@example.org", "hoot").await;

    let mut events = h.context.coordinator.subscribe();
    users.login("owl@example.org", "hoot").await.unwrap();
    users.wait_for_response().await;

    let mut user_events = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.key() == "User" {
            user_events.push(event);
        }
    }
    assert!(matches!(
        user_events.first(),
        Some(readeo::coordinator::RequestEvent::Finished { remaining: 0, .. })
    ));
    assert!(matches!(
        user_events.last(),
        Some(readeo::coordinator::RequestEvent::Drained { .. })
    ));
}

#[tokio::test]
async fn test_user_without_remote_profile_is_absent() {
    let h = harness().await;
    let users = &h.managers.users;
    let created = create_user(&h, "owl", "owl@example.org", "hoot").await;

    h.managers
        .profiles
        .soft_delete_remote(created.profile.id)
        .outcome()
        .await
        .unwrap();

    assert!(users.load_remote(created.id).await.is_none());
    assert_eq!(
        users.login("owl@example.org", "hoot").await.unwrap_err(),
        RemoteError::NotFound
    );
}

#[tokio::test]
async fn test_credential_soft_delete_and_restore() {
    let h = harness().await;
    let users = &h.managers.users;
    let created = create_user(&h, "owl", "owl@example.org", "hoot").await;

    // Wrong secret resolves to no account
    assert_eq!(
        users
            .soft_delete_remote_with_credentials("owl@example.org", "wrong")
            .outcome()
            .await,
        Err(RemoteError::NotFound)
    );

    users
        .soft_delete_remote_with_credentials("owl@example.org", "hoot")
        .outcome()
        .await
        .unwrap();
    assert!(users.load_remote(created.id).await.is_none());
    assert!(users.login("owl@example.org", "hoot").await.is_err());

    // Restoring needs the right secret too
    assert_eq!(
        users
            .restore_remote_with_credentials("owl@example.org", "wrong")
            .outcome()
            .await,
        Err(RemoteError::NotFound)
    );
    assert!(users.load_remote(created.id).await.is_none());

    users
        .restore_remote_with_credentials("owl@example.org", "hoot")
        .outcome()
        .await
        .unwrap();
    assert_eq!(users.load_remote(created.id).await.unwrap().pseudo, "owl");

    // Hard delete checks the secret as well
    assert_eq!(
        users
            .delete_remote_with_credentials("owl@example.org", "wrong")
            .outcome()
            .await,
        Err(RemoteError::NotFound)
    );

    users
        .delete_remote_with_credentials("owl@example.org", "hoot")
        .outcome()
        .await
        .unwrap();
    assert!(users.load_remote(created.id).await.is_none());
}

#[tokio::test]
async fn test_not_found_and_network_errors_differ() {
    let h = harness().await;
    let terms = FieldMap::new().with(author::ID, 404);
    assert_eq!(
        h.managers.authors.try_load_remote_fields(&terms).await,
        Ok(None)
    );

    // Nothing listens on a port that was just released
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = RemoteClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let offline = AuthorManager::new(ManagerContext::new(Database::memory_local().unwrap(), remote));

    assert!(matches!(
        offline.try_load_remote_fields(&terms).await,
        Err(RemoteError::Network(_))
    ));
    // Both collapse to absent or false for the plain operations
    assert!(offline.load_remote(404).await.is_none());
    assert!(!offline.is_available_remote(author::NAME, "Anyone", None).await);
    assert_eq!(offline.count_remote().await, None);

    let report = offline.import_all_from_remote().await;
    assert!(report.errored);
    assert_eq!(offline.count_local(), 0);
}

#[tokio::test]
async fn test_remote_rejects_unknown_fields() {
    let h = harness().await;
    let endpoint = h
        .context
        .remote
        .endpoint("authors", Operation::Read)
        .unwrap()
        .term("password", "x");

    assert_eq!(
        h.context.remote.send(&endpoint).await,
        Err(RemoteError::Status(400))
    );

    let endpoint = h.context.remote.endpoint("books", Operation::Read).unwrap();
    assert_eq!(
        h.context.remote.send(&endpoint).await,
        Err(RemoteError::NotFound)
    );
}

#[tokio::test]
async fn test_concurrent_writes_then_wait() {
    let h = harness().await;
    let authors = &h.managers.authors;

    let handles: Vec<_> = (0..5)
        .map(|i| authors.create_remote(&Author::new(format!("Writer {i}"))))
        .collect();
    authors.wait_for_response().await;
    assert_eq!(h.context.coordinator.pending(author::TABLE), 0);

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.outcome().await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    assert_eq!(authors.count_remote().await, Some(5));
}

#[tokio::test]
async fn test_review_remote_lifecycle() {
    let h = harness().await;
    let reviews = &h.managers.reviews;
    let owl = create_user(&h, "owl", "owl@example.org", "hoot").await;
    let lark = create_user(&h, "lark", "lark@example.org", "song").await;

    let key = ReviewKey::new(owl.id, 7);
    reviews
        .create_remote(&Review::new(key, "Slow start"))
        .outcome()
        .await
        .unwrap();
    reviews
        .create_remote(&Review::new(ReviewKey::new(lark.id, 7), "Loved it").shared(true))
        .outcome()
        .await
        .unwrap();

    // Not shared unless asked for
    let loaded = reviews.load_remote(key).await.unwrap();
    assert_eq!(loaded, Review::new(key, "Slow start"));

    // One review per user and book
    assert_eq!(
        reviews
            .create_remote(&Review::new(key, "Again"))
            .outcome()
            .await,
        Err(RemoteError::Status(409))
    );
    // Unknown users cannot review
    assert_eq!(
        reviews
            .create_remote(&Review::new(ReviewKey::new(999, 7), "Ghost"))
            .outcome()
            .await,
        Err(RemoteError::Status(409))
    );

    reviews
        .update_field_remote(key, review::SHARED, 1)
        .outcome()
        .await
        .unwrap();
    reviews
        .update_remote(&Review::new(key, "Great ending").shared(true))
        .outcome()
        .await
        .unwrap();
    let shared = reviews.query_shared_remote(7).await;
    assert_eq!(shared.len(), 2);
    assert!(shared.contains(&Review::new(key, "Great ending").shared(true)));
    assert!(reviews.query_shared_remote(8).await.is_empty());

    // Identity fields cannot be patched
    let outcome = reviews.update_field_remote(key, review::BOOK, 8).outcome().await;
    assert!(matches!(outcome, Err(RemoteError::Rejected(_))));
    let outcome = reviews
        .create_remote(&Review::new(ReviewKey::new(owl.id, 0), "No book"))
        .outcome()
        .await;
    assert!(matches!(outcome, Err(RemoteError::Rejected(_))));

    reviews.soft_delete_remote(key).outcome().await.unwrap();
    assert!(reviews.load_remote(key).await.is_none());
    assert_eq!(reviews.count_remote().await, Some(1));
    reviews.restore_remote(key).outcome().await.unwrap();
    assert_eq!(reviews.count_remote().await, Some(2));

    reviews.delete_remote(key).outcome().await.unwrap();
    assert!(reviews.load_remote(key).await.is_none());
    assert_eq!(
        reviews.delete_remote(key).outcome().await,
        Err(RemoteError::NotFound)
    );
}

#[tokio::test]
async fn test_review_import() {
    let h = harness().await;
    let reviews = &h.managers.reviews;
    assert_eq!(reviews.import_from_remote().await.fetched, 0);

    let owl = create_user(&h, "owl", "owl@example.org", "hoot").await;
    assert!(h.managers.users.cache_user(&owl));
    for book in 1..=3 {
        reviews
            .create_remote(&Review::new(ReviewKey::new(owl.id, book), format!("Book {book}")))
            .outcome()
            .await
            .unwrap();
    }

    let report = reviews.import_from_remote().await;
    assert_eq!((report.fetched, report.imported, report.failed), (3, 3, 0));
    assert_eq!(reviews.query_by_user_local(owl.id).len(), 3);
    assert_eq!(
        reviews.load_local(ReviewKey::new(owl.id, 2)).unwrap().review,
        "Book 2"
    );
}
