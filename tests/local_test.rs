use std::time::Duration;

use readeo::entities::*;
use readeo::management::*;
use readeo::remote::RemoteClient;
use readeo::schema::{author, profile, review, user};
use readeo::store::Database;

// Local operations never reach the remote store, the URL is never dialed
fn local_context() -> ManagerContext {
    let local = Database::memory_local().unwrap();
    let remote = RemoteClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    ManagerContext::new(local, remote)
}

fn seeded_authors() -> AuthorManager {
    let authors = AuthorManager::new(local_context());
    for (id, name) in [(1, "Victor Hugo"), (2, "Emile Zola"), (3, "George Sand")] {
        assert!(authors.create_local(&Author::with_id(id, name)));
    }
    authors
}

#[test]
fn test_create_and_load_local() {
    let authors = seeded_authors();

    assert_eq!(authors.count_local(), 3);
    assert_eq!(
        authors.load_local(2),
        Some(Author::with_id(2, "Emile Zola"))
    );
    assert_eq!(authors.load_local(42), None);
}

#[test]
fn test_create_local_requires_identity() {
    let authors = AuthorManager::new(local_context());

    assert!(!authors.create_local(&Author::new("No identity")));
    assert!(!authors.create_local_fields(&FieldMap::new().with(author::NAME, "Nobody")));
    assert_eq!(authors.count_local(), 0);
}

#[test]
fn test_create_local_rejects_duplicates() {
    let authors = seeded_authors();

    // Same identity, then same unique name
    assert!(!authors.create_local(&Author::with_id(1, "Someone else")));
    assert!(!authors.create_local(&Author::with_id(9, "Victor Hugo")));
    assert_eq!(authors.count_local(), 3);
}

#[test]
fn test_create_local_fields_drops_unknown_columns() {
    let authors = AuthorManager::new(local_context());
    let fields = FieldMap::new()
        .with(author::ID, "7")
        .with(author::NAME, "Colette")
        .with("remote_only", "ignored");

    assert!(authors.create_local_fields(&fields));
    assert_eq!(authors.load_local(7), Some(Author::with_id(7, "Colette")));
}

#[test]
fn test_update_local() {
    let authors = seeded_authors();

    assert!(authors.update_local(&Author::with_id(3, "Aurore Dupin")));
    assert_eq!(authors.load_local(3).unwrap().name, "Aurore Dupin");

    // Nothing to update
    assert!(!authors.update_local(&Author::with_id(99, "Ghost")));
}

#[test]
fn test_update_field_local_stamps_marker() {
    let authors = seeded_authors();
    assert_eq!(authors.get_field_local("last_update", 1), None);

    assert!(authors.update_field_local(1, author::NAME, "V. Hugo"));
    assert_eq!(authors.get_field_local(author::NAME, 1).as_deref(), Some("V. Hugo"));

    let stamp = authors.get_field_local("last_update", 1);
    assert!(stamp.is_some());

    // Other rows are left alone
    assert_eq!(authors.get_field_local("last_update", 2), None);
}

#[test]
fn test_update_field_local_refuses_identity_and_unknown_fields() {
    let authors = seeded_authors();

    assert!(!authors.update_field_local(1, author::ID, 10));
    assert!(!authors.update_field_local(1, "unknown", "value"));
    assert!(authors.load_local(1).is_some());
    assert!(authors.load_local(10).is_none());
}

#[test]
fn test_query_local() {
    let authors = seeded_authors();

    assert_eq!(authors.query_all_local().len(), 3);

    let found = authors.query_filtered_local(author::NAME, "or");
    let names: Vec<&str> = found.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Victor Hugo", "George Sand"]);

    // LIKE matching ignores ASCII case
    assert_eq!(authors.query_filtered_local(author::NAME, "zOLA").len(), 1);

    assert!(authors.query_by_name_local("Balzac").is_empty());
}

#[test]
fn test_search_local() {
    let authors = seeded_authors();

    let names = |found: Vec<Author>| -> Vec<String> { found.into_iter().map(|a| a.name).collect() };
    assert_eq!(
        names(authors.search_local(author::NAME, None)),
        vec!["Victor Hugo", "Emile Zola", "George Sand"]
    );
    assert_eq!(
        names(authors.search_local(author::NAME, Some("or"))),
        vec!["Victor Hugo", "George Sand"]
    );
    assert!(authors.search_local(author::NAME, Some("Balzac")).is_empty());
}

#[test]
fn test_lookup_by_name_local() {
    let authors = seeded_authors();

    assert_eq!(authors.load_local_by_name("George Sand").unwrap().id, 3);
    assert_eq!(authors.get_id_local_by_name("Emile Zola"), Some(2));
    assert_eq!(authors.get_id_local(author::NAME, "Balzac"), None);
}

#[test]
fn test_soft_deleted_rows_are_hidden() {
    let authors = seeded_authors();

    assert!(authors.update_field_local(2, "deleted", 1));
    assert_eq!(authors.count_local(), 2);
    assert!(authors.load_local(2).is_none());
    assert_eq!(authors.query_all_local().len(), 2);

    assert!(authors.update_field_local(2, "deleted", 0));
    assert!(authors.load_local(2).is_some());
}

#[test]
fn test_delete_local() {
    let authors = seeded_authors();

    assert!(authors.delete_local(1));
    assert!(!authors.delete_local(1));
    assert_eq!(authors.count_local(), 2);
}

#[test]
fn test_profile_helpers() {
    let profiles = ProfileManager::new(local_context());
    let mut created = Profile::new("cat.png", "Likes poetry");
    created.set_id(4);

    assert!(profiles.ensure_local(&created));
    // Already there, nothing is inserted twice
    assert!(profiles.ensure_local(&created));
    assert_eq!(profiles.count_local(), 1);

    assert!(profiles.set_avatar_local(4, "dog.png"));
    assert!(profiles.set_description_local(4, "Likes novels"));
    let loaded = profiles.load_local(4).unwrap();
    assert_eq!(loaded.avatar, "dog.png");
    assert_eq!(loaded.description, "Likes novels");
}

fn seeded_users() -> UserManager {
    let users = UserManager::new(local_context());
    let mut profile = Profile::new("owl.png", "Night reader");
    profile.set_id(11);

    assert!(users.create_local(&PublicUser::new(1, "owl", profile)));
    users
}

#[test]
fn test_user_create_brings_profile() {
    let users = seeded_users();

    assert_eq!(users.profiles().count_local(), 1);
    let loaded = users.load_local(1).unwrap();
    assert_eq!(loaded.pseudo, "owl");
    // Profile is hydrated eagerly
    assert_eq!(loaded.profile.avatar, "owl.png");
    assert_eq!(loaded.profile.description, "Night reader");
}

#[test]
fn test_user_lookup_by_pseudo() {
    let users = seeded_users();

    assert_eq!(users.load_local_by_pseudo("owl").unwrap().id, 1);
    assert!(users.load_local_by_pseudo("lark").is_none());
    assert_eq!(
        users.get_field_by_pseudo_local(user::PROFILE, "owl").as_deref(),
        Some("11")
    );
    assert_eq!(users.get_id_local(user::PSEUDO, "owl"), Some(1));
}

#[test]
fn test_user_without_profile_is_absent() {
    let users = seeded_users();

    // Hide the profile: the user load degrades to a miss
    assert!(users.profiles().update_field_local(11, "deleted", 1));
    assert!(users.load_local(1).is_none());
    assert!(users.query_all_local().is_empty());

    // The row itself is still there
    assert_eq!(users.count_local(), 1);
}

#[test]
fn test_user_delete_removes_profile() {
    let users = seeded_users();

    assert!(users.delete_local(1));
    assert_eq!(users.count_local(), 0);
    assert!(users.profiles().load_local(11).is_none());
}

#[test]
fn test_user_update_field_local() {
    let users = seeded_users();

    assert!(users.update_field_local(1, user::PSEUDO, "barn owl"));
    assert_eq!(users.load_local(1).unwrap().pseudo, "barn owl");

    // Credentials never reach the cache
    assert!(!users.update_field_local(1, user::PASSWORD, "secret"));
    assert!(!users.update_field_local(1, user::ID, 2));
}

#[test]
fn test_cache_private_user() {
    let users = UserManager::new(local_context());
    let mut private = PrivateUser::new(
        "lark",
        "digest",
        "lark@example.org",
        Profile::new("lark.png", ""),
        City::reference(0),
        Country::reference(0),
    );
    private.set_id(5);
    private.profile.set_id(6);

    assert!(users.cache_user(&private));
    let loaded = users.load_local(5).unwrap();
    assert_eq!(loaded, private.to_public());
    assert_eq!(users.get_field_local(user::PROFILE, 5).as_deref(), Some("6"));
    assert!(users.get_field_local(profile::AVATAR, 5).is_none());
}

#[test]
fn test_managers_count_local() {
    let managers = Managers::new(local_context());
    assert!(managers.countries.create_local(&Country::with_id(1, "France")));
    assert!(managers.cities.create_local(&City::with_id(1, "Nantes")));
    assert!(managers.cities.create_local(&City::with_id(2, "Brest")));

    let counts = managers.count_local();
    assert_eq!(counts.len(), 6);
    assert!(counts.contains(&("Country", 1)));
    assert!(counts.contains(&("City", 2)));
    assert!(counts.contains(&("User", 0)));
    assert!(counts.contains(&("Review", 0)));
}

fn seeded_reviews() -> (UserManager, ReviewManager) {
    let context = local_context();
    let users = UserManager::new(context.clone());
    let reviews = ReviewManager::new(context);
    for (id, pseudo) in [(1, "owl"), (2, "lark")] {
        let mut profile = Profile::new(format!("{pseudo}.png"), "");
        profile.set_id(10 + id);
        assert!(users.create_local(&PublicUser::new(id, pseudo, profile)));
    }

    assert!(reviews.create_local(&Review::new(ReviewKey::new(1, 7), "Slow start")));
    assert!(reviews.create_local(&Review::new(ReviewKey::new(2, 7), "Loved it").shared(true)));
    assert!(reviews.create_local(&Review::new(ReviewKey::new(1, 8), "Too long")));
    (users, reviews)
}

#[test]
fn test_review_create_and_load_local() {
    let (_, reviews) = seeded_reviews();

    assert_eq!(reviews.count_local(), 3);
    let key = ReviewKey::new(2, 7);
    assert_eq!(
        reviews.load_local(key),
        Some(Review::new(key, "Loved it").shared(true))
    );
    assert!(reviews.load_local(ReviewKey::new(2, 8)).is_none());

    // One review per user and book
    assert!(!reviews.create_local(&Review::new(key, "Again")));
    // Both identity fields are required
    assert!(!reviews.create_local(&Review::new(ReviewKey::new(0, 9), "No user")));
    assert!(!reviews.create_local_fields(&FieldMap::new().with(review::USER, 1).with(review::REVIEW, "No book")));
    // Rows of unknown users are refused
    assert!(!reviews.create_local(&Review::new(ReviewKey::new(3, 7), "Ghost")));
    assert_eq!(reviews.count_local(), 3);
}

#[test]
fn test_review_shared_defaults_to_false() {
    let (_, reviews) = seeded_reviews();
    let fields = FieldMap::new()
        .with(review::USER, 2)
        .with(review::BOOK, 9)
        .with(review::REVIEW, "Short");

    assert!(reviews.create_local_fields(&fields));
    assert!(!reviews.load_local(ReviewKey::new(2, 9)).unwrap().shared);
}

#[test]
fn test_review_queries_local() {
    let (_, reviews) = seeded_reviews();

    assert_eq!(reviews.query_all_local().len(), 3);
    assert_eq!(reviews.query_by_user_local(1).len(), 2);
    assert_eq!(reviews.query_by_book_local(7).len(), 2);
    assert_eq!(
        reviews.query_shared_local(7),
        vec![Review::new(ReviewKey::new(2, 7), "Loved it").shared(true)]
    );
    assert!(reviews.query_shared_local(8).is_empty());

    let keys: Vec<ReviewKey> = reviews
        .search_local(review::REVIEW, Some("o"))
        .iter()
        .map(Review::key)
        .collect();
    assert_eq!(
        keys,
        vec![ReviewKey::new(1, 7), ReviewKey::new(1, 8), ReviewKey::new(2, 7)]
    );
}

#[test]
fn test_review_update_local() {
    let (_, reviews) = seeded_reviews();
    let key = ReviewKey::new(1, 7);

    assert!(reviews.update_local(&Review::new(key, "Great ending").shared(true)));
    assert_eq!(reviews.load_local(key).unwrap().review, "Great ending");
    assert!(reviews.update_field_local(key, review::SHARED, false));
    assert!(!reviews.load_local(key).unwrap().shared);

    // Neither identity field can be patched
    assert!(!reviews.update_field_local(key, review::USER, 2));
    assert!(!reviews.update_field_local(key, review::BOOK, 9));
    assert!(!reviews.update_field_local(key, "unknown", 1));
    assert!(!reviews.update_field_local(ReviewKey::new(1, 99), review::REVIEW, "x"));
    assert!(reviews.load_local(key).is_some());
}

#[test]
fn test_review_delete_local() {
    let (users, reviews) = seeded_reviews();

    assert!(reviews.delete_local(ReviewKey::new(1, 8)));
    assert!(!reviews.delete_local(ReviewKey::new(1, 8)));
    assert_eq!(reviews.count_local(), 2);

    // Deleting a user drops their reviews
    assert!(users.delete_local(1));
    assert_eq!(reviews.query_all_local(), vec![Review::new(ReviewKey::new(2, 7), "Loved it").shared(true)]);
}
