//! Table and column vocabulary shared by the local cache and the remote store.
//!
//! Column names double as remote query terms, so a field is spelled the same
//! way in a `WHERE` clause and in `?field=value`.

/// Modification marker column, present on every table.
pub const LAST_UPDATE: &str = "last_update";

/// Soft-delete flag column, present on every table.
pub const DELETED: &str = "deleted";

/// Format used for [`LAST_UPDATE`] values.
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Pagination terms understood by the `read` and `count` endpoints.
pub const LIMIT: &str = "limit";
pub const OFFSET: &str = "offset";

/// Read term that makes `read` and `count` also match soft-deleted records.
pub const WITH_DELETED: &str = "with_deleted";

/// Static description of one entity table.
#[derive(Debug)]
pub struct TableSchema {
    pub table: &'static str,
    /// Identity generated by the remote store. For tables keyed on several
    /// fields this is the first of them.
    pub id: &'static str,
    /// Every identity field.
    pub key: &'static [&'static str],
    /// Path segment of the remote endpoints.
    pub segment: &'static str,
    /// Columns of the local cache table, identity first.
    pub local_columns: &'static [&'static str],
    /// Columns of the remote table, identity first.
    pub remote_columns: &'static [&'static str],
    /// Secondary unique field usable for lookups.
    pub alternate_key: Option<&'static str>,
}

impl TableSchema {
    pub fn has_local_column(&self, column: &str) -> bool {
        column == LAST_UPDATE || column == DELETED || self.local_columns.contains(&column)
    }

    pub fn has_remote_column(&self, column: &str) -> bool {
        column == LAST_UPDATE || column == DELETED || self.remote_columns.contains(&column)
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.key.contains(&column)
    }

    /// Keyed on several fields, none of them generated.
    pub fn is_composite(&self) -> bool {
        self.key.len() > 1
    }
}

pub mod author {
    use super::TableSchema;

    pub const TABLE: &str = "Author";
    pub const ID: &str = "id_author";
    pub const NAME: &str = "name_author";

    pub const SCHEMA: TableSchema = TableSchema {
        table: TABLE,
        id: ID,
        key: &[ID],
        segment: "authors",
        local_columns: &[ID, NAME],
        remote_columns: &[ID, NAME],
        alternate_key: Some(NAME),
    };
}

pub mod country {
    use super::TableSchema;

    pub const TABLE: &str = "Country";
    pub const ID: &str = "id_country";
    pub const NAME: &str = "name_country";

    pub const SCHEMA: TableSchema = TableSchema {
        table: TABLE,
        id: ID,
        key: &[ID],
        segment: "countries",
        local_columns: &[ID, NAME],
        remote_columns: &[ID, NAME],
        alternate_key: Some(NAME),
    };
}

pub mod city {
    use super::TableSchema;

    pub const TABLE: &str = "City";
    pub const ID: &str = "id_city";
    pub const NAME: &str = "name_city";

    pub const SCHEMA: TableSchema = TableSchema {
        table: TABLE,
        id: ID,
        key: &[ID],
        segment: "cities",
        local_columns: &[ID, NAME],
        remote_columns: &[ID, NAME],
        alternate_key: Some(NAME),
    };
}

pub mod profile {
    use super::TableSchema;

    pub const TABLE: &str = "Profile";
    pub const ID: &str = "id_profile";
    pub const AVATAR: &str = "avatar";
    pub const DESCRIPTION: &str = "description";

    pub const SCHEMA: TableSchema = TableSchema {
        table: TABLE,
        id: ID,
        key: &[ID],
        segment: "profiles",
        local_columns: &[ID, AVATAR, DESCRIPTION],
        remote_columns: &[ID, AVATAR, DESCRIPTION],
        alternate_key: None,
    };
}

pub mod user {
    use super::TableSchema;

    pub const TABLE: &str = "User";
    pub const ID: &str = "id_user";
    pub const PSEUDO: &str = "pseudo";
    pub const PASSWORD: &str = "password";
    pub const EMAIL: &str = "email";
    pub const KEY: &str = "key";
    pub const PROFILE: &str = super::profile::ID;
    pub const CITY: &str = super::city::ID;
    pub const COUNTRY: &str = super::country::ID;

    pub const PSEUDO_SIZE: usize = 50;

    pub const SCHEMA: TableSchema = TableSchema {
        table: TABLE,
        id: ID,
        key: &[ID],
        segment: "users",
        local_columns: &[ID, PSEUDO, PROFILE],
        remote_columns: &[ID, PSEUDO, PASSWORD, EMAIL, KEY, PROFILE, CITY, COUNTRY],
        alternate_key: Some(PSEUDO),
    };
}

/// A user's review of a book, keyed on the pair.
pub mod review {
    use super::TableSchema;

    pub const TABLE: &str = "Review";
    pub const USER: &str = super::user::ID;
    pub const BOOK: &str = "id_book";
    pub const REVIEW: &str = "review";
    pub const SHARED: &str = "shared";

    pub const SCHEMA: TableSchema = TableSchema {
        table: TABLE,
        id: USER,
        key: &[USER, BOOK],
        segment: "reviews",
        local_columns: &[USER, BOOK, REVIEW, SHARED],
        remote_columns: &[USER, BOOK, REVIEW, SHARED],
        alternate_key: None,
    };
}

/// Every table in dependency order: referenced tables come first.
pub const ALL: [&TableSchema; 6] = [
    &country::SCHEMA,
    &city::SCHEMA,
    &author::SCHEMA,
    &profile::SCHEMA,
    &user::SCHEMA,
    &review::SCHEMA,
];

/// Finds a table by its remote path segment.
pub fn by_segment(segment: &str) -> Option<&'static TableSchema> {
    ALL.iter().copied().find(|s| s.segment == segment)
}

/// DDL of the local cache.
pub const LOCAL_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS Country (
    id_country INTEGER PRIMARY KEY,
    name_country TEXT UNIQUE NOT NULL,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS City (
    id_city INTEGER PRIMARY KEY,
    name_city TEXT UNIQUE NOT NULL,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS Author (
    id_author INTEGER PRIMARY KEY,
    name_author TEXT UNIQUE NOT NULL,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS Profile (
    id_profile INTEGER PRIMARY KEY,
    avatar TEXT,
    description TEXT,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS User (
    id_user INTEGER PRIMARY KEY,
    pseudo TEXT(50) UNIQUE NOT NULL,
    id_profile INTEGER NOT NULL,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT User_Profile_FK FOREIGN KEY (id_profile) REFERENCES Profile(id_profile)
);
CREATE TABLE IF NOT EXISTS Review (
    id_user INTEGER NOT NULL,
    id_book INTEGER NOT NULL,
    review TEXT NOT NULL,
    shared INTEGER NOT NULL DEFAULT 0,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT Review_PK PRIMARY KEY (id_user, id_book),
    CONSTRAINT Review_User_FK FOREIGN KEY (id_user) REFERENCES User(id_user) ON DELETE CASCADE
);
CREATE TRIGGER IF NOT EXISTS user_trigger AFTER DELETE ON User
FOR EACH ROW BEGIN
    DELETE FROM Profile WHERE Profile.id_profile = OLD.id_profile;
END;
"#;

/// DDL of the reference remote store.
pub const REMOTE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS Country (
    id_country INTEGER PRIMARY KEY AUTOINCREMENT,
    name_country TEXT UNIQUE NOT NULL,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS City (
    id_city INTEGER PRIMARY KEY AUTOINCREMENT,
    name_city TEXT UNIQUE NOT NULL,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS Author (
    id_author INTEGER PRIMARY KEY AUTOINCREMENT,
    name_author TEXT UNIQUE NOT NULL,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS Profile (
    id_profile INTEGER PRIMARY KEY AUTOINCREMENT,
    avatar TEXT,
    description TEXT,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS User (
    id_user INTEGER PRIMARY KEY AUTOINCREMENT,
    pseudo TEXT(50) UNIQUE NOT NULL,
    password TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    "key" TEXT NOT NULL,
    id_profile INTEGER NOT NULL REFERENCES Profile(id_profile),
    id_city INTEGER REFERENCES City(id_city),
    id_country INTEGER REFERENCES Country(id_country),
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS Review (
    id_user INTEGER NOT NULL REFERENCES User(id_user) ON DELETE CASCADE,
    id_book INTEGER NOT NULL,
    review TEXT NOT NULL,
    shared INTEGER NOT NULL DEFAULT 0,
    last_update TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (id_user, id_book)
);
"#;
