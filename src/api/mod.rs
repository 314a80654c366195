//! # API Module
//!
//! HTTP endpoints of the reference remote store.
//!
//! Every collection is addressed by its path segment (`authors`, `cities`,
//! `countries`, `profiles`, `users`, `reviews`) followed by an operation:
//!
//! | Route | Verb | Answer |
//! |---|---|---|
//! | `/{segment}/read` | `GET` | JSON array of records, `404` when none match |
//! | `/{segment}/count` | `GET` | plain text count |
//! | `/{segment}/create` | `POST` | `201` and the new identity, empty for reviews |
//! | `/{segment}/update` | `PUT` | `200`, `404` for an unknown identity |
//! | `/{segment}/delete` | `PUT` | `200`, `404` for an unknown record |
//! | `/{segment}/softDelete` | `PUT` | `200`, `404` for an unknown record |
//! | `/{segment}/restore` | `PUT` | `200`, `404` for an unknown record |
//!
//! `GET` terms travel in the query string, the others as an urlencoded form.
//! Terms are `field=value` equality filters plus `limit`/`offset` on reads.
//! Reads skip soft-deleted records unless `with_deleted=1` is given.
//! Unknown fields answer `400`, constraint violations `409`. Reviews are
//! addressed by both `id_user` and `id_book`.
//!
//! Users can be addressed by `email` and `password` instead of their
//! identity. Passwords are stored as argon2 hashes which no read answers;
//! the user key is only answered to a read carrying both.

mod health;
mod records;

pub use health::health;
pub use records::{ApiError, count, create, delete, read, restore, soft_delete, update};
