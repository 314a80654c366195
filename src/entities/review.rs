use crate::{
    entities::{FieldMap, FieldSource},
    error::HydrationError,
    schema::review::{BOOK, REVIEW, SHARED, USER},
};

/// Identity of a [`Review`]: one review per user and book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReviewKey {
    pub user: i64,
    pub book: i64,
}

impl ReviewKey {
    pub fn new(user: i64, book: i64) -> Self {
        Self { user, book }
    }

    pub fn to_fields(&self) -> FieldMap {
        FieldMap::new().with(USER, self.user).with(BOOK, self.book)
    }
}

/// A user's review of a book.
///
/// Unlike the other entities the identity is not generated by the remote
/// store; both halves are known before the first write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Review {
    pub user: i64,
    pub book: i64,
    pub review: String,
    pub shared: bool,
}

impl Review {
    pub fn new(key: ReviewKey, review: impl Into<String>) -> Self {
        Self {
            user: key.user,
            book: key.book,
            review: review.into(),
            shared: false,
        }
    }

    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    pub fn key(&self) -> ReviewKey {
        ReviewKey::new(self.user, self.book)
    }

    /// Either half of the identity is unset.
    pub fn is_empty(&self) -> bool {
        self.user == 0 || self.book == 0
    }

    pub fn decode<S: FieldSource + ?Sized>(source: &S) -> Result<Self, HydrationError> {
        Ok(Self {
            user: source.int(USER)?,
            book: source.int(BOOK)?,
            review: source.text(REVIEW)?,
            shared: source.opt_int(SHARED)?.is_some_and(|s| s != 0),
        })
    }

    pub fn to_fields(&self) -> FieldMap {
        self.key()
            .to_fields()
            .with(REVIEW, self.review.as_str())
            .with(SHARED, self.shared)
    }
}
