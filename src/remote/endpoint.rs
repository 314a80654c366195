use std::fmt;

use reqwest::{Method, Url};

use crate::{entities::FieldMap, error::RemoteError};

/// Operation suffix of a remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    SoftDelete,
    Restore,
    Count,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::SoftDelete => "softDelete",
            Operation::Restore => "restore",
            Operation::Count => "count",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::Create => Method::POST,
            Operation::Read | Operation::Count => Method::GET,
            Operation::Update | Operation::Delete | Operation::SoftDelete | Operation::Restore => {
                Method::PUT
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully addressed remote request: base URL, verb and `field=value` terms.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    operation: Operation,
    terms: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(api_url: &str, segment: &str, operation: Operation) -> Result<Self, RemoteError> {
        let raw = format!(
            "{api}/{segment}/{op}",
            api = api_url.trim_end_matches('/'),
            op = operation.as_str()
        );
        let base = Url::parse(&raw).map_err(|e| RemoteError::Rejected(format!("{raw}: {e}")))?;

        Ok(Self {
            base,
            operation,
            terms: Vec::new(),
        })
    }

    pub fn term(mut self, field: &str, value: impl fmt::Display) -> Self {
        self.terms.push((field.to_string(), value.to_string()));
        self
    }

    /// Appends every non-null entry of `fields` as a term.
    pub fn terms_from(mut self, fields: &FieldMap) -> Self {
        for (field, value) in fields.iter() {
            if !value.is_null() {
                self.terms.push((field.to_string(), value.to_string()));
            }
        }
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn method(&self) -> Method {
        self.operation.method()
    }

    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The URL with every term encoded into the query string.
    pub fn url(&self) -> Url {
        let mut url = self.base.clone();
        if !self.terms.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }
}
