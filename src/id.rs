//! Opaque record identifiers.
//!
//! Generated ids are `c` followed by 32 lowercase hex characters. Parsing is
//! more lenient and accepts any id that starts with `c` (either case) followed
//! by at least eight characters that are neither whitespace nor `-`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MIN_BODY_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("id is empty")]
    Empty,
    #[error("id must start with 'c'")]
    MissingPrefix,
    #[error("id must have at least {MIN_BODY_LEN} characters after the prefix")]
    TooShort,
    #[error("id contains an invalid character {0:?}")]
    InvalidCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        Self(format!("c{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let mut chars = raw.chars();
        match chars.next() {
            None => return Err(IdError::Empty),
            Some('c') | Some('C') => {}
            Some(_) => return Err(IdError::MissingPrefix),
        }

        let mut body_len = 0;
        for ch in chars {
            if ch.is_whitespace() || ch == '-' {
                return Err(IdError::InvalidCharacter(ch));
            }
            body_len += 1;
        }

        if body_len < MIN_BODY_LEN {
            return Err(IdError::TooShort);
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl rusqlite::ToSql for RecordId {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl rusqlite::types::FromSql for RecordId {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let raw = value.as_str()?;
        Self::parse(raw).map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
    }
}
