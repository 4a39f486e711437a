use log::debug;

use crate::error::DbError;
use crate::metadata::CatalogQuery;
use crate::sql::quote_ident;

/// How generated primary-key values are obtained for an insert.
///
/// The engine must call the accessor matching the declared strategy:
/// [`next_sequence_value`] before the insert for `PreInsertSequence`, or
/// [`last_generated_value`] after the insert for `PostInsertLookup`.
/// Calling the non-matching accessor is a caller contract violation, not a
/// recoverable adapter error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Fetch the next value from a sequence before inserting.
    PreInsertSequence,
    /// Insert first, then look the generated value up.
    PostInsertLookup,
}

impl KeyStrategy {
    pub fn requires_post_insert_lookup(self) -> bool {
        matches!(self, Self::PostInsertLookup)
    }
}

/// Fetch the next value of a sequence. Fails with
/// [`DbError::SequenceUnavailable`] when the sequence does not exist.
pub fn next_sequence_value<C: CatalogQuery + ?Sized>(
    conn: &mut C,
    schema: Option<&str>,
    sequence: &str,
) -> Result<i64, DbError> {
    let qualified = match schema {
        Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(sequence)),
        None => quote_ident(sequence),
    };
    let sql = format!("SELECT {qualified}.NEXTVAL FROM DUMMY");
    debug!("{sql}");

    conn.query_i64(&sql)?.ok_or_else(|| DbError::SequenceUnavailable {
        sequence: sequence.to_string(),
    })
}

/// Look up the key generated by the most recent insert on this connection.
pub fn last_generated_value<C: CatalogQuery + ?Sized>(conn: &mut C) -> Result<i64, DbError> {
    let sql = "SELECT CURRENT_IDENTITY_VALUE() FROM DUMMY";
    debug!("{sql}");

    conn.query_i64(sql)?.ok_or(DbError::MissingGeneratedKey)
}
