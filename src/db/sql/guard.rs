//! Guarded writes: primary-key existence checks around INSERT and UPDATE.
//!
//! The write call does not return the mutated row, so every guarded write
//! takes three steps: check that the target key slot is free, write, then
//! read the row back by its resolved key. The steps are not wrapped in a
//! transaction: a concurrent writer can claim the same key between the check
//! and the write. That window is accepted; the engine's own constraints are
//! the last line of defense.
//!
//! A taken key is not an error. The write is skipped and an empty record is
//! returned.

use tracing::{debug, info, warn};

use super::driver::SqlDriver;
use super::query_builder;
use super::schema;
use super::value_coder::{code_value, encode};
use crate::db::{CrudResult, FieldMap, PrimaryKeyInfo, Record, Scalar};

/// Where the key value for a check comes from.
#[derive(Debug, Clone)]
pub enum KeyCandidate<'a> {
    /// A field map; the value under the key column's name is used.
    Fields(&'a FieldMap),
    /// An already-resolved key value, e.g. an id the engine just generated.
    Resolved(Scalar),
}

/// Pre-write existence checks against one driver.
pub struct ConflictGuard<'a, D: SqlDriver> {
    driver: &'a D,
}

impl<'a, D: SqlDriver> ConflictGuard<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Introspect `table` and code the candidate's key value as `last_insert`.
    ///
    /// `last_insert` stays `None` when the candidate carries no (or a null)
    /// value for the key column.
    pub async fn check_key_state(
        &self,
        table: &str,
        candidate: KeyCandidate<'_>,
    ) -> CrudResult<PrimaryKeyInfo> {
        let mut info = schema::describe(self.driver, table).await?;
        let value = match candidate {
            KeyCandidate::Fields(fields) => fields
                .get(info.key_name())
                .filter(|value| !value.is_null())
                .cloned(),
            KeyCandidate::Resolved(value) => Some(value),
        };
        info.last_insert = value.map(|value| encode(info.key_name(), &value));
        Ok(info)
    }

    /// Insert `fields` unless their key is already taken.
    ///
    /// Returns the stored row, or an empty record when the key was taken.
    pub async fn insert(&self, table: &str, fields: &FieldMap) -> CrudResult<Record> {
        let info = self
            .check_key_state(table, KeyCandidate::Fields(fields))
            .await?;
        if self.is_occupied(&info).await? {
            info!(table, key = info.key_name(), "duplicate key, create skipped");
            return Ok(Record::new());
        }

        let outcome = self
            .driver
            .execute(&query_builder::insert(table, fields)?)
            .await?;
        if outcome.rows_affected == 0 {
            return Ok(Record::new());
        }

        // A caller-supplied key wins; otherwise use the id the engine generated
        // for the key column. SQLite reports a rowid even for tables whose key
        // it does not generate, so that id only counts for generated keys.
        let resolved = match fields.get(info.key_name()).filter(|v| !v.is_null()) {
            Some(value) => value.clone(),
            None if info.column.generated && outcome.last_insert_id > 0 => {
                Scalar::Integer(outcome.last_insert_id)
            }
            None => {
                warn!(
                    table,
                    key = info.key_name(),
                    "row inserted without a resolvable key; cannot read it back"
                );
                return Ok(Record::new());
            }
        };

        let info = self
            .check_key_state(table, KeyCandidate::Resolved(resolved))
            .await?;
        self.fetch_occupant(&info)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Update the rows matched by `criteria` unless the new key value already
    /// belongs to another row.
    ///
    /// Returns the post-update row, or an empty record when nothing matched
    /// or the new key collides.
    pub async fn update(
        &self,
        table: &str,
        fields: &FieldMap,
        criteria: &FieldMap,
    ) -> CrudResult<Record> {
        let info = self
            .check_key_state(table, KeyCandidate::Fields(fields))
            .await?;

        if targets_own_key(&info, criteria) {
            debug!(table, "update keeps the targeted key; collision check skipped");
        } else if self.is_occupied(&info).await? {
            info!(table, key = info.key_name(), "new key already taken, update skipped");
            return Ok(Record::new());
        }

        let outcome = self
            .driver
            .execute(&query_builder::update(table, fields, criteria)?)
            .await?;
        if outcome.rows_affected == 0 {
            debug!(table, "update criteria matched no row");
            return Ok(Record::new());
        }

        let predicate = reselect_predicate(fields, criteria);
        fetch_first(self.driver, table, &predicate)
            .await
            .map(Option::unwrap_or_default)
    }

    async fn is_occupied(&self, info: &PrimaryKeyInfo) -> CrudResult<bool> {
        Ok(self.fetch_occupant(info).await?.is_some())
    }

    async fn fetch_occupant(&self, info: &PrimaryKeyInfo) -> CrudResult<Option<Record>> {
        match &info.last_insert {
            Some(predicate) => fetch_first(self.driver, &info.table, predicate).await,
            None => Ok(None),
        }
    }
}

async fn fetch_first<D: SqlDriver>(
    driver: &D,
    table: &str,
    predicate: &FieldMap,
) -> CrudResult<Option<Record>> {
    let rows = driver
        .fetch_all(&query_builder::select_where(table, predicate)?)
        .await?;
    Ok(rows.into_iter().next())
}

/// True when the new key equals the key the criteria already select, i.e. the
/// row would only "collide" with itself.
fn targets_own_key(info: &PrimaryKeyInfo, criteria: &FieldMap) -> bool {
    let (Some(new_key), Some(current)) = (&info.last_insert, criteria.get(info.key_name())) else {
        return false;
    };
    new_key.get(info.key_name()) == Some(&code_value(current))
}

/// Criteria for reading a row back after UPDATE: any criteria column the
/// SET map changed is replaced by its new (coded) value.
pub fn reselect_predicate(fields: &FieldMap, criteria: &FieldMap) -> FieldMap {
    criteria
        .iter()
        .map(|(column, value)| match fields.get(column) {
            Some(updated) => (column.clone(), code_value(updated)),
            None => (column.clone(), value.clone()),
        })
        .collect()
}
