//! Document store implementation of [`CrudFacade`] on SurrealDB.
//!
//! Collections are SurrealDB tables. A document's record key is exposed as
//! `_id` and the raw record id never leaves this module.

use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::{debug, info, instrument};

use super::identifier::{ID_FIELD, coerce_id, split_id, validate_field_name};
use crate::config::DocumentConfig;
use crate::db::{
    CreateRequest, CrudError, CrudFacade, CrudResult, DeleteRequest, FieldMap, Record, Scalar,
    UpdateRequest,
};

/// Projection shared by every read: all properties plus the record key as `_id`.
const PROJECTION: &str = "SELECT *, record::id(id) AS _id OMIT id";

/// CRUD over a SurrealDB namespace/database.
pub struct DocumentCrud {
    config: DocumentConfig,
    db: Option<Surreal<Any>>,
}

impl DocumentCrud {
    pub fn new(config: DocumentConfig) -> Self {
        Self { config, db: None }
    }

    fn connected(&self, operation: &str) -> CrudResult<&Surreal<Any>> {
        self.db
            .as_ref()
            .ok_or_else(|| CrudError::not_connected(operation))
    }
}

/// A WHERE clause over bound parameters `$c0`, `$c1`, ...
#[derive(Debug, PartialEq)]
struct Filter {
    clause: String,
    params: Vec<(String, Scalar)>,
}

impl Filter {
    /// Build from criteria. `_id` is matched against the record id; every
    /// other property is compared as is.
    fn from_criteria(criteria: &FieldMap) -> CrudResult<Self> {
        if criteria.is_empty() {
            return Err(CrudError::invalid_request(
                "criteria needs at least one field",
            ));
        }

        let mut terms = Vec::with_capacity(criteria.len());
        let mut params = Vec::with_capacity(criteria.len());
        for (i, (name, value)) in criteria.iter().enumerate() {
            let param = format!("c{}", i);
            if name == ID_FIELD {
                terms.push(format!("id = type::thing($tb, ${})", param));
                params.push((param, coerce_id(value)?));
            } else {
                validate_field_name(name)?;
                terms.push(format!("`{}` = ${}", name, param));
                params.push((param, value.clone()));
            }
        }

        Ok(Self {
            clause: terms.join(" AND "),
            params,
        })
    }

    /// Statement binding the first matching record id (as a 0/1 element
    /// array) to `$target`.
    fn first_target(&self) -> String {
        format!(
            "LET $target = (SELECT VALUE id FROM type::table($tb) WHERE {} LIMIT 1);",
            self.clause
        )
    }
}

/// Flatten a returned document into a record. The raw `id` is dropped and
/// nested values become JSON text.
fn into_record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter(|(name, _)| name != "id")
            .map(|(name, value)| (name, Scalar::from_json(value)))
            .collect(),
        _ => Record::new(),
    }
}

impl CrudFacade for DocumentCrud {
    #[instrument(skip(self), fields(uri = %self.config.uri))]
    async fn connect(&mut self) -> CrudResult<String> {
        let db = any::connect(self.config.uri.as_str())
            .await
            .map_err(|e| CrudError::Connection {
                message: format!("failed to open '{}': {}", self.config.uri, e),
            })?;

        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await
            .map_err(|e| CrudError::Connection {
                message: format!("sign-in failed: {}", e),
            })?;
        }

        db.use_ns(&self.config.namespace)
            .use_db(&self.config.database)
            .await
            .map_err(|e| CrudError::Connection {
                message: format!(
                    "failed to use namespace '{}' and database '{}': {}",
                    self.config.namespace, self.config.database, e
                ),
            })?;
        self.db = Some(db);

        let status = format!("SurrealDB - connected to {}", self.config.database);
        info!("{}", status);
        Ok(status)
    }

    #[instrument(skip(self, request), fields(collection = %request.origin))]
    async fn create(&self, request: CreateRequest) -> CrudResult<Record> {
        let db = self.connected("create")?;
        if request.fields.is_empty() {
            return Err(CrudError::invalid_request(
                "create needs at least one value field",
            ));
        }
        let (id, content) = split_id(&request.fields)?;

        let target = if id.is_some() {
            "type::thing($tb, $id)"
        } else {
            "type::table($tb)"
        };
        let sql = format!(
            "LET $created = (CREATE ONLY {} CONTENT $data);\n{} FROM $created.id;",
            target, PROJECTION
        );
        debug!(%sql, "surreal create");

        let mut query = db
            .query(sql)
            .bind(("tb", request.origin.clone()))
            .bind(("data", content));
        if let Some(id) = id {
            query = query.bind(("id", id));
        }
        let mut response = query.await?.check()?;
        let rows: Vec<serde_json::Value> = response.take(1)?;

        Ok(rows.into_iter().next().map(into_record).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn read(&self, origin: &str) -> CrudResult<Vec<Record>> {
        let db = self.connected("read")?;
        let mut response = db
            .query(format!("{} FROM type::table($tb);", PROJECTION))
            .bind(("tb", origin.to_string()))
            .await?
            .check()?;
        let rows: Vec<serde_json::Value> = response.take(0)?;

        Ok(rows.into_iter().map(into_record).collect())
    }

    #[instrument(skip(self, request), fields(collection = %request.origin))]
    async fn update(&self, request: UpdateRequest) -> CrudResult<Record> {
        let db = self.connected("update")?;
        if request.fields.is_empty() {
            return Err(CrudError::invalid_request(
                "update needs at least one value field",
            ));
        }
        if request.fields.contains_key(ID_FIELD) {
            return Err(CrudError::invalid_request("`_id` cannot be updated"));
        }
        let filter = Filter::from_criteria(&request.criteria)?;

        // Find-first-and-modify; never creates a document.
        let sql = format!(
            "{}\nUPDATE $target MERGE $data;\n{} FROM $target;",
            filter.first_target(),
            PROJECTION
        );
        debug!(%sql, "surreal update");

        let mut query = db
            .query(sql)
            .bind(("tb", request.origin.clone()))
            .bind(("data", request.fields));
        for param in filter.params {
            query = query.bind(param);
        }
        let mut response = query.await?.check()?;
        let rows: Vec<serde_json::Value> = response.take(2)?;

        Ok(rows.into_iter().next().map(into_record).unwrap_or_default())
    }

    #[instrument(skip(self, request), fields(collection = %request.origin))]
    async fn delete(&self, request: DeleteRequest) -> CrudResult<String> {
        let db = self.connected("delete")?;
        let filter = Filter::from_criteria(&request.criteria)?;

        let sql = format!(
            "{}\nDELETE $target;\nRETURN array::len($target);",
            filter.first_target()
        );
        debug!(%sql, "surreal delete");

        let mut query = db.query(sql).bind(("tb", request.origin.clone()));
        for param in filter.params {
            query = query.bind(param);
        }
        let mut response = query.await?.check()?;
        let deleted: Option<i64> = response.take(2)?;

        Ok(deleted.unwrap_or(0).to_string())
    }
}
