//! Relational implementation of [`CrudFacade`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use super::driver::SqlDriver;
use super::guard::ConflictGuard;
use super::query_builder;
use crate::config::RelationalConfig;
use crate::db::{
    CreateRequest, CrudError, CrudFacade, CrudResult, DeleteRequest, FieldMap, Record,
    UpdateRequest,
};

/// CRUD over a relational engine with guarded writes.
///
/// Owns its connection: nothing is shared through globals, and every
/// operation before [`connect`](CrudFacade::connect) fails with
/// [`CrudError::NotConnected`].
pub struct RelationalCrud<D: SqlDriver> {
    config: RelationalConfig,
    bootstrap: Option<PathBuf>,
    driver: Option<D>,
}

impl<D: SqlDriver> RelationalCrud<D> {
    pub fn new(config: RelationalConfig) -> Self {
        Self {
            config,
            bootstrap: None,
            driver: None,
        }
    }

    /// Run the script at `path` on connect instead of the embedded default.
    ///
    /// Only used when the configuration names no database.
    pub fn with_bootstrap(mut self, path: impl Into<PathBuf>) -> Self {
        self.bootstrap = Some(path.into());
        self
    }

    /// The open driver, if connected.
    #[cfg(test)]
    pub(crate) fn driver(&self) -> Option<&D> {
        self.driver.as_ref()
    }

    fn connected(&self, operation: &str) -> CrudResult<&D> {
        self.driver
            .as_ref()
            .ok_or_else(|| CrudError::not_connected(operation))
    }

    async fn bootstrap(&self, driver: &D) -> CrudResult<String> {
        let (label, script) = match &self.bootstrap {
            Some(path) => (path.display().to_string(), read_script(path)?),
            None => ("<embedded dbtodo.sql>".to_string(), D::DEFAULT_BOOTSTRAP.to_string()),
        };
        debug!(script = %label, "running bootstrap script");
        driver
            .run_script(&script)
            .await
            .map_err(|e| CrudError::Bootstrap {
                path: label,
                message: e.to_string(),
            })?;
        driver.current_database().await
    }
}

fn read_script(path: &Path) -> CrudResult<String> {
    std::fs::read_to_string(path).map_err(|e| CrudError::Bootstrap {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Reject empty field maps up front, before any round trip.
fn require_fields(map: &FieldMap, operation: &str, role: &str) -> CrudResult<()> {
    if map.is_empty() {
        return Err(CrudError::invalid_request(format!(
            "{} needs at least one {} field",
            operation, role
        )));
    }
    Ok(())
}

impl<D: SqlDriver> CrudFacade for RelationalCrud<D> {
    #[instrument(skip(self), fields(engine = D::NAME))]
    async fn connect(&mut self) -> CrudResult<String> {
        let driver = D::open(&self.config).await?;
        let database = match &self.config.database {
            Some(name) => name.clone(),
            None => self.bootstrap(&driver).await?,
        };
        self.driver = Some(driver);

        let status = format!("{} - connected to {}", D::NAME, database);
        info!("{}", status);
        Ok(status)
    }

    #[instrument(skip(self, request), fields(table = %request.origin))]
    async fn create(&self, request: CreateRequest) -> CrudResult<Record> {
        let driver = self.connected("create")?;
        require_fields(&request.fields, "create", "value")?;
        ConflictGuard::new(driver)
            .insert(&request.origin, &request.fields)
            .await
    }

    #[instrument(skip(self))]
    async fn read(&self, origin: &str) -> CrudResult<Vec<Record>> {
        let driver = self.connected("read")?;
        driver.fetch_all(&query_builder::select_all(origin)?).await
    }

    #[instrument(skip(self, request), fields(table = %request.origin))]
    async fn update(&self, request: UpdateRequest) -> CrudResult<Record> {
        let driver = self.connected("update")?;
        require_fields(&request.fields, "update", "value")?;
        require_fields(&request.criteria, "update", "criteria")?;
        ConflictGuard::new(driver)
            .update(&request.origin, &request.fields, &request.criteria)
            .await
    }

    #[instrument(skip(self, request), fields(table = %request.origin))]
    async fn delete(&self, request: DeleteRequest) -> CrudResult<String> {
        let driver = self.connected("delete")?;
        require_fields(&request.criteria, "delete", "criteria")?;
        let outcome = driver
            .execute(&query_builder::delete(&request.origin, &request.criteria)?)
            .await?;
        Ok(outcome.rows_affected.to_string())
    }
}
