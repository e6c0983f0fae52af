use itr_core::error::AppError;
use itr_core::query::{IncidentPage, IncidentQuery};
use rusqlite::Connection;

/// Anything that can answer list retrievals for the list state machine.
pub trait IncidentSource {
    fn fetch_incidents(&self, query: &IncidentQuery) -> Result<IncidentPage, AppError>;

    /// Distinct service names for populating the service filter.
    fn list_services(&self) -> Result<Vec<String>, AppError>;
}

/// Reads straight from a local incident database.
pub struct LocalSource {
    conn: Connection,
}

impl LocalSource {
    /// Wrap an open connection, installing the SQL functions search depends on.
    pub fn new(conn: Connection) -> Result<Self, AppError> {
        itr_core::db::register_functions(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl IncidentSource for LocalSource {
    fn fetch_incidents(&self, query: &IncidentQuery) -> Result<IncidentPage, AppError> {
        itr_core::repo::search_incidents(&self.conn, query)
    }

    fn list_services(&self) -> Result<Vec<String>, AppError> {
        itr_core::repo::list_services(&self.conn)
    }
}
