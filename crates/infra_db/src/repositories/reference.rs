//! Seeded reference data: Malaysian states and car parts

use sqlx::PgConnection;

use core_kernel::{CarPartId, StateId};
use domain_warranty::{CarPart, MalaysianState};

use crate::error::DatabaseError;

/// Read-only access to the seeded lookup tables
pub struct ReferenceRepository;

impl ReferenceRepository {
    pub async fn list_states(conn: &mut PgConnection) -> Result<Vec<MalaysianState>, DatabaseError> {
        let rows = sqlx::query_as::<_, StateRow>("SELECT id, name, code FROM msia_states ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_state(
        conn: &mut PgConnection,
        id: StateId,
    ) -> Result<MalaysianState, DatabaseError> {
        sqlx::query_as::<_, StateRow>("SELECT id, name, code FROM msia_states WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("MalaysianState", id))
    }

    pub async fn list_car_parts(conn: &mut PgConnection) -> Result<Vec<CarPart>, DatabaseError> {
        let rows = sqlx::query_as::<_, CarPartRow>(
            "SELECT id, name, code, description FROM car_parts ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_car_part(
        conn: &mut PgConnection,
        id: CarPartId,
    ) -> Result<CarPart, DatabaseError> {
        sqlx::query_as::<_, CarPartRow>(
            "SELECT id, name, code, description FROM car_parts WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&mut *conn)
        .await?
        .map(Into::into)
        .ok_or_else(|| DatabaseError::not_found("CarPart", id))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StateRow {
    pub id: i32,
    pub name: String,
    pub code: String,
}

impl From<StateRow> for MalaysianState {
    fn from(row: StateRow) -> Self {
        MalaysianState {
            id: StateId::new(row.id),
            name: row.name,
            code: row.code,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CarPartRow {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

impl From<CarPartRow> for CarPart {
    fn from(row: CarPartRow) -> Self {
        CarPart {
            id: CarPartId::new(row.id),
            name: row.name,
            code: row.code,
            description: row.description,
        }
    }
}
