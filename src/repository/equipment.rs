//! Equipment repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::OperationalState,
        equipment::{CreateEquipment, Equipment, EquipmentQuery, UpdateEquipment},
    },
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// List equipment with optional filters
    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<Vec<Equipment>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 0;

        if query.category.is_some() {
            idx += 1;
            conditions.push(format!("category = ${}", idx));
        }
        if query.state.is_some() {
            idx += 1;
            conditions.push(format!("operational_state = ${}", idx));
        }
        if query.search.is_some() {
            idx += 1;
            conditions.push(format!(
                "(serial ILIKE ${i} OR brand ILIKE ${i} OR model ILIKE ${i} OR category ILIKE ${i})",
                i = idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT * FROM equipment{} ORDER BY serial", where_clause);

        let mut builder = sqlx::query_as::<_, Equipment>(&sql);
        if let Some(ref category) = query.category {
            builder = builder.bind(category);
        }
        if let Some(state) = query.state {
            builder = builder.bind(state);
        }
        if let Some(ref search) = query.search {
            builder = builder.bind(format!("%{}%", search));
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    /// Equipment that can be handed out right now: not retired, no active loan
    pub async fn list_available(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT e.* FROM equipment e
            WHERE e.operational_state != 'RETIRED'
              AND NOT EXISTS (
                  SELECT 1 FROM loans l
                  WHERE l.equipment_id = e.id AND l.state = 'ACTIVE'
              )
            ORDER BY e.serial
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create equipment. Fields arrive already normalized by the service.
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let result = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (serial, brand, model, category, operational_state, ram_gb, ssd_gb, os, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&data.serial)
        .bind(&data.brand)
        .bind(&data.model)
        .bind(&data.category)
        .bind(data.operational_state.unwrap_or(OperationalState::Operational))
        .bind(data.ram_gb)
        .bind(data.ssd_gb)
        .bind(&data.os)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(equipment) => Ok(equipment),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some("equipment_serial_key") => {
                Err(AppError::Conflict(format!(
                    "Serial {} is already registered",
                    data.serial
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update equipment
    pub async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.brand, "brand");
        add_field!(data.model, "model");
        add_field!(data.category, "category");
        add_field!(data.ram_gb, "ram_gb");
        add_field!(data.ssd_gb, "ssd_gb");
        add_field!(data.os, "os");
        add_field!(data.notes, "notes");

        let query = format!(
            "UPDATE equipment SET {} WHERE id = {} RETURNING *",
            sets.join(", "),
            id
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.brand);
        bind_field!(data.model);
        bind_field!(data.category);
        bind_field!(data.ram_gb);
        bind_field!(data.ssd_gb);
        bind_field!(data.os);
        bind_field!(data.notes);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Set operational state
    pub async fn set_state(&self, id: i32, state: OperationalState) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>(
            "UPDATE equipment SET operational_state = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(state)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Delete equipment
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }

    /// Distinct category values (open vocabulary; grows on first use)
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM equipment ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}
