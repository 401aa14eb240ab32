//! # Supplier Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{delete_error, id_or_new};
use duka_core::validation::{validate_email, validate_required};
use duka_core::Supplier;

const SELECT_SUPPLIER: &str = "SELECT id, name, contact_number, email, address FROM supplier";

/// Repository for suppliers.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("{SELECT_SUPPLIER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!("{SELECT_SUPPLIER} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    /// Inserts a supplier. E-mail, when given, is unique.
    pub async fn insert(&self, supplier: &Supplier) -> DbResult<Supplier> {
        let stored = Supplier {
            id: id_or_new(&supplier.id),
            name: validate_required("name", &supplier.name, 200)?,
            ..supplier.clone()
        };
        if let Some(email) = &stored.email {
            validate_email(email)?;
        }

        debug!(id = %stored.id, name = %stored.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO supplier (id, name, contact_number, email, address)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.name)
        .bind(&stored.contact_number)
        .bind(&stored.email)
        .bind(&stored.address)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("supplier.email") => {
                DbError::duplicate("supplier email", stored.email.clone().unwrap_or_default())
            }
            err => err,
        })?;

        Ok(stored)
    }

    pub async fn update(&self, supplier: &Supplier) -> DbResult<()> {
        let name = validate_required("name", &supplier.name, 200)?;
        if let Some(email) = &supplier.email {
            validate_email(email)?;
        }

        let result = sqlx::query(
            r#"
            UPDATE supplier SET
                name = ?2,
                contact_number = ?3,
                email = ?4,
                address = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&supplier.id)
        .bind(&name)
        .bind(&supplier.contact_number)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", &supplier.id));
        }

        Ok(())
    }

    /// Deletes a supplier with no products or purchase orders.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM supplier WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, "Supplier", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }
}
