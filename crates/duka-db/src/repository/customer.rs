//! # Customer Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{delete_error, id_or_new};
use duka_core::validation::validate_email;
use duka_core::Customer;

const SELECT_CUSTOMER: &str = "SELECT id, first_name, last_name, phone, email FROM customer";

/// Repository for customers.
///
/// Deleting a customer keeps their sales; the sale's customer ref is cleared.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Vec<Customer>> {
        let customers =
            sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE phone = ?1"))
                .bind(phone.trim())
                .fetch_all(&self.pool)
                .await?;

        Ok(customers)
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "{SELECT_CUSTOMER} ORDER BY last_name, first_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        if let Some(email) = &customer.email {
            validate_email(email)?;
        }
        let stored = Customer {
            id: id_or_new(&customer.id),
            ..customer.clone()
        };

        debug!(id = %stored.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customer (id, first_name, last_name, phone, email)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.first_name)
        .bind(&stored.last_name)
        .bind(&stored.phone)
        .bind(&stored.email)
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        if let Some(email) = &customer.email {
            validate_email(email)?;
        }

        let result = sqlx::query(
            r#"
            UPDATE customer SET
                first_name = ?2,
                last_name = ?3,
                phone = ?4,
                email = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customer WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, "Customer", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::fixture;
    use duka_core::Customer;

    #[tokio::test]
    async fn test_insert_and_find_by_phone() {
        let fx = fixture().await;
        let repo = fx.db.customers();

        let stored = repo
            .insert(&Customer {
                id: String::new(),
                first_name: Some("Wanjiru".to_string()),
                last_name: Some("Kamau".to_string()),
                phone: Some("0712345678".to_string()),
                email: None,
            })
            .await
            .unwrap();

        let found = repo.find_by_phone(" 0712345678 ").await.unwrap();
        assert_eq!(found, vec![stored.clone()]);
        assert_eq!(stored.display_name(), "Wanjiru Kamau");
    }
}
