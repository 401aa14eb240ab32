//! # Discount Repository
//!
//! Stores discount schemes and hands the active set to the resolver in
//! duka-core. Resolution itself never touches the database.
//!
//! ```text
//! record_sale ──► list_active_on(sale_date) ──► duka_core::resolve_discount
//! ```

use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{delete_error, id_or_new};
use duka_core::validation::{validate_discount_value, validate_discount_window, validate_required};
use duka_core::{Discount, Product};

use super::product::SELECT_PRODUCT;

const SELECT_DISCOUNT: &str = r#"
    SELECT id, name, discount_type, value_hundredths, start_date, end_date, is_active
    FROM discount
"#;

const SELECT_ACTIVE_ON: &str = r#"
    SELECT id, name, discount_type, value_hundredths, start_date, end_date, is_active
    FROM discount
    WHERE is_active = 1 AND start_date <= ?1 AND end_date >= ?1
    ORDER BY name
"#;

/// Repository for discounts and their product tags.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(&format!("{SELECT_DISCOUNT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(discount)
    }

    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let discounts =
            sqlx::query_as::<_, Discount>(&format!("{SELECT_DISCOUNT} ORDER BY start_date, name"))
                .fetch_all(&self.pool)
                .await?;

        Ok(discounts)
    }

    /// Discounts that are active with `start_date ≤ date ≤ end_date`.
    pub async fn list_active_on(&self, date: NaiveDate) -> DbResult<Vec<Discount>> {
        list_active_on(&self.pool, date).await
    }

    /// Inserts a discount after checking its value and window.
    pub async fn insert(&self, discount: &Discount) -> DbResult<Discount> {
        let stored = Discount {
            id: id_or_new(&discount.id),
            name: validate_required("name", &discount.name, 100)?,
            ..discount.clone()
        };
        validate_discount_value(stored.discount_type, stored.value_hundredths)?;
        validate_discount_window(stored.start_date, stored.end_date)?;

        debug!(
            id = %stored.id,
            name = %stored.name,
            discount_type = stored.discount_type.as_str(),
            value = stored.value_hundredths,
            "Inserting discount"
        );

        sqlx::query(
            r#"
            INSERT INTO discount (
                id, name, discount_type, value_hundredths, start_date, end_date, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.name)
        .bind(stored.discount_type)
        .bind(stored.value_hundredths)
        .bind(stored.start_date)
        .bind(stored.end_date)
        .bind(stored.is_active)
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    pub async fn update(&self, discount: &Discount) -> DbResult<()> {
        let name = validate_required("name", &discount.name, 100)?;
        validate_discount_value(discount.discount_type, discount.value_hundredths)?;
        validate_discount_window(discount.start_date, discount.end_date)?;

        let result = sqlx::query(
            r#"
            UPDATE discount SET
                name = ?2,
                discount_type = ?3,
                value_hundredths = ?4,
                start_date = ?5,
                end_date = ?6,
                is_active = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&discount.id)
        .bind(&name)
        .bind(discount.discount_type)
        .bind(discount.value_hundredths)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", &discount.id));
        }

        Ok(())
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE discount SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }

    /// Deletes a discount that no sale has used.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting discount");

        let result = sqlx::query("DELETE FROM discount WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, "Discount", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Product tags
    // -------------------------------------------------------------------------

    /// Tags a product with a discount (idempotent).
    pub async fn tag_product(&self, discount_id: &str, product_id: &str) -> DbResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO product_discount (product_id, discount_id) VALUES (?1, ?2)",
        )
        .bind(product_id)
        .bind(discount_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_foreign_key_violation() => {
                DbError::unknown("Product or Discount", format!("{product_id} / {discount_id}"))
            }
            err => err,
        })?;

        Ok(())
    }

    pub async fn untag_product(&self, discount_id: &str, product_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM product_discount WHERE product_id = ?1 AND discount_id = ?2")
            .bind(product_id)
            .bind(discount_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn products_for(&self, discount_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"{SELECT_PRODUCT}
            WHERE id IN (SELECT product_id FROM product_discount WHERE discount_id = ?1)
            ORDER BY name"#
        ))
        .bind(discount_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

/// Active discounts on `date`, usable inside a sale transaction.
pub(crate) async fn list_active_on<'e, E>(executor: E, date: NaiveDate) -> DbResult<Vec<Discount>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let discounts = sqlx::query_as::<_, Discount>(SELECT_ACTIVE_ON)
        .bind(date)
        .fetch_all(executor)
        .await?;

    Ok(discounts)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::error::DbError;
    use crate::test_support::fixture;
    use duka_core::{CoreError, DiscountType};

    fn oct(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[tokio::test]
    async fn test_list_active_on_respects_window_and_flag() {
        let fx = fixture().await;
        let repo = fx.db.discounts();

        let september = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let current = fx
            .discount("Weekend 10%", DiscountType::Percentage, 1000, oct(1), oct(31))
            .await;
        fx.discount("September", DiscountType::Fixed, 50_000, september, oct(1))
            .await;
        let paused = fx
            .discount("Paused", DiscountType::Bogo, 100, oct(1), oct(31))
            .await;
        repo.set_active(&paused.id, false).await.unwrap();

        let active = repo.list_active_on(oct(18)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, current.id);

        // Window ends are inclusive.
        assert_eq!(repo.list_active_on(oct(31)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_discounts_rejected() {
        let fx = fixture().await;
        let mut discount =
            fx.discount_template("Too much", DiscountType::Percentage, 10_001, oct(1), oct(2));

        let err = fx.db.discounts().insert(&discount).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        discount.value_hundredths = 1000;
        discount.end_date = oct(1);
        let err = fx.db.discounts().insert(&discount).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_product_tags() {
        let fx = fixture().await;
        let discount = fx
            .discount("Dairy week", DiscountType::Percentage, 500, oct(1), oct(31))
            .await;
        let milk = fx.product("Brookside Whole Milk 1L", 10, 250, None).await;

        let repo = fx.db.discounts();
        repo.tag_product(&discount.id, &milk.id).await.unwrap();
        repo.tag_product(&discount.id, &milk.id).await.unwrap();
        assert_eq!(repo.products_for(&discount.id).await.unwrap().len(), 1);

        // Tags cascade with the discount.
        repo.delete(&discount.id).await.unwrap();
        assert!(repo.products_for(&discount.id).await.unwrap().is_empty());
    }
}
