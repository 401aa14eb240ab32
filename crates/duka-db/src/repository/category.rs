//! # Category Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{delete_error, id_or_new};
use duka_core::validation::validate_required;
use duka_core::Category;

/// Repository for product categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM category WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM category WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM category ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Inserts a category. Names are unique.
    pub async fn insert(&self, category: &Category) -> DbResult<Category> {
        let stored = Category {
            id: id_or_new(&category.id),
            name: validate_required("name", &category.name, 100)?,
            description: category.description.clone(),
        };

        debug!(id = %stored.id, name = %stored.name, "Inserting category");

        sqlx::query("INSERT INTO category (id, name, description) VALUES (?1, ?2, ?3)")
            .bind(&stored.id)
            .bind(&stored.name)
            .bind(&stored.description)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                err if err.is_unique_violation_on("category.name") => {
                    DbError::duplicate("category name", &stored.name)
                }
                err => err,
            })?;

        Ok(stored)
    }

    pub async fn update(&self, category: &Category) -> DbResult<()> {
        let name = validate_required("name", &category.name, 100)?;

        let result = sqlx::query("UPDATE category SET name = ?2, description = ?3 WHERE id = ?1")
            .bind(&category.id)
            .bind(&name)
            .bind(&category.description)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Deletes a category with no products.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM category WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, "Category", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::fixture;
    use duka_core::{Category, CoreError};

    use crate::error::DbError;

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let fx = fixture().await;
        let repo = fx.db.categories();

        let err = repo
            .insert(&Category {
                id: String::new(),
                name: fx.category.name.clone(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_protected_while_products_exist() {
        let fx = fixture().await;
        fx.product("Brookside Whole Milk 1L", 5, 100, None).await;

        let err = fx.db.categories().delete(&fx.category.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ReferenceInUse { .. })
        ));

        let empty = fx
            .db
            .categories()
            .insert(&Category {
                id: String::new(),
                name: "Household".to_string(),
                description: Some("Cleaning supplies".to_string()),
            })
            .await
            .unwrap();
        fx.db.categories().delete(&empty.id).await.unwrap();
        assert!(fx.db.categories().get_by_id(&empty.id).await.unwrap().is_none());
    }
}
