//! # Staff Repository
//!
//! Staff rows are referenced by sales, inventory logs, purchase orders and
//! payroll, so in practice a staff member with any history cannot be deleted.
//! Password hashing happens outside this crate; the hash is stored as given.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{delete_error, id_or_new};
use duka_core::validation::{validate_required, validate_username};
use duka_core::Staff;

const SELECT_STAFF: &str =
    "SELECT id, first_name, last_name, role, phone, username, password_hash FROM staff";

/// Repository for staff members.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!("{SELECT_STAFF} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(staff)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!("{SELECT_STAFF} WHERE username = ?1"))
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Resolves a username or fails with `UnknownReference`.
    ///
    /// Used by the scheduled write-off to find its acting staff member.
    pub async fn require_username(&self, username: &str) -> DbResult<Staff> {
        self.get_by_username(username)
            .await?
            .ok_or_else(|| DbError::unknown("Staff", username))
    }

    pub async fn list(&self) -> DbResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "{SELECT_STAFF} ORDER BY last_name, first_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Inserts a staff member. Usernames are unique.
    pub async fn insert(&self, staff: &Staff) -> DbResult<Staff> {
        validate_username(&staff.username)?;
        let stored = Staff {
            id: id_or_new(&staff.id),
            first_name: validate_required("first_name", &staff.first_name, 100)?,
            last_name: validate_required("last_name", &staff.last_name, 100)?,
            username: staff.username.trim().to_string(),
            password_hash: validate_required("password_hash", &staff.password_hash, 255)?,
            ..staff.clone()
        };

        debug!(id = %stored.id, username = %stored.username, role = stored.role.as_str(), "Inserting staff");

        sqlx::query(
            r#"
            INSERT INTO staff (id, first_name, last_name, role, phone, username, password_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.first_name)
        .bind(&stored.last_name)
        .bind(stored.role)
        .bind(&stored.phone)
        .bind(&stored.username)
        .bind(&stored.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("staff.username") => {
                DbError::duplicate("username", &stored.username)
            }
            err => err,
        })?;

        Ok(stored)
    }

    /// Updates profile fields. The password hash is left untouched.
    pub async fn update(&self, staff: &Staff) -> DbResult<()> {
        validate_username(&staff.username)?;
        let first_name = validate_required("first_name", &staff.first_name, 100)?;
        let last_name = validate_required("last_name", &staff.last_name, 100)?;

        let result = sqlx::query(
            r#"
            UPDATE staff SET
                first_name = ?2,
                last_name = ?3,
                role = ?4,
                phone = ?5,
                username = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&staff.id)
        .bind(&first_name)
        .bind(&last_name)
        .bind(staff.role)
        .bind(&staff.phone)
        .bind(staff.username.trim())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("staff.username") => {
                DbError::duplicate("username", staff.username.trim())
            }
            err => err,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", &staff.id));
        }

        Ok(())
    }

    pub async fn set_password_hash(&self, id: &str, password_hash: &str) -> DbResult<()> {
        let password_hash = validate_required("password_hash", password_hash, 255)?;

        let result = sqlx::query("UPDATE staff SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting staff");

        let result = sqlx::query("DELETE FROM staff WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, "Staff", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::test_support::fixture;
    use duka_core::{CoreError, Staff, StaffRole};

    #[tokio::test]
    async fn test_username_is_unique() {
        let fx = fixture().await;

        let err = fx
            .db
            .staff()
            .insert(&Staff {
                id: String::new(),
                first_name: "Another".to_string(),
                last_name: "Cashier".to_string(),
                role: StaffRole::Cashier,
                phone: None,
                username: fx.cashier.username.clone(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_require_username() {
        let fx = fixture().await;
        let repo = fx.db.staff();

        let system = repo.require_username("system").await.unwrap();
        assert_eq!(system.id, fx.system.id);

        let err = repo.require_username("nobody").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::UnknownReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_protected_by_logs() {
        let fx = fixture().await;
        let repo = fx.db.staff();

        repo.set_password_hash(&fx.cashier.id, "$argon2id$v=19$stub").await.unwrap();
        let stored = repo.get_by_id(&fx.cashier.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "$argon2id$v=19$stub");

        let yoghurt = fx
            .product("Yoghurt", 5, 100, crate::test_support::today().pred_opt())
            .await;
        fx.db
            .inventory()
            .write_off_expired(crate::test_support::today(), &fx.cashier.id)
            .await
            .unwrap();
        assert_eq!(fx.db.inventory().logs_for_product(&yoghurt.id).await.unwrap().len(), 1);

        let err = repo.delete(&fx.cashier.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReferenceInUse { .. })));

        repo.delete(&fx.system.id).await.unwrap();
        assert!(repo.get_by_username("system").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_hash_not_serialized() {
        let fx = fixture().await;
        let json = serde_json::to_string(&fx.cashier).unwrap();
        assert!(!json.contains("password_hash"));
    }
}
