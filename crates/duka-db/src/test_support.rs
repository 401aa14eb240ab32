//! Shared fixture for repository tests: a migrated in-memory database with
//! one category, one supplier, a cashier and the system account.

use chrono::{NaiveDate, Utc};

use crate::pool::{Database, DbConfig};
use duka_core::{
    Category, Discount, DiscountType, Product, Staff, StaffRole, Supplier, DEFAULT_REORDER_LEVEL,
    DEFAULT_SYSTEM_STAFF,
};

pub(crate) struct Fixture {
    pub db: Database,
    pub cashier: Staff,
    pub system: Staff,
    pub category: Category,
    pub supplier: Supplier,
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn staff(username: &str, first_name: &str, role: StaffRole) -> Staff {
    Staff {
        id: String::new(),
        first_name: first_name.to_string(),
        last_name: "Test".to_string(),
        role,
        phone: None,
        username: username.to_string(),
        password_hash: "not-a-real-hash".to_string(),
    }
}

pub(crate) async fn fixture() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let category = db
        .categories()
        .insert(&Category {
            id: String::new(),
            name: "Groceries".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let supplier = db
        .suppliers()
        .insert(&Supplier {
            id: String::new(),
            name: "Bidco Distributors".to_string(),
            contact_number: None,
            email: Some("orders@bidco.test".to_string()),
            address: None,
        })
        .await
        .unwrap();
    let cashier = db
        .staff()
        .insert(&staff("wanjiku", "Wanjiku", StaffRole::Cashier))
        .await
        .unwrap();
    let system = db
        .staff()
        .insert(&staff(DEFAULT_SYSTEM_STAFF, "System", StaffRole::Admin))
        .await
        .unwrap();

    Fixture {
        db,
        cashier,
        system,
        category,
        supplier,
    }
}

impl Fixture {
    /// A product in the fixture category, retail price twice the unit cost.
    pub fn product_template(&self, name: &str) -> Product {
        Product {
            id: String::new(),
            name: name.to_string(),
            brand: None,
            unit: "pc".to_string(),
            unit_cost_cents: 100,
            retail_price_cents: 200,
            stock_quantity: 0,
            expiry_date: None,
            reorder_level: DEFAULT_REORDER_LEVEL,
            batch_number: Some("B-001".to_string()),
            category_id: self.category.id.clone(),
            supplier_id: self.supplier.id.clone(),
        }
    }

    pub async fn product(
        &self,
        name: &str,
        stock: i64,
        unit_cost_cents: i64,
        expiry: Option<NaiveDate>,
    ) -> Product {
        let product = Product {
            stock_quantity: stock,
            unit_cost_cents,
            retail_price_cents: unit_cost_cents * 2,
            expiry_date: expiry,
            ..self.product_template(name)
        };
        self.db.products().insert(&product).await.unwrap()
    }

    pub fn discount_template(
        &self,
        name: &str,
        discount_type: DiscountType,
        value_hundredths: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Discount {
        Discount {
            id: String::new(),
            name: name.to_string(),
            discount_type,
            value_hundredths,
            start_date,
            end_date,
            is_active: true,
        }
    }

    pub async fn discount(
        &self,
        name: &str,
        discount_type: DiscountType,
        value_hundredths: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Discount {
        let discount =
            self.discount_template(name, discount_type, value_hundredths, start_date, end_date);
        self.db.discounts().insert(&discount).await.unwrap()
    }
}
