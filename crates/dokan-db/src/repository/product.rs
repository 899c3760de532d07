//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - CRUD with soft delete
//! - Guarded stock movements (never below zero)
//! - [`ProductCatalog`] implementation used by the ledger
//!
//! ## Stock Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Delta update, guarded in the WHERE clause                          │
//! │                                                                     │
//! │     UPDATE products SET quantity = quantity + ?delta                │
//! │     WHERE code = ? AND is_active = 1 AND quantity + ?delta >= 0     │
//! │                                                                     │
//! │  Two counters selling the last unit: one UPDATE matches, the other  │
//! │  matches zero rows and is reported as InsufficientStock.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use dokan_core::validation::validate_product;
use dokan_core::{Product, ProductCatalog};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, code, name, description, category, brand, unit, \
     purchase_price, retail_price, wholesale_price, quantity, alert_quantity, \
     tax_rate, tax_type, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_code("1001").await?;
/// let low = dokan_core::list_low_stock(&repo.list().await?);
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products ordered by code.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY code");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets an active product by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No such code, or the product was deleted
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1 AND is_active = 1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product after validating it.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::Invalid)` - Failed catalog validation
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product(product)?;
        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, category, brand, unit,
                purchase_price, retail_price, wholesale_price,
                quantity, alert_quantity, tax_rate, tax_type,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13, ?14,
                ?15, ?16, ?17
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(product.unit)
        .bind(product.purchase_price)
        .bind(product.retail_price)
        .bind(product.wholesale_price)
        .bind(product.quantity)
        .bind(product.alert_quantity)
        .bind(product.tax_rate)
        .bind(product.tax_type)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.code),
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Updates an existing product (matched by id).
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                description = ?4,
                category = ?5,
                brand = ?6,
                unit = ?7,
                purchase_price = ?8,
                retail_price = ?9,
                wholesale_price = ?10,
                quantity = ?11,
                alert_quantity = ?12,
                tax_rate = ?13,
                tax_type = ?14,
                is_active = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(product.unit)
        .bind(product.purchase_price)
        .bind(product.retail_price)
        .bind(product.wholesale_price)
        .bind(product.quantity)
        .bind(product.alert_quantity)
        .bind(product.tax_rate)
        .bind(product.tax_type)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adds `delta` to the stock of an active product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product after the movement
    /// * `Err(DbError::InsufficientStock)` - Would go below zero
    /// * `Err(DbError::NotFound)` - Unknown or deleted code
    pub async fn adjust_stock(&self, code: &str, delta: i64) -> DbResult<Product> {
        debug!(code = %code, delta = %delta, "Adjusting stock");

        let sql = format!(
            "UPDATE products SET quantity = quantity + ?2, updated_at = ?3 \
             WHERE code = ?1 AND is_active = 1 AND quantity + ?2 >= 0 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .bind(delta)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(product) = updated {
            return Ok(product);
        }

        match self.get_by_code(code).await? {
            Some(product) => Err(DbError::InsufficientStock {
                code: code.to_string(),
                available: product.quantity,
                delta,
            }),
            None => Err(DbError::not_found("Product", code)),
        }
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Invoices keep their name snapshots; the code can no longer be sold.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                is_active = 0,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

impl ProductCatalog for ProductRepository {
    type Error = DbError;

    async fn list(&self) -> DbResult<Vec<Product>> {
        ProductRepository::list(self).await
    }

    async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        ProductRepository::get_by_code(self, code).await
    }

    async fn adjust_stock(&self, code: &str, delta: i64) -> DbResult<Product> {
        ProductRepository::adjust_stock(self, code, delta).await
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use dokan_core::{Money, TaxRate, TaxType, Unit};

    pub(crate) fn sample(code: &str, name: &str, quantity: i64, alert_quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            category: "grocery".to_string(),
            brand: "ACI".to_string(),
            unit: Unit::Piece,
            purchase_price: Money::from_taka(80),
            retail_price: Money::from_taka(100),
            wholesale_price: Money::from_taka(90),
            quantity,
            alert_quantity,
            tax_rate: TaxRate::from_bps(500),
            tax_type: TaxType::Exclusive,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_by_code() {
        let repo = db().await.products();
        let mut product = sample("1001", "Miniket Rice 5kg", 10, 3);
        product.unit = Unit::Weight;
        product.tax_type = TaxType::Inclusive;
        repo.insert(&product).await.unwrap();

        let loaded = repo.get_by_code("1001").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Miniket Rice 5kg");
        assert_eq!(loaded.unit, Unit::Weight);
        assert_eq!(loaded.tax_type, TaxType::Inclusive);
        assert_eq!(loaded.tax_rate, TaxRate::from_bps(500));
        assert_eq!(loaded.retail_price, Money::from_taka(100));
        assert!(repo.get_by_code("9999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let repo = db().await.products();
        repo.insert(&sample("1001", "Rice", 1, 1)).await.unwrap();

        let err = repo.insert(&sample("1001", "Other", 1, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "1001"));
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected() {
        let repo = db().await.products();
        let err = repo.insert(&sample("1001", "Rice", -1, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_is_guarded() {
        let repo = db().await.products();
        repo.insert(&sample("1002", "Soybean Oil 1L", 3, 1)).await.unwrap();

        let product = repo.adjust_stock("1002", -2).await.unwrap();
        assert_eq!(product.quantity, 1);

        let err = repo.adjust_stock("1002", -2).await.unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { available: 1, delta: -2, .. }));

        let product = repo.adjust_stock("1002", 5).await.unwrap();
        assert_eq!(product.quantity, 6);

        let err = repo.adjust_stock("nope", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let repo = db().await.products();
        let mut product = repo.insert(&sample("1003", "Salt", 5, 2)).await.unwrap();

        product.name = "Molla Salt 1kg".to_string();
        product.alert_quantity = 10;
        repo.update(&product).await.unwrap();
        let loaded = repo.get_by_code("1003").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Molla Salt 1kg");
        assert_eq!(loaded.alert_quantity, 10);

        repo.soft_delete(&product.id).await.unwrap();
        assert!(repo.get_by_code("1003").await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.adjust_stock("1003", -1).await.unwrap_err(),
            DbError::NotFound { .. }
        ));

        assert!(matches!(
            repo.soft_delete("missing").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_code() {
        let repo = db().await.products();
        for code in ["b", "c", "a"] {
            repo.insert(&sample(code, code, 1, 0)).await.unwrap();
        }
        let codes: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["a", "b", "c"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
