//! Product repository for database operations

use sqlx::PgPool;
use tracing::info;

use crate::checkout::{self, CheckoutError};
use crate::models::{CartLine, Product, ProductFields, ProductWithCreator};

const PRODUCT_COLUMNS: &str =
    "id, name, price, stock, image_url, user_id, last_updated_by, created_at, updated_at";

/// Product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All products with creator identity joined in, most recently updated first
    pub async fn list(&self) -> Result<Vec<ProductWithCreator>, sqlx::Error> {
        let products = sqlx::query_as::<_, ProductWithCreator>(
            r#"
            SELECT p.id, p.name, p.price, p.stock, p.image_url, p.user_id,
                   p.last_updated_by, p.created_at, p.updated_at,
                   u.id AS creator_id, u.full_name AS creator_full_name,
                   u.email AS creator_email
            FROM products p
            LEFT JOIN users u ON u.id = p.user_id
            ORDER BY p.updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Find a product by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Product>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Find a product by ID with its creator joined in
    pub async fn find_with_creator(
        &self,
        id: i64,
    ) -> Result<Option<ProductWithCreator>, sqlx::Error> {
        let product = sqlx::query_as::<_, ProductWithCreator>(
            r#"
            SELECT p.id, p.name, p.price, p.stock, p.image_url, p.user_id,
                   p.last_updated_by, p.created_at, p.updated_at,
                   u.id AS creator_id, u.full_name AS creator_full_name,
                   u.email AS creator_email
            FROM products p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Insert a product, stamping creator and updater with the same user
    pub async fn create(
        &self,
        fields: &ProductFields,
        creator_id: i64,
        image_url: Option<String>,
    ) -> Result<Product, sqlx::Error> {
        info!("Creating product: {}", fields.name);

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, price, stock, image_url, user_id, last_updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(image_url)
        .bind(creator_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Overwrite the mutable fields of a product and stamp the updater
    ///
    /// Returns `None` when the product does not exist. The image is only
    /// replaced when a new one was uploaded.
    pub async fn update(
        &self,
        id: i64,
        fields: &ProductFields,
        updater_id: i64,
        image_url: Option<String>,
    ) -> Result<Option<Product>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $1,
                price = $2,
                stock = $3,
                image_url = COALESCE($4, image_url),
                last_updated_by = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(image_url)
        .bind(updater_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Delete a product, returning whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Validate a cart and apply its stock decrements atomically
    ///
    /// Every product in the cart is fetched under `FOR UPDATE` inside a
    /// single transaction, so two checkouts touching the same product
    /// serialize: the second observes the stock the first committed. A
    /// rejection rolls back with every per-line problem accumulated and no
    /// stock changed.
    pub async fn checkout(&self, buyer_id: i64, cart: &[CartLine]) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let mut fetched = Vec::with_capacity(cart.len());
        for line in cart {
            let product = sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
            ))
            .bind(line.id)
            .fetch_optional(&mut *tx)
            .await?;

            fetched.push((line.clone(), product));
        }

        let staged = match checkout::plan(&fetched) {
            Ok(staged) => staged,
            Err(problems) => {
                tx.rollback().await?;
                return Err(CheckoutError::Rejected { problems });
            }
        };

        for update in &staged {
            sqlx::query(
                r#"
                UPDATE products
                SET stock = $1, last_updated_by = $2, updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(update.remaining)
            .bind(buyer_id)
            .bind(update.product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            buyer_id,
            lines = staged.len(),
            "Checkout committed, stock updated"
        );

        Ok(())
    }
}
