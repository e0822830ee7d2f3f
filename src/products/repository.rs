use sqlx::PgPool;

use crate::products::error::ProductError;
use crate::products::models::{Product, ProductImage, UpdateProduct};

const PRODUCT_COLUMNS: &str = "id, title, description, price, cash_price, discount_percentage, \
                               city, mileage, brand, category, thumbnail, created_at, updated_at";

/// Repository for vehicle listing operations
#[derive(Clone)]
pub struct ProductsRepository {
    pool: PgPool,
}

impl ProductsRepository {
    /// Create a new ProductsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new listing
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        price: rust_decimal::Decimal,
        cash_price: rust_decimal::Decimal,
        discount_percentage: rust_decimal::Decimal,
        city: &str,
        mileage: i32,
        brand: &str,
        category: &str,
        thumbnail: &str,
    ) -> Result<Product, ProductError> {
        let query = format!(
            r#"
            INSERT INTO products
                (title, description, price, cash_price, discount_percentage,
                 city, mileage, brand, category, thumbnail)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(title)
            .bind(description)
            .bind(price)
            .bind(cash_price)
            .bind(discount_percentage)
            .bind(city)
            .bind(mileage)
            .bind(brand)
            .bind(category)
            .bind(thumbnail)
            .fetch_one(&self.pool)
            .await?;

        Ok(product)
    }

    /// Find a listing by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Product>, ProductError> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Fetch one page of listings in id order
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Product>, ProductError> {
        let query = format!(
            "SELECT {} FROM products ORDER BY id OFFSET $1 LIMIT $2",
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&query)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Total number of listings
    pub async fn count(&self) -> Result<i64, ProductError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(total.0)
    }

    /// Apply a partial update, keeping existing values for omitted fields.
    /// Runs in a transaction so the read-modify-write is atomic.
    pub async fn update(&self, id: i32, changes: UpdateProduct) -> Result<Product, ProductError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let existing = sqlx::query_as::<_, Product>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ProductError::NotFound)?;

        let update = format!(
            r#"
            UPDATE products
            SET title = $1,
                description = $2,
                price = $3,
                cash_price = $4,
                discount_percentage = $5,
                city = $6,
                mileage = $7,
                brand = $8,
                category = $9,
                thumbnail = $10,
                updated_at = NOW()
            WHERE id = $11
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let updated = sqlx::query_as::<_, Product>(&update)
            .bind(changes.title.unwrap_or(existing.title))
            .bind(changes.description.unwrap_or(existing.description))
            .bind(changes.price.unwrap_or(existing.price))
            .bind(changes.cash_price.unwrap_or(existing.cash_price))
            .bind(
                changes
                    .discount_percentage
                    .unwrap_or(existing.discount_percentage),
            )
            .bind(changes.city.unwrap_or(existing.city))
            .bind(changes.mileage.unwrap_or(existing.mileage))
            .bind(changes.brand.unwrap_or(existing.brand))
            .bind(changes.category.unwrap_or(existing.category))
            .bind(changes.thumbnail.unwrap_or(existing.thumbnail))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a listing; image rows go with it via the FK cascade
    pub async fn delete(&self, id: i32) -> Result<bool, ProductError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for listing image rows
#[derive(Clone)]
pub struct ImagesRepository {
    pool: PgPool,
}

impl ImagesRepository {
    /// Create a new ImagesRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a stored image against a listing
    pub async fn insert(&self, product_id: i32, path: &str) -> Result<ProductImage, ProductError> {
        let image = sqlx::query_as::<_, ProductImage>(
            "INSERT INTO product_images (product_id, path) VALUES ($1, $2) \
             RETURNING id, product_id, path",
        )
        .bind(product_id)
        .bind(path)
        .fetch_one(&self.pool)
        .await?;

        Ok(image)
    }

    /// All images for one listing, in insertion order
    pub async fn find_by_product_id(&self, product_id: i32) -> Result<Vec<ProductImage>, ProductError> {
        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, path FROM product_images WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Images for a page of listings in one round trip
    pub async fn find_by_product_ids(&self, ids: &[i32]) -> Result<Vec<ProductImage>, ProductError> {
        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, path FROM product_images WHERE product_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Find one image belonging to a specific listing
    pub async fn find_by_id(
        &self,
        product_id: i32,
        image_id: i32,
    ) -> Result<Option<ProductImage>, ProductError> {
        let image = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, path FROM product_images WHERE id = $1 AND product_id = $2",
        )
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    /// Remove an image row
    pub async fn delete(&self, image_id: i32) -> Result<bool, ProductError> {
        let result = sqlx::query("DELETE FROM product_images WHERE id = $1")
            .bind(image_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
