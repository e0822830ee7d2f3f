// Vehicle listing data models and DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::validation::{validate_discount_percentage, validate_positive_price};

/// Domain model representing a vehicle listing in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub cash_price: Decimal,
    pub discount_percentage: Decimal,
    pub city: String,
    pub mileage: i32,
    pub brand: String,
    pub category: String,
    pub thumbnail: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain model representing an image attached to a listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub path: String,
}

/// Request DTO for creating a listing
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "2018 Toyota Corolla XLi")]
    pub title: String,
    #[validate(length(min = 1))]
    #[schema(example = "Single owner, full service history")]
    pub description: String,
    #[validate(custom = "validate_positive_price")]
    #[schema(value_type = f64, example = 15200.0)]
    pub price: Decimal,
    #[validate(custom = "validate_positive_price")]
    #[schema(value_type = f64, example = 14500.0)]
    pub cash_price: Decimal,
    #[validate(custom = "validate_discount_percentage")]
    #[schema(value_type = f64, example = 4.5)]
    pub discount_percentage: Decimal,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Algiers")]
    pub city: String,
    #[validate(range(min = 0))]
    #[schema(example = 68000)]
    pub mileage: i32,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Toyota")]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Sedan")]
    pub category: String,
    #[schema(example = "uploads/3b44e3f2.jpg")]
    pub thumbnail: String,
}

/// Request DTO for updating a listing; omitted fields keep their values
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_price")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_positive_price")]
    #[schema(value_type = Option<f64>)]
    pub cash_price: Option<Decimal>,
    #[validate(custom = "validate_discount_percentage")]
    #[schema(value_type = Option<f64>)]
    pub discount_percentage: Option<Decimal>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub thumbnail: Option<String>,
}

/// Response DTO for a listing with its image paths
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[schema(value_type = f64)]
    pub cash_price: Decimal,
    #[schema(value_type = f64)]
    pub discount_percentage: Decimal,
    pub city: String,
    pub mileage: i32,
    pub brand: String,
    pub category: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    /// Combine a product row with its image paths (insertion order)
    pub fn from_parts(product: Product, images: Vec<String>) -> Self {
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            price: product.price,
            cash_price: product.cash_price,
            discount_percentage: product.discount_percentage,
            city: product.city,
            mileage: product.mileage,
            brand: product.brand,
            category: product.category,
            thumbnail: product.thumbnail,
            images,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Paged listing envelope with the total listing count
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// Response DTO for an attached image
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductImageResponse {
    pub id: i32,
    pub path: String,
}

impl From<ProductImage> for ProductImageResponse {
    fn from(image: ProductImage) -> Self {
        Self {
            id: image.id,
            path: image.path,
        }
    }
}

/// Query parameters for the paged listing endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProductsQuery {
    /// Number of listings to skip (default 0)
    pub skip: Option<i64>,
    /// Page size (default 30, capped at 100)
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_create() -> CreateProduct {
        CreateProduct {
            title: "2018 Toyota Corolla".to_string(),
            description: "Clean".to_string(),
            price: dec!(15200),
            cash_price: dec!(14500),
            discount_percentage: dec!(4.5),
            city: "Algiers".to_string(),
            mileage: 68000,
            brand: "Toyota".to_string(),
            category: "Sedan".to_string(),
            thumbnail: "uploads/thumb.jpg".to_string(),
        }
    }

    #[test]
    fn test_create_product_valid() {
        assert!(sample_create().validate().is_ok());
    }

    #[test]
    fn test_create_product_rejects_nonpositive_price() {
        let mut payload = sample_create();
        payload.price = dec!(0);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_create_product_rejects_discount_over_100() {
        let mut payload = sample_create();
        payload.discount_percentage = dec!(101);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_create_product_rejects_negative_mileage() {
        let mut payload = sample_create();
        payload.mileage = -1;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_update_product_all_fields_optional() {
        let empty = UpdateProduct {
            title: None,
            description: None,
            price: None,
            cash_price: None,
            discount_percentage: None,
            city: None,
            mileage: None,
            brand: None,
            category: None,
            thumbnail: None,
        };
        assert!(empty.validate().is_ok());
    }
}
