//! Product model and related functionality

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    /// Creator, kept when the user record outlives the product
    pub user_id: Option<i64>,
    pub last_updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity of the user that created a product
#[derive(Debug, Clone, Serialize)]
pub struct CreatorInfo {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

/// Product row with its creator joined in
#[derive(Debug, Clone, FromRow)]
pub struct ProductWithCreator {
    #[sqlx(flatten)]
    pub product: Product,
    pub creator_id: Option<i64>,
    pub creator_full_name: Option<String>,
    pub creator_email: Option<String>,
}

impl ProductWithCreator {
    /// Shape the joined row for the response envelope
    pub fn into_response(self) -> ProductResponse {
        let creator = match (self.creator_id, self.creator_full_name, self.creator_email) {
            (Some(id), Some(full_name), Some(email)) => Some(CreatorInfo {
                id,
                full_name,
                email,
            }),
            _ => None,
        };

        ProductResponse {
            product: self.product,
            creator,
        }
    }
}

/// Product payload returned to clients, creator identity included
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub creator: Option<CreatorInfo>,
}

/// Validated mutable product fields
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

/// One cart line of a checkout request
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub qty: i32,
}
