//! Product catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{PaginatedResponse, Pagination};
use shared::validation::{validate_price, validate_sku};

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// A product as stored
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub quantity_in_stock: i32,
    pub reorder_level: Option<i32>,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub quantity_in_stock: Option<i32>,
    pub reorder_level: Option<i32>,
    pub supplier_id: Option<Uuid>,
}

/// Input for updating a product (partial)
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub quantity_in_stock: Option<i32>,
    pub reorder_level: Option<i32>,
    pub supplier_id: Option<Uuid>,
}

/// Filters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        let sku = input.sku.trim().to_uppercase();
        validate_sku(&sku).map_err(|message| AppError::Validation {
            field: "sku".to_string(),
            message: message.to_string(),
        })?;
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name must not be empty".to_string(),
            });
        }

        let cost_price = input.cost_price.unwrap_or(Decimal::ZERO);
        let selling_price = input.selling_price.unwrap_or(Decimal::ZERO);
        for (field, price) in [("cost_price", cost_price), ("selling_price", selling_price)] {
            validate_price(price).map_err(|message| AppError::Validation {
                field: field.to_string(),
                message: message.to_string(),
            })?;
        }

        let quantity = input.quantity_in_stock.unwrap_or(0);
        if quantity < 0 {
            return Err(AppError::Validation {
                field: "quantity_in_stock".to_string(),
                message: "Stock cannot be negative".to_string(),
            });
        }

        // Reject duplicate SKUs up front
        let sku_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)",
        )
        .bind(&sku)
        .fetch_one(&self.db)
        .await?;

        if sku_taken {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        if let Some(supplier_id) = input.supplier_id {
            self.ensure_supplier_exists(supplier_id).await?;
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (sku, name, category, cost_price, selling_price,
                                  quantity_in_stock, reorder_level, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, sku, name, category, cost_price, selling_price,
                      quantity_in_stock, reorder_level, supplier_id, created_at, updated_at
            "#,
        )
        .bind(&sku)
        .bind(input.name.trim())
        .bind(&input.category)
        .bind(cost_price)
        .bind(selling_price)
        .bind(quantity)
        .bind(input.reorder_level)
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// List products with pagination and optional filters
    pub async fn list(
        &self,
        pagination: &Pagination,
        filter: &ListProductsFilter,
    ) -> AppResult<PaginatedResponse<Product>> {
        let search = filter.search.as_ref().map(|s| format!("%{}%", s.trim()));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2)
            "#,
        )
        .bind(&filter.category)
        .bind(&search)
        .fetch_one(&self.db)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, category, cost_price, selling_price,
                   quantity_in_stock, reorder_level, supplier_id, created_at, updated_at
            FROM products
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2)
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&filter.category)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: products,
            pagination: pagination.meta(total as u64),
        })
    }

    /// Get a product by id
    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, category, cost_price, selling_price,
                   quantity_in_stock, reorder_level, supplier_id, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// Update a product (partial update, missing fields keep their value)
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        let existing = self.get(product_id).await?;

        let sku = match input.sku {
            Some(sku) => {
                let sku = sku.trim().to_uppercase();
                validate_sku(&sku).map_err(|message| AppError::Validation {
                    field: "sku".to_string(),
                    message: message.to_string(),
                })?;
                if sku != existing.sku {
                    let sku_taken = sqlx::query_scalar::<_, bool>(
                        "SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1 AND id <> $2)",
                    )
                    .bind(&sku)
                    .bind(product_id)
                    .fetch_one(&self.db)
                    .await?;
                    if sku_taken {
                        return Err(AppError::DuplicateEntry("sku".to_string()));
                    }
                }
                sku
            }
            None => existing.sku,
        };

        let cost_price = input.cost_price.unwrap_or(existing.cost_price);
        let selling_price = input.selling_price.unwrap_or(existing.selling_price);
        for (field, price) in [("cost_price", cost_price), ("selling_price", selling_price)] {
            validate_price(price).map_err(|message| AppError::Validation {
                field: field.to_string(),
                message: message.to_string(),
            })?;
        }

        let quantity = input.quantity_in_stock.unwrap_or(existing.quantity_in_stock);
        if quantity < 0 {
            return Err(AppError::Validation {
                field: "quantity_in_stock".to_string(),
                message: "Stock cannot be negative".to_string(),
            });
        }

        let supplier_id = input.supplier_id.or(existing.supplier_id);
        if let Some(supplier_id) = supplier_id {
            self.ensure_supplier_exists(supplier_id).await?;
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET sku = $1, name = $2, category = $3, cost_price = $4, selling_price = $5,
                quantity_in_stock = $6, reorder_level = $7, supplier_id = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING id, sku, name, category, cost_price, selling_price,
                      quantity_in_stock, reorder_level, supplier_id, created_at, updated_at
            "#,
        )
        .bind(&sku)
        .bind(input.name.as_deref().unwrap_or(&existing.name).trim())
        .bind(input.category.or(existing.category))
        .bind(cost_price)
        .bind(selling_price)
        .bind(quantity)
        .bind(input.reorder_level.or(existing.reorder_level))
        .bind(supplier_id)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Delete a product
    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    /// Products at or below their reorder level
    pub async fn low_stock(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, category, cost_price, selling_price,
                   quantity_in_stock, reorder_level, supplier_id, created_at, updated_at
            FROM products
            WHERE reorder_level IS NOT NULL AND quantity_in_stock <= reorder_level
            ORDER BY quantity_in_stock ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    async fn ensure_supplier_exists(&self, supplier_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
        )
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }
}
