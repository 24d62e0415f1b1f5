//! Purchase order service: ordering stock and receiving it

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{PaginatedResponse, Pagination};

/// Purchase order service
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
}

/// Lifecycle of a purchase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub status: String,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseDetail {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// A purchase order with its lines
#[derive(Debug, Serialize)]
pub struct PurchaseOrderWithDetails {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub details: Vec<PurchaseDetail>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseDetailInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    pub order_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    #[serde(default)]
    pub details: Vec<PurchaseDetailInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPurchaseOrdersFilter {
    pub supplier_id: Option<Uuid>,
    pub status: Option<PurchaseOrderStatus>,
}

fn validate_detail(input: &PurchaseDetailInput) -> AppResult<()> {
    if input.quantity <= 0 {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: "Quantity must be greater than zero".to_string(),
        });
    }
    if input.unit_price < Decimal::ZERO {
        return Err(AppError::Validation {
            field: "unit_price".to_string(),
            message: "Unit price cannot be negative".to_string(),
        });
    }
    Ok(())
}

impl PurchaseOrderService {
    /// Create a new PurchaseOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a purchase order, optionally with its lines
    pub async fn create(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithDetails> {
        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
        )
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;
        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        for detail in &input.details {
            validate_detail(detail)?;
        }

        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());
        let total_amount: Decimal = input
            .details
            .iter()
            .map(|d| Decimal::from(d.quantity) * d.unit_price)
            .sum();

        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (supplier_id, status, order_date, expected_date, total_amount)
            VALUES ($1, 'pending', $2, $3, $4)
            RETURNING id, supplier_id, status, order_date, expected_date, total_amount,
                      created_at, updated_at
            "#,
        )
        .bind(input.supplier_id)
        .bind(order_date)
        .bind(input.expected_date)
        .bind(total_amount)
        .fetch_one(&mut *tx)
        .await?;

        let mut details = Vec::with_capacity(input.details.len());
        for detail in &input.details {
            let row = Self::insert_detail(&mut tx, order.id, detail).await?;
            details.push(row);
        }

        tx.commit().await?;

        Ok(PurchaseOrderWithDetails { order, details })
    }

    async fn insert_detail(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        input: &PurchaseDetailInput,
    ) -> AppResult<PurchaseDetail> {
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(input.product_id)
        .fetch_one(&mut **tx)
        .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let line_total = Decimal::from(input.quantity) * input.unit_price;
        let detail = sqlx::query_as::<_, PurchaseDetail>(
            r#"
            INSERT INTO purchase_details (purchase_order_id, product_id, quantity, unit_price, line_total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, purchase_order_id, product_id, quantity, unit_price, line_total
            "#,
        )
        .bind(order_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(line_total)
        .fetch_one(&mut **tx)
        .await?;

        Ok(detail)
    }

    /// Add a line to a pending purchase order
    pub async fn add_detail(
        &self,
        order_id: Uuid,
        input: PurchaseDetailInput,
    ) -> AppResult<PurchaseDetail> {
        validate_detail(&input)?;

        let mut tx = self.db.begin().await?;

        let status: String = sqlx::query_scalar(
            "SELECT status FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        if status != PurchaseOrderStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot add lines to a {} purchase order",
                status
            )));
        }

        let detail = Self::insert_detail(&mut tx, order_id, &input).await?;

        sqlx::query(
            "UPDATE purchase_orders SET total_amount = total_amount + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(detail.line_total)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(detail)
    }

    /// Lines of a purchase order
    pub async fn get_details(&self, order_id: Uuid) -> AppResult<Vec<PurchaseDetail>> {
        self.ensure_exists(order_id).await?;

        let details = sqlx::query_as::<_, PurchaseDetail>(
            r#"
            SELECT id, purchase_order_id, product_id, quantity, unit_price, line_total
            FROM purchase_details
            WHERE purchase_order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(details)
    }

    /// List purchase orders, newest first
    pub async fn list(
        &self,
        pagination: &Pagination,
        filter: &ListPurchaseOrdersFilter,
    ) -> AppResult<PaginatedResponse<PurchaseOrder>> {
        let status = filter.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM purchase_orders
            WHERE ($1::uuid IS NULL OR supplier_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(filter.supplier_id)
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let orders = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, supplier_id, status, order_date, expected_date, total_amount,
                   created_at, updated_at
            FROM purchase_orders
            WHERE ($1::uuid IS NULL OR supplier_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY order_date DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.supplier_id)
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: orders,
            pagination: pagination.meta(total as u64),
        })
    }

    /// Get a purchase order with its lines
    pub async fn get(&self, order_id: Uuid) -> AppResult<PurchaseOrderWithDetails> {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, supplier_id, status, order_date, expected_date, total_amount,
                   created_at, updated_at
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let details = self.get_details(order_id).await?;

        Ok(PurchaseOrderWithDetails { order, details })
    }

    /// Receive a pending order: stock goes up and each product's cost
    /// price moves to the latest purchase price.
    pub async fn receive(&self, order_id: Uuid) -> AppResult<PurchaseOrderWithDetails> {
        let mut tx = self.db.begin().await?;

        let status: String = sqlx::query_scalar(
            "SELECT status FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        if status != PurchaseOrderStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot receive a {} purchase order",
                status
            )));
        }

        let details = sqlx::query_as::<_, PurchaseDetail>(
            r#"
            SELECT id, purchase_order_id, product_id, quantity, unit_price, line_total
            FROM purchase_details
            WHERE purchase_order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for detail in &details {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET quantity_in_stock = quantity_in_stock + $1, cost_price = $2, updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(detail.quantity)
            .bind(detail.unit_price)
            .bind(detail.product_id)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(AppError::NotFound("Product".to_string()));
            }
        }

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = 'received', updated_at = NOW()
            WHERE id = $1
            RETURNING id, supplier_id, status, order_date, expected_date, total_amount,
                      created_at, updated_at
            "#,
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, lines = details.len(), "purchase order received");

        Ok(PurchaseOrderWithDetails { order, details })
    }

    /// Cancel a pending order. Orders with payments on record stay.
    pub async fn cancel(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let status: String = sqlx::query_scalar(
            "SELECT status FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        if status != PurchaseOrderStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot cancel a {} purchase order",
                status
            )));
        }

        let paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE purchase_order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
        if paid > Decimal::ZERO {
            return Err(AppError::Conflict {
                resource: "purchase_order".to_string(),
                message: "Purchase order has payments recorded".to_string(),
            });
        }

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1
            RETURNING id, supplier_id, status, order_date, expected_date, total_amount,
                      created_at, updated_at
            "#,
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn ensure_exists(&self, order_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE id = $1)",
        )
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }
        Ok(())
    }
}
