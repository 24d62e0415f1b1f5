//! Payment service: money in from customers against sales, money out
//! to suppliers against purchase orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::purchase_order::PurchaseOrderStatus;
use crate::services::sale::settlement_status;
use shared::types::{PaginatedResponse, Pagination, PaymentMethod};
use shared::validation::validate_payment_amount;

/// Payment service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
}

/// A recorded payment. Exactly one of `sale_id` and
/// `purchase_order_id` is set; `counterparty` says which side.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub counterparty: String,
    pub sale_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub amount: Decimal,
    pub method: String,
    pub paid_at: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentInput {
    pub sale_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub amount: Decimal,
    #[serde(default)]
    pub method: PaymentMethod,
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsFilter {
    pub sale_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub counterparty: Option<String>,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a payment against a sale or a purchase order.
    ///
    /// The amount may never push the referenced document past fully
    /// paid.
    pub async fn record(&self, input: RecordPaymentInput) -> AppResult<Payment> {
        match (input.sale_id, input.purchase_order_id) {
            (Some(sale_id), None) => self.record_customer_payment(sale_id, input).await,
            (None, Some(order_id)) => self.record_supplier_payment(order_id, input).await,
            _ => Err(AppError::Validation {
                field: "sale_id".to_string(),
                message: "Provide exactly one of sale_id or purchase_order_id".to_string(),
            }),
        }
    }

    async fn record_customer_payment(
        &self,
        sale_id: Uuid,
        input: RecordPaymentInput,
    ) -> AppResult<Payment> {
        let mut tx = self.db.begin().await?;

        let (total_amount, amount_paid): (Decimal, Decimal) = sqlx::query_as(
            "SELECT total_amount, amount_paid FROM sales WHERE id = $1 FOR UPDATE",
        )
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let balance_due = total_amount - amount_paid;
        Self::check_amount(input.amount, balance_due)?;

        let payment = Self::insert_payment(
            &mut tx,
            "customer",
            Some(sale_id),
            None,
            &input,
        )
        .await?;

        let new_paid = amount_paid + input.amount;
        sqlx::query("UPDATE sales SET amount_paid = $1, status = $2 WHERE id = $3")
            .bind(new_paid)
            .bind(settlement_status(total_amount, new_paid))
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(payment)
    }

    async fn record_supplier_payment(
        &self,
        order_id: Uuid,
        input: RecordPaymentInput,
    ) -> AppResult<Payment> {
        let mut tx = self.db.begin().await?;

        let (status, total_amount): (String, Decimal) = sqlx::query_as(
            "SELECT status, total_amount FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        if status == PurchaseOrderStatus::Cancelled.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Cannot pay a cancelled purchase order".to_string(),
            ));
        }

        let paid_amount: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE purchase_order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        let balance_due = total_amount - paid_amount;
        Self::check_amount(input.amount, balance_due)?;

        let payment = Self::insert_payment(
            &mut tx,
            "supplier",
            None,
            Some(order_id),
            &input,
        )
        .await?;

        tx.commit().await?;

        Ok(payment)
    }

    fn check_amount(amount: Decimal, balance_due: Decimal) -> AppResult<()> {
        if let Err(message) = validate_payment_amount(amount, balance_due) {
            if amount > Decimal::ZERO {
                return Err(AppError::PaymentExceedsBalance(format!(
                    "{} ({} due)",
                    message, balance_due
                )));
            }
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: message.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_payment(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        counterparty: &str,
        sale_id: Option<Uuid>,
        purchase_order_id: Option<Uuid>,
        input: &RecordPaymentInput,
    ) -> AppResult<Payment> {
        let paid_at = input.paid_at.unwrap_or_else(Utc::now);
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (counterparty, sale_id, purchase_order_id, amount, method, paid_at, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, counterparty, sale_id, purchase_order_id, amount, method, paid_at,
                      note, created_at
            "#,
        )
        .bind(counterparty)
        .bind(sale_id)
        .bind(purchase_order_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(paid_at)
        .bind(input.note.as_deref())
        .fetch_one(&mut **tx)
        .await?;

        Ok(payment)
    }

    /// List payments, newest first
    pub async fn list(
        &self,
        pagination: &Pagination,
        filter: &ListPaymentsFilter,
    ) -> AppResult<PaginatedResponse<Payment>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM payments
            WHERE ($1::uuid IS NULL OR sale_id = $1)
              AND ($2::uuid IS NULL OR purchase_order_id = $2)
              AND ($3::text IS NULL OR counterparty = $3)
            "#,
        )
        .bind(filter.sale_id)
        .bind(filter.purchase_order_id)
        .bind(filter.counterparty.as_deref())
        .fetch_one(&self.db)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, counterparty, sale_id, purchase_order_id, amount, method, paid_at,
                   note, created_at
            FROM payments
            WHERE ($1::uuid IS NULL OR sale_id = $1)
              AND ($2::uuid IS NULL OR purchase_order_id = $2)
              AND ($3::text IS NULL OR counterparty = $3)
            ORDER BY paid_at DESC, created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.sale_id)
        .bind(filter.purchase_order_id)
        .bind(filter.counterparty.as_deref())
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: payments,
            pagination: pagination.meta(total as u64),
        })
    }
}
