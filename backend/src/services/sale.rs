//! Sales service: the till, sale history, and bulk import

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::ingest::normalize_sales;
use shared::types::{PaginatedResponse, Pagination, PaymentMethod};
use shared::validation::validate_line_quantity;

/// Sales service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
}

/// A completed sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub status: String,
    pub sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A line item on a sale. `cost_price` snapshots the product cost at
/// the time of sale so later cost changes do not rewrite history.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub line_total: Decimal,
}

/// Settlement status of a sale given what has been paid so far
pub(crate) fn settlement_status(total_amount: Decimal, amount_paid: Decimal) -> &'static str {
    if amount_paid >= total_amount {
        "paid"
    } else if amount_paid > Decimal::ZERO {
        "partial"
    } else {
        "unpaid"
    }
}

/// A sale with its line items
#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// One line of a new sale
#[derive(Debug, Deserialize)]
pub struct SaleLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Defaults to the product's selling price
    pub unit_price: Option<Decimal>,
}

/// Input for recording a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub customer_id: Option<Uuid>,
    /// Defaults to the sale total (paid in full at the till)
    pub amount_paid: Option<Decimal>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub sold_at: Option<DateTime<Utc>>,
    pub items: Vec<SaleLineInput>,
}

/// Filters for listing sales
#[derive(Debug, Default, Deserialize)]
pub struct ListSalesFilter {
    pub customer_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Outcome of a bulk import
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    /// Rows in the request body
    pub received: usize,
    /// Sales written
    pub imported: usize,
    /// Rows that were not objects and could not be normalized
    pub skipped: usize,
}

/// Product fields needed while building a sale
#[derive(Debug, FromRow)]
struct ProductForSale {
    name: String,
    cost_price: Decimal,
    selling_price: Decimal,
    quantity_in_stock: i32,
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale, decrementing stock for every line.
    ///
    /// Runs in one transaction: if any line fails the stock check the
    /// whole sale is rolled back.
    pub async fn create(&self, input: CreateSaleInput) -> AppResult<SaleWithItems> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A sale needs at least one line".to_string(),
            });
        }
        for item in &input.items {
            validate_line_quantity(Decimal::from(item.quantity)).map_err(|message| {
                AppError::Validation {
                    field: "quantity".to_string(),
                    message: message.to_string(),
                }
            })?;
        }

        if let Some(customer_id) = input.customer_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)",
            )
            .bind(customer_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Customer".to_string()));
            }
        }

        let sold_at = input.sold_at.unwrap_or_else(Utc::now);
        let mut tx = self.db.begin().await?;

        // Price and check every line against locked product rows
        let mut lines: Vec<(Uuid, Decimal, Decimal, Decimal, Decimal)> = Vec::new();
        let mut total_amount = Decimal::ZERO;
        for item in &input.items {
            let product = sqlx::query_as::<_, ProductForSale>(
                r#"
                SELECT name, cost_price, selling_price, quantity_in_stock
                FROM products
                WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            if product.quantity_in_stock < item.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "{} has {} in stock, {} requested",
                    product.name, product.quantity_in_stock, item.quantity
                )));
            }

            let quantity = Decimal::from(item.quantity);
            let unit_price = item.unit_price.unwrap_or(product.selling_price);
            if unit_price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "unit_price".to_string(),
                    message: "Price cannot be negative".to_string(),
                });
            }
            let line_total = (quantity * unit_price).round_dp(2);
            total_amount += line_total;
            lines.push((
                item.product_id,
                quantity,
                unit_price,
                product.cost_price,
                line_total,
            ));

            sqlx::query(
                "UPDATE products SET quantity_in_stock = quantity_in_stock - $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await?;
        }

        let amount_paid = input.amount_paid.unwrap_or(total_amount);
        if amount_paid < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount_paid".to_string(),
                message: "Amount paid cannot be negative".to_string(),
            });
        }
        if amount_paid > total_amount {
            return Err(AppError::PaymentExceedsBalance(format!(
                "Payment amount exceeds balance due ({} due)",
                total_amount
            )));
        }

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (customer_id, total_amount, amount_paid, payment_method, status, sold_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, customer_id, total_amount, amount_paid, payment_method, status,
                      sold_at, created_at
            "#,
        )
        .bind(input.customer_id)
        .bind(total_amount)
        .bind(amount_paid)
        .bind(input.payment_method.as_str())
        .bind(settlement_status(total_amount, amount_paid))
        .bind(sold_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity, unit_price, cost_price, line_total) in lines {
            let item = sqlx::query_as::<_, SaleItem>(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, cost_price, line_total)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, sale_id, product_id, quantity, unit_price, cost_price, line_total
                "#,
            )
            .bind(sale.id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_price)
            .bind(cost_price)
            .bind(line_total)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        // The till tender is a cash movement like any other payment
        if amount_paid > Decimal::ZERO {
            sqlx::query(
                r#"
                INSERT INTO payments (counterparty, sale_id, amount, method, paid_at)
                VALUES ('customer', $1, $2, $3, $4)
                "#,
            )
            .bind(sale.id)
            .bind(amount_paid)
            .bind(input.payment_method.as_str())
            .bind(sold_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SaleWithItems { sale, items })
    }

    /// List sales, newest first
    pub async fn list(
        &self,
        pagination: &Pagination,
        filter: &ListSalesFilter,
    ) -> AppResult<PaginatedResponse<Sale>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM sales
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::timestamptz IS NULL OR sold_at >= $2)
              AND ($3::timestamptz IS NULL OR sold_at <= $3)
            "#,
        )
        .bind(filter.customer_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.db)
        .await?;

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, total_amount, amount_paid, payment_method, status,
                   sold_at, created_at
            FROM sales
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::timestamptz IS NULL OR sold_at >= $2)
              AND ($3::timestamptz IS NULL OR sold_at <= $3)
            ORDER BY sold_at DESC NULLS LAST, created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.customer_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: sales,
            pagination: pagination.meta(total as u64),
        })
    }

    /// Get one sale with its items
    pub async fn get(&self, sale_id: Uuid) -> AppResult<SaleWithItems> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, total_amount, amount_paid, payment_method, status,
                   sold_at, created_at
            FROM sales
            WHERE id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price, cost_price, line_total
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithItems { sale, items })
    }

    /// Import raw sale rows from an export of another system.
    ///
    /// Rows run through the lenient normalizer; anything that is not
    /// an object is skipped. Imported history never touches stock
    /// levels, those already reflect the old sales. Rows that name an
    /// unknown product still import as a sale so revenue history stays
    /// complete, they just carry no line item.
    pub async fn import(&self, rows: Vec<serde_json::Value>) -> AppResult<ImportSummary> {
        let received = rows.len();
        let records = normalize_sales(&rows);
        let skipped = received - records.len();

        let mut tx = self.db.begin().await?;
        let mut imported = 0usize;
        for record in records {
            let sale_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO sales (customer_id, total_amount, amount_paid, payment_method, status, sold_at)
                VALUES (NULL, $1, $1, $2, 'paid', $3)
                RETURNING id
                "#,
            )
            .bind(record.total_price)
            .bind(PaymentMethod::Cash.as_str())
            .bind(record.sold_at)
            .fetch_one(&mut *tx)
            .await?;

            if let Some(product_id) = record.product_id {
                let product = sqlx::query_as::<_, (Decimal,)>(
                    "SELECT cost_price FROM products WHERE id = $1",
                )
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;

                if let Some((cost_price,)) = product {
                    let quantity = Decimal::try_from(record.quantity)
                        .unwrap_or(Decimal::ZERO)
                        .round_dp(3);
                    let unit_price = if quantity > Decimal::ZERO {
                        (record.total_price / quantity).round_dp(2)
                    } else {
                        Decimal::ZERO
                    };
                    sqlx::query(
                        r#"
                        INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, cost_price, line_total)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        "#,
                    )
                    .bind(sale_id)
                    .bind(product_id)
                    .bind(quantity)
                    .bind(unit_price)
                    .bind(cost_price)
                    .bind(record.total_price)
                    .execute(&mut *tx)
                    .await?;
                }
            }

            if record.total_price > Decimal::ZERO {
                sqlx::query(
                    r#"
                    INSERT INTO payments (counterparty, sale_id, amount, method, paid_at)
                    VALUES ('customer', $1, $2, $3, COALESCE($4, NOW()))
                    "#,
                )
                .bind(sale_id)
                .bind(record.total_price)
                .bind(PaymentMethod::Cash.as_str())
                .bind(record.sold_at)
                .execute(&mut *tx)
                .await?;
            }
            imported += 1;
        }
        tx.commit().await?;

        tracing::info!(received, imported, skipped, "sales import finished");

        Ok(ImportSummary {
            received,
            imported,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_settlement_status_tracks_the_balance() {
        assert_eq!(settlement_status(dec("100"), dec("100")), "paid");
        assert_eq!(settlement_status(dec("100"), dec("120")), "paid");
        assert_eq!(settlement_status(dec("100"), dec("40")), "partial");
        assert_eq!(settlement_status(dec("100"), Decimal::ZERO), "unpaid");
    }

    #[test]
    fn test_free_sale_counts_as_paid() {
        assert_eq!(settlement_status(Decimal::ZERO, Decimal::ZERO), "paid");
    }
}
