//! Analytics service: runs the shared pipeline over live rows.
//!
//! Every endpoint fetches what it needs with an all-or-nothing
//! concurrent join and recomputes from scratch; nothing here is
//! cached or persisted.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::AnalyticsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ProductSnapshot, SaleRecord};
use shared::analytics::{
    aggregate_sales, assess_margin, assess_product, filter_by_window, margin_stats,
    reorder_advice, ClassifierThresholds, InsightParams, MarginBand, MarginStats,
    ProductSalesTotals, ReorderAdvice, SalesWindow, StockAssessment, StockStatus,
};
use shared::costing::{profit_margin, weighted_average_cost};

/// Analytics service
#[derive(Clone)]
pub struct AnalyticsService {
    db: PgPool,
    thresholds: ClassifierThresholds,
    params: InsightParams,
}

/// Counts per stock status across the catalog
#[derive(Debug, Default, Serialize)]
pub struct StockStatusSummary {
    pub total_products: usize,
    pub out: usize,
    pub critical_low: usize,
    pub low: usize,
    pub normal: usize,
    pub high: usize,
    pub overstock: usize,
}

impl StockStatusSummary {
    fn from_assessments(assessments: &[StockAssessment]) -> Self {
        let mut summary = StockStatusSummary {
            total_products: assessments.len(),
            ..Default::default()
        };
        for assessment in assessments {
            match assessment.status {
                StockStatus::Out => summary.out += 1,
                StockStatus::CriticalLow => summary.critical_low += 1,
                StockStatus::Low => summary.low += 1,
                StockStatus::Normal => summary.normal += 1,
                StockStatus::High => summary.high += 1,
                StockStatus::Overstock => summary.overstock += 1,
            }
        }
        summary
    }
}

/// Stock status of every product, most urgent first
#[derive(Debug, Serialize)]
pub struct StockStatusReport {
    pub window: SalesWindow,
    pub generated_at: DateTime<Utc>,
    pub summary: StockStatusSummary,
    pub assessments: Vec<StockAssessment>,
}

/// Everything the product detail screen shows about one product
#[derive(Debug, Serialize)]
pub struct ProductInsights {
    pub product_id: Uuid,
    pub product_name: String,
    pub window: SalesWindow,
    pub generated_at: DateTime<Utc>,
    pub assessment: StockAssessment,
    pub reorder: ReorderAdvice,
    pub totals: ProductSalesTotals,
    pub profit_margin: Decimal,
    /// Weighted average price across received purchase lots, `None`
    /// until something has been received.
    pub average_purchase_price: Option<Decimal>,
}

/// One product's margin next to the catalog statistics
#[derive(Debug, Serialize)]
pub struct ProductMargin {
    pub product_id: Uuid,
    pub product_name: String,
    pub profit_margin: Decimal,
    pub band: MarginBand,
}

#[derive(Debug, Serialize)]
pub struct MarginReport {
    pub stats: Option<MarginStats>,
    pub products: Vec<ProductMargin>,
}

#[derive(Debug, Serialize)]
pub struct TopSeller {
    pub product_id: Uuid,
    pub product_name: String,
    pub total_sold: f64,
    pub total_revenue: Decimal,
}

/// The landing-screen snapshot
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub window: SalesWindow,
    pub generated_at: DateTime<Utc>,
    pub stock: StockStatusSummary,
    pub window_revenue: Decimal,
    pub window_sales_count: usize,
    pub top_sellers: Vec<TopSeller>,
    pub margin_stats: Option<MarginStats>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    cost_price: Decimal,
    selling_price: Decimal,
    quantity_in_stock: i32,
}

impl From<ProductRow> for ProductSnapshot {
    fn from(row: ProductRow) -> Self {
        ProductSnapshot {
            id: row.id,
            name: row.name,
            cost_price: row.cost_price,
            selling_price: row.selling_price,
            quantity_in_stock: row.quantity_in_stock,
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    product_id: Option<Uuid>,
    quantity: Decimal,
    line_total: Decimal,
    sold_at: Option<DateTime<Utc>>,
}

impl From<SaleItemRow> for SaleRecord {
    fn from(row: SaleItemRow) -> Self {
        SaleRecord {
            product_id: row.product_id,
            quantity: row.quantity.to_f64().unwrap_or(0.0),
            total_price: row.line_total,
            sold_at: row.sold_at,
        }
    }
}

impl AnalyticsService {
    /// Create a new AnalyticsService instance
    pub fn new(db: PgPool, config: &AnalyticsConfig) -> Self {
        Self {
            db,
            thresholds: config.thresholds(),
            params: config.insight_params(),
        }
    }

    /// Classify the whole catalog over one window
    pub async fn stock_status(&self, window: SalesWindow) -> AppResult<StockStatusReport> {
        let (products, records) =
            tokio::try_join!(self.fetch_products(), self.fetch_sale_records())?;

        let now = Utc::now();
        let filtered = filter_by_window(&records, window, now);
        let totals = aggregate_sales(&filtered);

        let mut assessments: Vec<StockAssessment> = products
            .iter()
            .map(|product| assess_product(product, totals.get(&product.id), window, &self.thresholds))
            .collect();
        assessments.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });

        Ok(StockStatusReport {
            window,
            generated_at: now,
            summary: StockStatusSummary::from_assessments(&assessments),
            assessments,
        })
    }

    /// Stock, reorder, and margin guidance for one product
    pub async fn product_insights(
        &self,
        product_id: Uuid,
        window: SalesWindow,
    ) -> AppResult<ProductInsights> {
        let (product, records, lots) = tokio::try_join!(
            self.fetch_product(product_id),
            self.fetch_product_sale_records(product_id),
            self.fetch_received_lots(product_id)
        )?;
        let product = product.ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let now = Utc::now();
        let filtered = filter_by_window(&records, window, now);
        let totals_by_product = aggregate_sales(&filtered);
        let totals = totals_by_product.get(&product.id);

        let assessment = assess_product(&product, totals, window, &self.thresholds);
        let reorder = reorder_advice(
            product.quantity_in_stock,
            assessment.daily_velocity,
            product.cost_price,
            &self.params,
        );
        let average_purchase_price = if lots.is_empty() {
            None
        } else {
            Some(weighted_average_cost(lots))
        };

        Ok(ProductInsights {
            product_id: product.id,
            product_name: product.name.clone(),
            window,
            generated_at: now,
            reorder,
            totals: totals.cloned().unwrap_or_default(),
            profit_margin: profit_margin(product.cost_price, product.selling_price),
            average_purchase_price,
            assessment,
        })
    }

    /// Band every product's margin against the catalog
    pub async fn margins(&self) -> AppResult<MarginReport> {
        let products = self.fetch_products().await?;

        let margins: Vec<Decimal> = products
            .iter()
            .map(|p| profit_margin(p.cost_price, p.selling_price))
            .collect();
        let as_f64: Vec<f64> = margins
            .iter()
            .map(|m| m.to_f64().unwrap_or(0.0))
            .collect();
        let stats = margin_stats(&as_f64);

        let products = match stats {
            Some(stats) => products
                .iter()
                .zip(margins.iter().zip(as_f64.iter()))
                .map(|(product, (margin, margin_f64))| ProductMargin {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    profit_margin: *margin,
                    band: assess_margin(*margin_f64, &stats),
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(MarginReport { stats, products })
    }

    /// The landing-screen snapshot over one window
    pub async fn dashboard(&self, window: SalesWindow) -> AppResult<Dashboard> {
        let (products, records) =
            tokio::try_join!(self.fetch_products(), self.fetch_sale_records())?;

        let now = Utc::now();
        let filtered = filter_by_window(&records, window, now);
        let totals = aggregate_sales(&filtered);

        let assessments: Vec<StockAssessment> = products
            .iter()
            .map(|product| assess_product(product, totals.get(&product.id), window, &self.thresholds))
            .collect();

        let window_revenue = filtered
            .iter()
            .map(|record| record.total_price)
            .sum::<Decimal>();

        let mut top_sellers: Vec<TopSeller> = products
            .iter()
            .filter_map(|product| {
                totals.get(&product.id).map(|t| TopSeller {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    total_sold: t.total_sold,
                    total_revenue: t.total_revenue,
                })
            })
            .collect();
        top_sellers.sort_by(|a, b| {
            b.total_sold
                .partial_cmp(&a.total_sold)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top_sellers.truncate(5);

        let margins: Vec<f64> = products
            .iter()
            .map(|p| profit_margin(p.cost_price, p.selling_price).to_f64().unwrap_or(0.0))
            .collect();

        Ok(Dashboard {
            window,
            generated_at: now,
            stock: StockStatusSummary::from_assessments(&assessments),
            window_revenue,
            window_sales_count: filtered.len(),
            top_sellers,
            margin_stats: margin_stats(&margins),
        })
    }

    async fn fetch_products(&self) -> AppResult<Vec<ProductSnapshot>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, cost_price, selling_price, quantity_in_stock
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ProductSnapshot::from).collect())
    }

    async fn fetch_product(&self, product_id: Uuid) -> AppResult<Option<ProductSnapshot>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, cost_price, selling_price, quantity_in_stock
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(ProductSnapshot::from))
    }

    async fn fetch_sale_records(&self) -> AppResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT si.product_id, si.quantity, si.line_total, s.sold_at
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    async fn fetch_product_sale_records(&self, product_id: Uuid) -> AppResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT si.product_id, si.quantity, si.line_total, s.sold_at
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE si.product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    async fn fetch_received_lots(&self, product_id: Uuid) -> AppResult<Vec<(Decimal, Decimal)>> {
        let lots = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT pd.quantity::numeric, pd.unit_price
            FROM purchase_details pd
            JOIN purchase_orders po ON po.id = pd.purchase_order_id
            WHERE pd.product_id = $1 AND po.status = 'received'
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(lots)
    }
}
