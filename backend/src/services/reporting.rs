//! Reporting service: financial statements and data export.
//!
//! Each statement is an ad hoc aggregation over the transaction
//! tables, computed per request. There is no posting engine and no
//! stored balances; the owner's equity line absorbs whatever the
//! simple model cannot attribute.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::costing::{elapsed_months, straight_line_depreciation};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Report period. Undated documents fall outside every period.
#[derive(Debug, Default, Deserialize)]
pub struct ReportRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportRange {
    fn bounds(&self) -> (NaiveDate, NaiveDate) {
        let start = self
            .start_date
            .unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let end = self
            .end_date
            .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());
        (start, end)
    }
}

#[derive(Debug, Serialize)]
pub struct IncomeStatement {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub revenue: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub gross_profit: Decimal,
    pub tax_expense: Decimal,
    pub depreciation_expense: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TrialBalanceRow {
    pub account: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub cash: Decimal,
    pub accounts_receivable: Decimal,
    pub inventory: Decimal,
    pub fixed_assets_net: Decimal,
    pub total_assets: Decimal,
    pub accounts_payable: Decimal,
    pub tax_payable: Decimal,
    pub total_liabilities: Decimal,
    pub owners_equity: Decimal,
    pub total_liabilities_and_equity: Decimal,
}

/// One document in the ledger, under its natural account
#[derive(Debug, Serialize)]
pub struct LedgerEntry {
    pub entry_date: NaiveDate,
    pub account: String,
    pub source: String,
    pub reference: Uuid,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct GeneralLedger {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub entries: Vec<LedgerEntry>,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
}

#[derive(Debug, FromRow)]
struct AssetRow {
    acquisition_cost: Decimal,
    salvage_value: Decimal,
    acquired_on: NaiveDate,
    useful_life_months: i32,
}

impl AssetRow {
    fn accumulated_as_of(&self, as_of: NaiveDate) -> Decimal {
        straight_line_depreciation(
            self.acquisition_cost,
            self.salvage_value,
            self.useful_life_months,
            elapsed_months(self.acquired_on, as_of),
        )
        .accumulated_depreciation
    }
}

/// Append the owner's equity line that makes both columns agree
fn append_equity_plug(rows: &mut Vec<TrialBalanceRow>) {
    let debits: Decimal = rows.iter().map(|r| r.debit).sum();
    let credits: Decimal = rows.iter().map(|r| r.credit).sum();
    let plug = debits - credits;
    let (debit, credit) = if plug >= Decimal::ZERO {
        (Decimal::ZERO, plug)
    } else {
        (-plug, Decimal::ZERO)
    };
    rows.push(TrialBalanceRow {
        account: "Owner's equity".to_string(),
        debit,
        credit,
    });
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Revenue down to net profit over a period
    pub async fn income_statement(&self, range: &ReportRange) -> AppResult<IncomeStatement> {
        let (start, end) = range.bounds();

        let revenue: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount), 0) FROM sales
            WHERE sold_at::date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        let cost_of_goods_sold: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(si.quantity * si.cost_price), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.sold_at::date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        let tax_expense: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(tax_amount), 0) FROM tax_entries
            WHERE kind = 'paid' AND period BETWEEN $1 AND $2
            "#,
        )
        .bind(start.format("%Y-%m").to_string())
        .bind(end.format("%Y-%m").to_string())
        .fetch_one(&self.db)
        .await?;

        let depreciation_expense = self.depreciation_between(start, end).await?;

        let gross_profit = revenue - cost_of_goods_sold;
        Ok(IncomeStatement {
            start_date: start,
            end_date: end,
            revenue,
            cost_of_goods_sold,
            gross_profit,
            tax_expense,
            depreciation_expense,
            net_profit: gross_profit - tax_expense - depreciation_expense,
        })
    }

    /// Account balances with debits and credits forced to agree
    pub async fn trial_balance(&self, as_of: NaiveDate) -> AppResult<TrialBalance> {
        let cash = self.cash_balance().await?;
        let accounts_receivable = self.accounts_receivable().await?;
        let inventory = self.inventory_value().await?;
        let accounts_payable = self.accounts_payable().await?;
        let (tax_collected, tax_paid) = self.tax_totals().await?;
        let revenue: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0) FROM sales")
                .fetch_one(&self.db)
                .await?;
        let cost_of_goods_sold: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity * cost_price), 0) FROM sale_items",
        )
        .fetch_one(&self.db)
        .await?;

        let assets = self.fetch_assets().await?;
        let assets_at_cost: Decimal = assets.iter().map(|a| a.acquisition_cost).sum();
        let accumulated_depreciation: Decimal =
            assets.iter().map(|a| a.accumulated_as_of(as_of)).sum();

        let mut rows = Vec::new();
        let mut push = |account: &str, debit: Decimal, credit: Decimal| {
            if debit != Decimal::ZERO || credit != Decimal::ZERO {
                rows.push(TrialBalanceRow {
                    account: account.to_string(),
                    debit,
                    credit,
                });
            }
        };

        if cash >= Decimal::ZERO {
            push("Cash", cash, Decimal::ZERO);
        } else {
            push("Cash", Decimal::ZERO, -cash);
        }
        push("Accounts receivable", accounts_receivable, Decimal::ZERO);
        push("Inventory", inventory, Decimal::ZERO);
        push("Fixed assets at cost", assets_at_cost, Decimal::ZERO);
        push(
            "Accumulated depreciation",
            Decimal::ZERO,
            accumulated_depreciation,
        );
        push("Depreciation expense", accumulated_depreciation, Decimal::ZERO);
        push("Cost of goods sold", cost_of_goods_sold, Decimal::ZERO);
        push("Tax paid", tax_paid, Decimal::ZERO);
        push("Accounts payable", Decimal::ZERO, accounts_payable);
        push("Tax collected", Decimal::ZERO, tax_collected);
        push("Sales revenue", Decimal::ZERO, revenue);

        append_equity_plug(&mut rows);

        let total_debits: Decimal = rows.iter().map(|r| r.debit).sum();
        let total_credits: Decimal = rows.iter().map(|r| r.credit).sum();

        Ok(TrialBalance {
            as_of,
            rows,
            total_debits,
            total_credits,
        })
    }

    /// Assets against liabilities and the equity that closes the gap
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> AppResult<BalanceSheet> {
        let cash = self.cash_balance().await?;
        let accounts_receivable = self.accounts_receivable().await?;
        let inventory = self.inventory_value().await?;
        let accounts_payable = self.accounts_payable().await?;
        let (tax_collected, tax_paid) = self.tax_totals().await?;

        let assets = self.fetch_assets().await?;
        let fixed_assets_net: Decimal = assets
            .iter()
            .map(|a| a.acquisition_cost - a.accumulated_as_of(as_of))
            .sum();

        let total_assets = cash + accounts_receivable + inventory + fixed_assets_net;
        let tax_payable = tax_collected - tax_paid;
        let total_liabilities = accounts_payable + tax_payable;
        let owners_equity = total_assets - total_liabilities;

        Ok(BalanceSheet {
            as_of,
            cash,
            accounts_receivable,
            inventory,
            fixed_assets_net,
            total_assets,
            accounts_payable,
            tax_payable,
            total_liabilities,
            owners_equity,
            total_liabilities_and_equity: total_liabilities + owners_equity,
        })
    }

    /// Every document in the period, merged chronologically
    pub async fn general_ledger(&self, range: &ReportRange) -> AppResult<GeneralLedger> {
        let (start, end) = range.bounds();
        let mut entries = Vec::new();

        let sales = sqlx::query_as::<_, (Uuid, NaiveDate, Decimal)>(
            r#"
            SELECT id, sold_at::date, total_amount FROM sales
            WHERE sold_at::date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;
        for (id, date, amount) in sales {
            entries.push(LedgerEntry {
                entry_date: date,
                account: "Sales revenue".to_string(),
                source: "sale".to_string(),
                reference: id,
                description: "Sale".to_string(),
                debit: Decimal::ZERO,
                credit: amount,
            });
        }

        let payments = sqlx::query_as::<_, (Uuid, NaiveDate, Decimal, String)>(
            r#"
            SELECT id, paid_at::date, amount, counterparty FROM payments
            WHERE paid_at::date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;
        for (id, date, amount, counterparty) in payments {
            let (description, debit, credit) = if counterparty == "customer" {
                ("Customer payment", amount, Decimal::ZERO)
            } else {
                ("Supplier payment", Decimal::ZERO, amount)
            };
            entries.push(LedgerEntry {
                entry_date: date,
                account: "Cash".to_string(),
                source: "payment".to_string(),
                reference: id,
                description: description.to_string(),
                debit,
                credit,
            });
        }

        let receipts = sqlx::query_as::<_, (Uuid, NaiveDate, Decimal)>(
            r#"
            SELECT id, order_date, total_amount FROM purchase_orders
            WHERE status = 'received' AND order_date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;
        for (id, date, amount) in receipts {
            entries.push(LedgerEntry {
                entry_date: date,
                account: "Inventory".to_string(),
                source: "purchase_order".to_string(),
                reference: id,
                description: "Goods received".to_string(),
                debit: amount,
                credit: Decimal::ZERO,
            });
        }

        let taxes = sqlx::query_as::<_, (Uuid, String, Decimal)>(
            r#"
            SELECT id, period, tax_amount FROM tax_entries
            WHERE kind = 'paid' AND period BETWEEN $1 AND $2
            "#,
        )
        .bind(start.format("%Y-%m").to_string())
        .bind(end.format("%Y-%m").to_string())
        .fetch_all(&self.db)
        .await?;
        for (id, period, amount) in taxes {
            let entry_date = NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d")
                .map_err(|e| AppError::Internal(format!("Bad tax period {}: {}", period, e)))?;
            entries.push(LedgerEntry {
                entry_date,
                account: "Tax".to_string(),
                source: "tax_entry".to_string(),
                reference: id,
                description: format!("Tax paid for {}", period),
                debit: Decimal::ZERO,
                credit: amount,
            });
        }

        entries.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.source.cmp(&b.source))
        });

        let total_debits: Decimal = entries.iter().map(|e| e.debit).sum();
        let total_credits: Decimal = entries.iter().map(|e| e.credit).sum();

        Ok(GeneralLedger {
            start_date: start,
            end_date: end,
            entries,
            total_debits,
            total_credits,
        })
    }

    /// Serialize report rows to CSV for download
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }

    async fn cash_balance(&self) -> AppResult<Decimal> {
        let received: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE counterparty = 'customer'",
        )
        .fetch_one(&self.db)
        .await?;
        let paid_out: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE counterparty = 'supplier'",
        )
        .fetch_one(&self.db)
        .await?;
        let tax_paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(tax_amount), 0) FROM tax_entries WHERE kind = 'paid'",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(received - paid_out - tax_paid)
    }

    async fn accounts_receivable(&self) -> AppResult<Decimal> {
        let receivable: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount - amount_paid), 0) FROM sales",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(receivable)
    }

    async fn inventory_value(&self) -> AppResult<Decimal> {
        let value: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_in_stock * cost_price), 0) FROM products",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(value)
    }

    async fn accounts_payable(&self) -> AppResult<Decimal> {
        let received: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM purchase_orders WHERE status = 'received'",
        )
        .fetch_one(&self.db)
        .await?;
        let paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE counterparty = 'supplier'",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(received - paid)
    }

    async fn tax_totals(&self) -> AppResult<(Decimal, Decimal)> {
        let collected: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(tax_amount), 0) FROM tax_entries WHERE kind = 'collected'",
        )
        .fetch_one(&self.db)
        .await?;
        let paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(tax_amount), 0) FROM tax_entries WHERE kind = 'paid'",
        )
        .fetch_one(&self.db)
        .await?;
        Ok((collected, paid))
    }

    async fn fetch_assets(&self) -> AppResult<Vec<AssetRow>> {
        let assets = sqlx::query_as::<_, AssetRow>(
            "SELECT acquisition_cost, salvage_value, acquired_on, useful_life_months FROM fixed_assets",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(assets)
    }

    async fn depreciation_between(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Decimal> {
        let assets = self.fetch_assets().await?;
        let expense = assets
            .iter()
            .map(|a| a.accumulated_as_of(end) - a.accumulated_as_of(start))
            .map(|d| d.max(Decimal::ZERO))
            .sum();
        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn row(account: &str, debit: &str, credit: &str) -> TrialBalanceRow {
        TrialBalanceRow {
            account: account.to_string(),
            debit: dec(debit),
            credit: dec(credit),
        }
    }

    #[test]
    fn test_equity_plug_balances_the_columns() {
        let mut rows = vec![row("Cash", "800", "0"), row("Sales revenue", "0", "500")];
        append_equity_plug(&mut rows);

        let debits: Decimal = rows.iter().map(|r| r.debit).sum();
        let credits: Decimal = rows.iter().map(|r| r.credit).sum();
        assert_eq!(debits, credits);
        assert_eq!(rows.last().unwrap().credit, dec("300"));
    }

    #[test]
    fn test_equity_plug_lands_debit_side_when_credits_lead() {
        let mut rows = vec![
            row("Accounts payable", "0", "900"),
            row("Inventory", "250", "0"),
        ];
        append_equity_plug(&mut rows);

        let plug = rows.last().unwrap();
        assert_eq!(plug.debit, dec("650"));
        assert_eq!(plug.credit, Decimal::ZERO);
    }
}
