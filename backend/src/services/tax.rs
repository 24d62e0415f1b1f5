//! Tax service: named rates and per-period collected/paid entries

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::validation::{validate_positive_amount, validate_rate_percent};

/// Tax service
#[derive(Clone)]
pub struct TaxService {
    db: PgPool,
}

/// A named tax rate, e.g. "VAT 7.5%"
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaxRate {
    pub id: Uuid,
    pub name: String,
    pub rate_percent: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Whether an entry is tax collected on sales or tax paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxEntryKind {
    Collected,
    Paid,
}

impl TaxEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxEntryKind::Collected => "collected",
            TaxEntryKind::Paid => "paid",
        }
    }
}

/// A tax amount booked against a period
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaxEntry {
    pub id: Uuid,
    pub tax_rate_id: Uuid,
    pub kind: String,
    pub period: String,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaxRateInput {
    pub name: String,
    pub rate_percent: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaxRateInput {
    pub name: Option<String>,
    pub rate_percent: Option<Decimal>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RecordTaxEntryInput {
    pub tax_rate_id: Uuid,
    pub kind: TaxEntryKind,
    /// Calendar month the entry belongs to, `YYYY-MM`
    pub period: String,
    pub taxable_amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTaxEntriesFilter {
    pub period: Option<String>,
    pub tax_rate_id: Option<Uuid>,
    pub kind: Option<TaxEntryKind>,
}

fn validate_period(period: &str) -> AppResult<()> {
    let as_date = format!("{}-01", period);
    if period.len() != 7 || NaiveDate::parse_from_str(&as_date, "%Y-%m-%d").is_err() {
        return Err(AppError::Validation {
            field: "period".to_string(),
            message: "Period must be a calendar month in YYYY-MM form".to_string(),
        });
    }
    Ok(())
}

impl TaxService {
    /// Create a new TaxService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a tax rate
    pub async fn create_rate(&self, input: CreateTaxRateInput) -> AppResult<TaxRate> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name must not be empty".to_string(),
            });
        }
        validate_rate_percent(input.rate_percent).map_err(|message| AppError::Validation {
            field: "rate_percent".to_string(),
            message: message.to_string(),
        })?;

        let name_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tax_rates WHERE name = $1)",
        )
        .bind(&name)
        .fetch_one(&self.db)
        .await?;
        if name_taken {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let rate = sqlx::query_as::<_, TaxRate>(
            r#"
            INSERT INTO tax_rates (name, rate_percent)
            VALUES ($1, $2)
            RETURNING id, name, rate_percent, active, created_at
            "#,
        )
        .bind(&name)
        .bind(input.rate_percent)
        .fetch_one(&self.db)
        .await?;

        Ok(rate)
    }

    /// List tax rates, active first
    pub async fn list_rates(&self) -> AppResult<Vec<TaxRate>> {
        let rates = sqlx::query_as::<_, TaxRate>(
            r#"
            SELECT id, name, rate_percent, active, created_at
            FROM tax_rates
            ORDER BY active DESC, name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rates)
    }

    /// Update a tax rate
    pub async fn update_rate(&self, rate_id: Uuid, input: UpdateTaxRateInput) -> AppResult<TaxRate> {
        let existing = sqlx::query_as::<_, TaxRate>(
            "SELECT id, name, rate_percent, active, created_at FROM tax_rates WHERE id = $1",
        )
        .bind(rate_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tax rate".to_string()))?;

        let name = input
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or(existing.name);
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name must not be empty".to_string(),
            });
        }
        let rate_percent = input.rate_percent.unwrap_or(existing.rate_percent);
        validate_rate_percent(rate_percent).map_err(|message| AppError::Validation {
            field: "rate_percent".to_string(),
            message: message.to_string(),
        })?;
        let active = input.active.unwrap_or(existing.active);

        let rate = sqlx::query_as::<_, TaxRate>(
            r#"
            UPDATE tax_rates
            SET name = $1, rate_percent = $2, active = $3
            WHERE id = $4
            RETURNING id, name, rate_percent, active, created_at
            "#,
        )
        .bind(&name)
        .bind(rate_percent)
        .bind(active)
        .bind(rate_id)
        .fetch_one(&self.db)
        .await?;

        Ok(rate)
    }

    /// Delete a tax rate that has no entries booked against it
    pub async fn delete_rate(&self, rate_id: Uuid) -> AppResult<()> {
        let has_entries = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tax_entries WHERE tax_rate_id = $1)",
        )
        .bind(rate_id)
        .fetch_one(&self.db)
        .await?;
        if has_entries {
            return Err(AppError::Conflict {
                resource: "tax_rate".to_string(),
                message: "Tax rate has entries recorded".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM tax_rates WHERE id = $1")
            .bind(rate_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Tax rate".to_string()));
        }
        Ok(())
    }

    /// Book a tax entry. The tax amount comes off the rate, never off
    /// the client.
    pub async fn record_entry(&self, input: RecordTaxEntryInput) -> AppResult<TaxEntry> {
        validate_period(&input.period)?;
        validate_positive_amount(input.taxable_amount).map_err(|message| {
            AppError::Validation {
                field: "taxable_amount".to_string(),
                message: message.to_string(),
            }
        })?;

        let rate: Decimal = sqlx::query_scalar(
            "SELECT rate_percent FROM tax_rates WHERE id = $1 AND active",
        )
        .bind(input.tax_rate_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tax rate".to_string()))?;

        let tax_amount = (input.taxable_amount * rate / Decimal::from(100)).round_dp(2);

        let entry = sqlx::query_as::<_, TaxEntry>(
            r#"
            INSERT INTO tax_entries (tax_rate_id, kind, period, taxable_amount, tax_amount, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tax_rate_id, kind, period, taxable_amount, tax_amount, note, created_at
            "#,
        )
        .bind(input.tax_rate_id)
        .bind(input.kind.as_str())
        .bind(&input.period)
        .bind(input.taxable_amount)
        .bind(tax_amount)
        .bind(input.note.as_deref())
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    /// List tax entries, newest period first
    pub async fn list_entries(&self, filter: &ListTaxEntriesFilter) -> AppResult<Vec<TaxEntry>> {
        let entries = sqlx::query_as::<_, TaxEntry>(
            r#"
            SELECT id, tax_rate_id, kind, period, taxable_amount, tax_amount, note, created_at
            FROM tax_entries
            WHERE ($1::text IS NULL OR period = $1)
              AND ($2::uuid IS NULL OR tax_rate_id = $2)
              AND ($3::text IS NULL OR kind = $3)
            ORDER BY period DESC, created_at DESC
            "#,
        )
        .bind(filter.period.as_deref())
        .bind(filter.tax_rate_id)
        .bind(filter.kind.map(|k| k.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_must_be_a_calendar_month() {
        assert!(validate_period("2025-06").is_ok());
        assert!(validate_period("2025-13").is_err());
        assert!(validate_period("2025-6").is_err());
        assert!(validate_period("June 2025").is_err());
        assert!(validate_period("2025-06-01").is_err());
    }
}
