//! Fixed asset register with straight-line depreciation derived at
//! read time

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::costing::{elapsed_months, straight_line_depreciation, DepreciationSchedule};
use shared::validation::validate_positive_amount;

/// Fixed asset service
#[derive(Clone)]
pub struct AssetService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FixedAsset {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub acquisition_cost: Decimal,
    pub salvage_value: Decimal,
    pub acquired_on: NaiveDate,
    pub useful_life_months: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An asset with its depreciation position as of a given date
#[derive(Debug, Serialize)]
pub struct AssetWithDepreciation {
    #[serde(flatten)]
    pub asset: FixedAsset,
    pub months_elapsed: i64,
    pub depreciation: DepreciationSchedule,
}

/// One line of the depreciation schedule report
#[derive(Debug, Serialize)]
pub struct DepreciationReport {
    pub as_of: NaiveDate,
    pub assets: Vec<AssetWithDepreciation>,
    pub total_acquisition_cost: Decimal,
    pub total_accumulated_depreciation: Decimal,
    pub total_book_value: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssetInput {
    pub name: String,
    pub category: Option<String>,
    pub acquisition_cost: Decimal,
    #[serde(default)]
    pub salvage_value: Decimal,
    pub acquired_on: NaiveDate,
    pub useful_life_months: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssetInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub acquisition_cost: Option<Decimal>,
    pub salvage_value: Option<Decimal>,
    pub acquired_on: Option<NaiveDate>,
    pub useful_life_months: Option<i32>,
}

fn validate_asset(
    name: &str,
    acquisition_cost: Decimal,
    salvage_value: Decimal,
    useful_life_months: i32,
) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "name".to_string(),
            message: "Name must not be empty".to_string(),
        });
    }
    validate_positive_amount(acquisition_cost).map_err(|message| AppError::Validation {
        field: "acquisition_cost".to_string(),
        message: message.to_string(),
    })?;
    if salvage_value < Decimal::ZERO || salvage_value > acquisition_cost {
        return Err(AppError::Validation {
            field: "salvage_value".to_string(),
            message: "Salvage value must be between zero and the acquisition cost".to_string(),
        });
    }
    if useful_life_months <= 0 {
        return Err(AppError::Validation {
            field: "useful_life_months".to_string(),
            message: "Useful life must be at least one month".to_string(),
        });
    }
    Ok(())
}

fn with_depreciation(asset: FixedAsset, as_of: NaiveDate) -> AssetWithDepreciation {
    let months = elapsed_months(asset.acquired_on, as_of);
    let depreciation = straight_line_depreciation(
        asset.acquisition_cost,
        asset.salvage_value,
        asset.useful_life_months,
        months,
    );
    AssetWithDepreciation {
        asset,
        months_elapsed: months,
        depreciation,
    }
}

impl AssetService {
    /// Create a new AssetService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a fixed asset
    pub async fn create(&self, input: CreateAssetInput) -> AppResult<FixedAsset> {
        validate_asset(
            &input.name,
            input.acquisition_cost,
            input.salvage_value,
            input.useful_life_months,
        )?;

        let asset = sqlx::query_as::<_, FixedAsset>(
            r#"
            INSERT INTO fixed_assets (name, category, acquisition_cost, salvage_value, acquired_on, useful_life_months)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, category, acquisition_cost, salvage_value, acquired_on,
                      useful_life_months, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(input.category.as_deref())
        .bind(input.acquisition_cost)
        .bind(input.salvage_value)
        .bind(input.acquired_on)
        .bind(input.useful_life_months)
        .fetch_one(&self.db)
        .await?;

        Ok(asset)
    }

    /// List assets with their depreciation position
    pub async fn list(&self, as_of: NaiveDate) -> AppResult<Vec<AssetWithDepreciation>> {
        let assets = sqlx::query_as::<_, FixedAsset>(
            r#"
            SELECT id, name, category, acquisition_cost, salvage_value, acquired_on,
                   useful_life_months, created_at, updated_at
            FROM fixed_assets
            ORDER BY acquired_on, name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(assets
            .into_iter()
            .map(|asset| with_depreciation(asset, as_of))
            .collect())
    }

    /// Get one asset with its depreciation position
    pub async fn get(&self, asset_id: Uuid, as_of: NaiveDate) -> AppResult<AssetWithDepreciation> {
        let asset = self.fetch(asset_id).await?;
        Ok(with_depreciation(asset, as_of))
    }

    /// Update an asset
    pub async fn update(&self, asset_id: Uuid, input: UpdateAssetInput) -> AppResult<FixedAsset> {
        let existing = self.fetch(asset_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let category = input.category.or(existing.category);
        let acquisition_cost = input.acquisition_cost.unwrap_or(existing.acquisition_cost);
        let salvage_value = input.salvage_value.unwrap_or(existing.salvage_value);
        let acquired_on = input.acquired_on.unwrap_or(existing.acquired_on);
        let useful_life_months = input.useful_life_months.unwrap_or(existing.useful_life_months);

        validate_asset(&name, acquisition_cost, salvage_value, useful_life_months)?;

        let asset = sqlx::query_as::<_, FixedAsset>(
            r#"
            UPDATE fixed_assets
            SET name = $1, category = $2, acquisition_cost = $3, salvage_value = $4,
                acquired_on = $5, useful_life_months = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING id, name, category, acquisition_cost, salvage_value, acquired_on,
                      useful_life_months, created_at, updated_at
            "#,
        )
        .bind(name.trim())
        .bind(category.as_deref())
        .bind(acquisition_cost)
        .bind(salvage_value)
        .bind(acquired_on)
        .bind(useful_life_months)
        .bind(asset_id)
        .fetch_one(&self.db)
        .await?;

        Ok(asset)
    }

    /// Remove an asset from the register
    pub async fn delete(&self, asset_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM fixed_assets WHERE id = $1")
            .bind(asset_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Asset".to_string()));
        }
        Ok(())
    }

    /// Depreciation schedule over the whole register
    pub async fn depreciation_report(&self, as_of: NaiveDate) -> AppResult<DepreciationReport> {
        let assets = self.list(as_of).await?;

        let mut total_acquisition_cost = Decimal::ZERO;
        let mut total_accumulated_depreciation = Decimal::ZERO;
        let mut total_book_value = Decimal::ZERO;
        for entry in &assets {
            total_acquisition_cost += entry.asset.acquisition_cost;
            total_accumulated_depreciation += entry.depreciation.accumulated_depreciation;
            total_book_value += entry.depreciation.book_value;
        }

        Ok(DepreciationReport {
            as_of,
            assets,
            total_acquisition_cost,
            total_accumulated_depreciation,
            total_book_value,
        })
    }

    async fn fetch(&self, asset_id: Uuid) -> AppResult<FixedAsset> {
        sqlx::query_as::<_, FixedAsset>(
            r#"
            SELECT id, name, category, acquisition_cost, salvage_value, acquired_on,
                   useful_life_months, created_at, updated_at
            FROM fixed_assets
            WHERE id = $1
            "#,
        )
        .bind(asset_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset".to_string()))
    }
}
