//! # Store Settings Repository
//!
//! The single store profile row (`store_settings.id = 1`) printed in report
//! and invoice headers.

use chrono::Utc;
use dokan_core::validation::validate_store_settings;
use dokan_core::StoreSettings;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for the store profile.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns the store profile, or `None` before the first save.
    pub async fn get(&self) -> DbResult<Option<StoreSettings>> {
        let settings = sqlx::query_as::<_, StoreSettings>(
            r#"
            SELECT store_name, phone, address, city, state, zip, email,
                   tax_rate, currency, logo_url
            FROM store_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Validates and saves the store profile, replacing any previous one.
    pub async fn save(&self, settings: &StoreSettings) -> DbResult<()> {
        validate_store_settings(settings)?;
        debug!(store = %settings.store_name, "Saving store settings");

        sqlx::query(
            r#"
            INSERT INTO store_settings (
                id, store_name, phone, address, city, state, zip, email,
                tax_rate, currency, logo_url, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                store_name = excluded.store_name,
                phone = excluded.phone,
                address = excluded.address,
                city = excluded.city,
                state = excluded.state,
                zip = excluded.zip,
                email = excluded.email,
                tax_rate = excluded.tax_rate,
                currency = excluded.currency,
                logo_url = excluded.logo_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.store_name)
        .bind(&settings.phone)
        .bind(&settings.address)
        .bind(&settings.city)
        .bind(&settings.state)
        .bind(&settings.zip)
        .bind(&settings.email)
        .bind(settings.tax_rate)
        .bind(settings.currency.trim())
        .bind(&settings.logo_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use dokan_core::TaxRate;

    fn settings() -> StoreSettings {
        StoreSettings {
            store_name: "Rahman Traders".to_string(),
            phone: "+880 1711-000000".to_string(),
            address: "12 Station Road".to_string(),
            city: "Dhaka".to_string(),
            state: "Dhaka".to_string(),
            zip: "1207".to_string(),
            email: "rahman@example.com".to_string(),
            tax_rate: TaxRate::from_bps(750),
            currency: "BDT".to_string(),
            logo_url: None,
        }
    }

    #[tokio::test]
    async fn test_save_and_replace() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().settings();
        assert!(repo.get().await.unwrap().is_none());

        repo.save(&settings()).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), Some(settings()));

        let mut updated = settings();
        updated.store_name = "Rahman & Sons".to_string();
        updated.logo_url = Some("https://example.com/logo.png".to_string());
        repo.save(&updated).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().settings();

        let mut bad = settings();
        bad.currency = "taka".to_string();
        assert!(matches!(repo.save(&bad).await.unwrap_err(), DbError::Invalid(_)));
        assert!(repo.get().await.unwrap().is_none());
    }
}
