//! Settings table accessors
//!
//! Key-value rows in `settings`, stored as text and parsed on read.

use sqlx::{Pool, Sqlite};
use vaidya_common::{Error, Result};

/// Settings key of the generative-language API key
pub const GENAI_API_KEY: &str = "genai_api_key";

/// Get the generative-language API key stored in the database
pub async fn get_genai_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, GENAI_API_KEY).await
}

pub async fn set_genai_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, GENAI_API_KEY, key).await
}

/// Translation debounce in milliseconds
///
/// **Default:** 500
pub async fn get_translation_debounce_ms(db: &Pool<Sqlite>) -> Result<u64> {
    get_setting(db, "translation_debounce_ms")
        .await
        .map(|opt| opt.unwrap_or(500))
}

/// Delay between capture and scoring in milliseconds
///
/// **Default:** 1000
pub async fn get_evaluation_settle_ms(db: &Pool<Sqlite>) -> Result<u64> {
    get_setting(db, "evaluation_settle_ms")
        .await
        .map(|opt| opt.unwrap_or(1000))
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
