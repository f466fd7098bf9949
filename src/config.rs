// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub const KEY_CURRENCY: &str = "currency";
pub const KEY_DECIMAL_PLACES: &str = "decimal_places";
pub const KEY_PAGE_SIZE: &str = "page_size";

pub const KEYS: &[&str] = &[KEY_CURRENCY, KEY_DECIMAL_PLACES, KEY_PAGE_SIZE];

/// Upper bound accepted for `decimal_places`; rust_decimal carries at most 28.
const MAX_DECIMAL_PLACES: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementConfig {
    /// Display code only; amounts are never converted.
    pub currency: String,
    /// Precision allocated fee and tax shares are rounded to.
    pub decimal_places: u32,
    /// Default number of lines per report page.
    pub page_size: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            decimal_places: 2,
            page_size: 25,
        }
    }
}

impl SettlementConfig {
    /// Reads the settings table, falling back to defaults for missing keys.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut cfg = SettlementConfig::default();
        if let Some(v) = get_setting(conn, KEY_CURRENCY)? {
            cfg.currency = validate(KEY_CURRENCY, &v)?;
        }
        if let Some(v) = get_setting(conn, KEY_DECIMAL_PLACES)? {
            cfg.decimal_places = validate(KEY_DECIMAL_PLACES, &v)?
                .parse()
                .with_context(|| format!("Invalid {} '{}'", KEY_DECIMAL_PLACES, v))?;
        }
        if let Some(v) = get_setting(conn, KEY_PAGE_SIZE)? {
            cfg.page_size = validate(KEY_PAGE_SIZE, &v)?
                .parse()
                .with_context(|| format!("Invalid {} '{}'", KEY_PAGE_SIZE, v))?;
        }
        Ok(cfg)
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        vec![
            vec![KEY_CURRENCY.to_string(), self.currency.clone()],
            vec![KEY_DECIMAL_PLACES.to_string(), self.decimal_places.to_string()],
            vec![KEY_PAGE_SIZE.to_string(), self.page_size.to_string()],
        ]
    }
}

/// Checks a value for `key` and returns it in canonical form.
pub fn validate(key: &str, value: &str) -> Result<String> {
    let v = value.trim();
    match key {
        KEY_CURRENCY => {
            if v.len() != 3 || !v.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(anyhow!("Invalid currency '{}', expected a 3-letter code", v));
            }
            Ok(v.to_uppercase())
        }
        KEY_DECIMAL_PLACES => {
            let dp: u32 = v
                .parse()
                .with_context(|| format!("Invalid decimal_places '{}'", v))?;
            if dp > MAX_DECIMAL_PLACES {
                return Err(anyhow!(
                    "decimal_places must be at most {}, got {}",
                    MAX_DECIMAL_PLACES,
                    dp
                ));
            }
            Ok(dp.to_string())
        }
        KEY_PAGE_SIZE => {
            let n: usize = v
                .parse()
                .with_context(|| format!("Invalid page_size '{}'", v))?;
            if n == 0 {
                return Err(anyhow!("page_size must be at least 1"));
            }
            Ok(n.to_string())
        }
        other => Err(anyhow!(
            "Unknown setting '{}' (known: {})",
            other,
            KEYS.join(", ")
        )),
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<String> {
    let canonical = validate(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, &canonical],
    )?;
    Ok(canonical)
}
