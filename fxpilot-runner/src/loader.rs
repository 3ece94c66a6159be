//! Snapshot loading from JSON documents and OHLCV CSV files.
//!
//! A JSON snapshot is `{ pair, current_price, history, indicators? }`; the
//! indicator bundle is derived from the history when it is missing. A CSV
//! file carries `date,open,high,low,close,volume` rows and is priced at its
//! last close.
//!
//! Daily reference rates come in long form, one row per currency and date:
//! `currency,base_currency,exchange_rate,date` (extra columns ignored).
//! [`RateTable`] pivots them by date and derives any cross pair as
//! quote rate / base rate.
//!
//! [`snapshot_as_of`] cuts any snapshot back to the candles on or before a
//! date.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use fxpilot_core::domain::{MarketSnapshot, Ohlcv, SnapshotError};
use serde::Deserialize;
use thiserror::Error;

/// Columns a long-form rate file must carry (case-insensitive).
pub const RATE_COLUMNS: [&str; 4] = ["currency", "base_currency", "exchange_rate", "date"];

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV at row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("CSV contains no candles")]
    EmptyCsv,

    #[error("rate file is missing columns: {0}")]
    MissingColumns(String),

    #[error("rate file mixes base currencies {expected} and {found}")]
    MixedBase { expected: String, found: String },

    #[error("invalid exchange rate {rate} at row {row}")]
    InvalidRate { row: usize, rate: f64 },

    #[error("'{0}' is not a six-letter currency pair")]
    InvalidPair(String),

    #[error("no rates for {currency} (needed by {pair})")]
    UnknownCurrency { pair: String, currency: String },

    #[error("no dates quote both legs of {0}")]
    NoOverlap(String),

    #[error("no candles on or before {0}")]
    NoHistoryAsOf(NaiveDate),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parses a JSON snapshot document.
pub fn snapshot_from_json_str(text: &str) -> Result<MarketSnapshot, LoadError> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_snapshot_json(path: impl AsRef<Path>) -> Result<MarketSnapshot, LoadError> {
    let path = path.as_ref();
    let mut text = String::new();
    open(path)?
        .read_to_string(&mut text)
        .map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let snapshot = snapshot_from_json_str(&text)?;
    tracing::debug!(
        path = %path.display(),
        pair = snapshot.pair(),
        candles = snapshot.history().len(),
        "loaded JSON snapshot"
    );
    Ok(snapshot)
}

/// Writes `snapshot` as pretty JSON, indicators included.
pub fn write_snapshot_json(
    path: impl AsRef<Path>,
    snapshot: &MarketSnapshot,
) -> Result<(), LoadError> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, text).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reads OHLCV rows from any CSV source.
pub fn candles_from_csv<R: Read>(reader: R) -> Result<Vec<Ohlcv>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();
    for (i, record) in rdr.deserialize::<Ohlcv>().enumerate() {
        // row 1 is the header
        let candle = record.map_err(|source| LoadError::Csv { row: i + 2, source })?;
        candles.push(candle);
    }
    Ok(candles)
}

/// Builds a snapshot for `pair` from CSV rows, priced at the last close.
pub fn snapshot_from_csv<R: Read>(reader: R, pair: &str) -> Result<MarketSnapshot, LoadError> {
    let candles = candles_from_csv(reader)?;
    let price = candles.last().ok_or(LoadError::EmptyCsv)?.close;
    Ok(MarketSnapshot::from_history(pair, price, candles)?)
}

pub fn load_csv(path: impl AsRef<Path>, pair: &str) -> Result<MarketSnapshot, LoadError> {
    let path = path.as_ref();
    let snapshot = snapshot_from_csv(open(path)?, pair)?;
    tracing::debug!(
        path = %path.display(),
        pair,
        candles = snapshot.history().len(),
        "loaded CSV history"
    );
    Ok(snapshot)
}

/// Keeps the candles dated on or before `as_of`.
///
/// An untouched history returns the snapshot as is. A shortened one is
/// re-priced at its last close with indicators derived from what remains.
pub fn snapshot_as_of(
    snapshot: &MarketSnapshot,
    as_of: NaiveDate,
) -> Result<MarketSnapshot, LoadError> {
    let history: Vec<Ohlcv> = snapshot
        .history()
        .iter()
        .filter(|c| c.date <= as_of)
        .cloned()
        .collect();
    if history.len() == snapshot.history().len() {
        return Ok(snapshot.clone());
    }
    let price = history.last().ok_or(LoadError::NoHistoryAsOf(as_of))?.close;
    tracing::debug!(
        pair = snapshot.pair(),
        %as_of,
        kept = history.len(),
        dropped = snapshot.history().len() - history.len(),
        "history cut off"
    );
    Ok(MarketSnapshot::from_history(snapshot.pair(), price, history)?)
}

// ─── Long-form reference rates ───

/// Units of `currency` per one `base_currency` on `date`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateRecord {
    pub currency: String,
    pub base_currency: String,
    pub exchange_rate: f64,
    pub date: NaiveDate,
}

/// Daily rates pivoted to one row per date, every currency quoted against a
/// single base.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    base: String,
    rows: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl RateTable {
    /// Adds one record; a repeated (date, currency) keeps the later row.
    fn insert(&mut self, row: usize, record: RateRecord) -> Result<(), LoadError> {
        let base = record.base_currency.trim().to_ascii_uppercase();
        if self.base.is_empty() {
            self.base = base;
        } else if self.base != base {
            return Err(LoadError::MixedBase {
                expected: self.base.clone(),
                found: base,
            });
        }
        if !record.exchange_rate.is_finite() || record.exchange_rate <= 0.0 {
            return Err(LoadError::InvalidRate {
                row,
                rate: record.exchange_rate,
            });
        }
        self.rows
            .entry(record.date)
            .or_default()
            .insert(record.currency.trim().to_ascii_uppercase(), record.exchange_rate);
        Ok(())
    }

    /// The currency every rate is quoted against.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn dates(&self) -> usize {
        self.rows.len()
    }

    /// Quoted currencies plus the base.
    pub fn currencies(&self) -> BTreeSet<&str> {
        let mut codes: BTreeSet<&str> = self
            .rows
            .values()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        if !self.base.is_empty() {
            codes.insert(self.base.as_str());
        }
        codes
    }

    /// Rate of `code` per base unit on `date`; the base itself is 1.
    fn rate(&self, date: &NaiveDate, code: &str) -> Option<f64> {
        if code == self.base {
            return self.rows.contains_key(date).then_some(1.0);
        }
        self.rows.get(date).and_then(|row| row.get(code)).copied()
    }

    /// Dated closes of `pair` (`EURUSD`, `eur/usd`, ...) on every date that
    /// quotes both legs.
    pub fn pair_rates(&self, pair: &str) -> Result<Vec<(NaiveDate, f64)>, LoadError> {
        let (base, quote) = split_pair(pair)?;
        let codes = self.currencies();
        for code in [&base, &quote] {
            if !codes.contains(code.as_str()) {
                return Err(LoadError::UnknownCurrency {
                    pair: format!("{base}{quote}"),
                    currency: code.clone(),
                });
            }
        }
        let rates: Vec<(NaiveDate, f64)> = self
            .rows
            .keys()
            .filter_map(|date| {
                let b = self.rate(date, &base)?;
                let q = self.rate(date, &quote)?;
                Some((*date, q / b))
            })
            .collect();
        if rates.is_empty() {
            return Err(LoadError::NoOverlap(format!("{base}{quote}")));
        }
        Ok(rates)
    }

    /// Close-only candles for `pair`: each opens at the previous close and
    /// carries no volume.
    pub fn candles(&self, pair: &str) -> Result<Vec<Ohlcv>, LoadError> {
        let rates = self.pair_rates(pair)?;
        let mut prev = rates[0].1;
        Ok(rates
            .into_iter()
            .map(|(date, close)| {
                let open = std::mem::replace(&mut prev, close);
                Ohlcv {
                    date,
                    open,
                    high: open.max(close),
                    low: open.min(close),
                    close,
                    volume: 0.0,
                }
            })
            .collect())
    }

    /// Snapshot of `pair` priced at its last derived rate.
    pub fn snapshot(&self, pair: &str) -> Result<MarketSnapshot, LoadError> {
        let (base, quote) = split_pair(pair)?;
        let candles = self.candles(pair)?;
        let pair = format!("{base}{quote}");
        let price = candles
            .last()
            .ok_or_else(|| LoadError::NoOverlap(pair.clone()))?
            .close;
        Ok(MarketSnapshot::from_history(pair, price, candles)?)
    }
}

fn split_pair(pair: &str) -> Result<(String, String), LoadError> {
    let code: String = pair
        .trim()
        .chars()
        .filter(|c| *c != '/')
        .collect::<String>()
        .to_ascii_uppercase();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LoadError::InvalidPair(pair.to_string()));
    }
    Ok((code[..3].to_string(), code[3..].to_string()))
}

/// Reads long-form rate rows from any CSV source. Header names are matched
/// case-insensitively.
pub fn rates_from_csv<R: Read>(reader: R) -> Result<RateTable, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: csv::StringRecord = rdr
        .headers()
        .map_err(|source| LoadError::Csv { row: 1, source })?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let missing: Vec<&str> = RATE_COLUMNS
        .into_iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing.join(", ")));
    }
    rdr.set_headers(headers);

    let mut table = RateTable::default();
    for (i, record) in rdr.deserialize::<RateRecord>().enumerate() {
        let record = record.map_err(|source| LoadError::Csv { row: i + 2, source })?;
        table.insert(i + 2, record)?;
    }
    Ok(table)
}

pub fn load_rates(path: impl AsRef<Path>) -> Result<RateTable, LoadError> {
    let path = path.as_ref();
    let table = rates_from_csv(open(path)?)?;
    tracing::debug!(
        path = %path.display(),
        base = table.base(),
        dates = table.dates(),
        currencies = table.currencies().len(),
        "loaded reference rates"
    );
    Ok(table)
}
