//! Index-price lookups behind a freshness-bounded cache.
//!
//! The source itself is an external collaborator. [`CachedMarketData`] keeps
//! the last good answer per key and hands it back marked stale when the
//! source fails, so callers never see a fetch error.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::money::{ratio, round_cents};

pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexQuote {
    pub price: f64,
    pub change: f64,
    pub percent_change: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketDataError {
    #[error("market data unavailable: {0}")]
    Unavailable(String),
    #[error("no price data for period {period} at interval {interval}")]
    EmptySeries { period: String, interval: String },
}

pub trait MarketDataSource: Send + Sync {
    fn current_price(&self) -> Result<IndexQuote, MarketDataError>;
    fn historical_series(
        &self,
        period: &str,
        interval: &str,
    ) -> Result<Vec<PricePoint>, MarketDataError>;
}

/// Builds a quote from the last two closes of a series. A single point is
/// compared against its own open.
pub fn quote_from_series(
    points: &[PricePoint],
    timestamp: DateTime<Utc>,
) -> Result<IndexQuote, MarketDataError> {
    let Some(latest) = points.last() else {
        return Err(MarketDataError::Unavailable("empty price series".to_string()));
    };
    let previous_close = match points.len() {
        1 => latest.open,
        n => points[n - 2].close,
    };
    let change = latest.close - previous_close;
    Ok(IndexQuote {
        price: round_cents(latest.close),
        change: round_cents(change),
        percent_change: round_cents(ratio(change, previous_close) * 100.0),
        timestamp,
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Fetched from the source on this call.
    Live,
    /// Served from cache inside the freshness window.
    Cached,
    /// The source failed; this is the last value it returned.
    Stale,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observed<T> {
    pub value: T,
    pub freshness: Freshness,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    fetched_at: DateTime<Utc>,
    stored: Instant,
}

type SeriesKey = (String, String);

pub struct CachedMarketData<S> {
    source: S,
    freshness: Duration,
    quote: Mutex<Option<Entry<IndexQuote>>>,
    series: Mutex<HashMap<SeriesKey, Entry<Vec<PricePoint>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("market data cache mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

fn cached<T: Clone>(entry: &Entry<T>, freshness: Duration) -> Option<Observed<T>> {
    (entry.stored.elapsed() < freshness).then(|| Observed {
        value: entry.value.clone(),
        freshness: Freshness::Cached,
        fetched_at: entry.fetched_at,
    })
}

fn stale<T: Clone>(entry: &Entry<T>) -> Observed<T> {
    Observed {
        value: entry.value.clone(),
        freshness: Freshness::Stale,
        fetched_at: entry.fetched_at,
    }
}

fn store<T: Clone>(value: T) -> (Entry<T>, Observed<T>) {
    let fetched_at = Utc::now();
    let observed = Observed {
        value: value.clone(),
        freshness: Freshness::Live,
        fetched_at,
    };
    (
        Entry {
            value,
            fetched_at,
            stored: Instant::now(),
        },
        observed,
    )
}

impl<S: MarketDataSource> CachedMarketData<S> {
    pub fn new(source: S) -> Self {
        Self::with_freshness(source, DEFAULT_FRESHNESS)
    }

    pub fn with_freshness(source: S, freshness: Duration) -> Self {
        Self {
            source,
            freshness,
            quote: Mutex::new(None),
            series: Mutex::new(HashMap::new()),
        }
    }

    /// Current index quote, or `None` if the source has never answered.
    pub fn current_price(&self) -> Option<Observed<IndexQuote>> {
        if let Some(hit) = lock(&self.quote).as_ref().and_then(|e| cached(e, self.freshness)) {
            debug!("returning cached index quote");
            return Some(hit);
        }

        // The lock is released while the source is queried.
        match self.source.current_price() {
            Ok(quote) => {
                let (entry, observed) = store(quote);
                *lock(&self.quote) = Some(entry);
                Some(observed)
            }
            Err(err) => {
                let guard = lock(&self.quote);
                match guard.as_ref() {
                    Some(entry) => {
                        warn!(error = %err, "index quote fetch failed, serving stale value");
                        Some(stale(entry))
                    }
                    None => {
                        warn!(error = %err, "index quote fetch failed with nothing cached");
                        None
                    }
                }
            }
        }
    }

    pub fn historical_series(
        &self,
        period: &str,
        interval: &str,
    ) -> Option<Observed<Vec<PricePoint>>> {
        let key = (period.to_string(), interval.to_string());
        if let Some(hit) = lock(&self.series).get(&key).and_then(|e| cached(e, self.freshness)) {
            debug!(period, interval, "returning cached price series");
            return Some(hit);
        }

        let fetched = self
            .source
            .historical_series(period, interval)
            .and_then(|points| {
                if points.is_empty() {
                    Err(MarketDataError::EmptySeries {
                        period: period.to_string(),
                        interval: interval.to_string(),
                    })
                } else {
                    Ok(points)
                }
            });

        match fetched {
            Ok(points) => {
                let (entry, observed) = store(points);
                lock(&self.series).insert(key, entry);
                Some(observed)
            }
            Err(err) => {
                let guard = lock(&self.series);
                let previous = guard.get(&key).map(stale);
                if previous.is_some() {
                    warn!(
                        error = %err,
                        period,
                        interval,
                        "price series fetch failed, serving stale value"
                    );
                } else {
                    warn!(
                        error = %err,
                        period,
                        interval,
                        "price series fetch failed with nothing cached"
                    );
                }
                previous
            }
        }
    }
}
