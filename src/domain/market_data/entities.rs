use serde::{Deserialize, Serialize};

use super::value_objects::Timestamp;

/// Decimal places used for prices and amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Precision {
    pub price: Option<u32>,
    pub amount: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub price: MinMax,
    pub amount: MinMax,
    pub cost: MinMax,
}

/// Tradable instrument as listed in the symbol catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Externally displayed ticker, e.g. `BTC/USDT`
    pub symbol: String,
    pub base: String,
    pub quote: String,
    #[serde(default)]
    pub precision: Precision,
    #[serde(default)]
    pub limits: Limits,
}

impl SymbolRecord {
    pub fn new(symbol: impl Into<String>, base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            base: base.into(),
            quote: quote.into(),
            precision: Precision::default(),
            limits: Limits::default(),
        }
    }

    pub fn with_precision(mut self, price: u32, amount: u32) -> Self {
        self.precision = Precision { price: Some(price), amount: Some(amount) };
        self
    }

    pub fn with_price_limits(mut self, min: f64, max: Option<f64>) -> Self {
        self.limits.price = MinMax { min: Some(min), max };
        self
    }

    /// Smallest price step: the price floor when positive, otherwise the precision digits
    pub fn min_price_increment(&self) -> Option<f64> {
        match self.limits.price.min {
            Some(min) if min.is_finite() && min > 0.0 => Some(min),
            _ => self.precision.price.map(|digits| 1.0 / 10f64.powi(digits as i32)),
        }
    }
}

/// One OHLCV candle; `time` is the bucket open in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(time: Timestamp, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { time, open, high, low, close, volume }
    }

    /// High bounds the body, low floors it, volume is non-negative
    pub fn is_consistent(&self) -> bool {
        self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }
}

/// Bars gathered by one historical load, kept sorted and unique by time
#[derive(Debug, Clone, Default)]
pub struct AccumulatedBarSet {
    bars: Vec<Bar>,
}

impl AccumulatedBarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bar: Bar) {
        if let Some(last) = self.bars.last_mut() {
            if last.time == bar.time {
                *last = bar;
                return;
            }
            if bar.time < last.time {
                self.insert_sorted(bar);
                return;
            }
        }
        self.bars.push(bar);
    }

    pub fn extend(&mut self, bars: impl IntoIterator<Item = Bar>) {
        for bar in bars {
            self.push(bar);
        }
    }

    fn insert_sorted(&mut self, bar: Bar) {
        match self.bars.binary_search_by(|existing| existing.time.cmp(&bar.time)) {
            Ok(pos) => self.bars[pos] = bar,
            Err(pos) => self.bars.insert(pos, bar),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}
