use crate::services::indicators::{moving_average, MovingAverageKind};
use crate::value_objects::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub kind: MovingAverageKind,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
            kind: MovingAverageKind::Sma,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverSeries {
    pub short_ma: Vec<Option<f64>>,
    pub long_ma: Vec<Option<f64>>,
    pub signal: Vec<Signal>,
}

impl CrossoverSeries {
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }
}

/// Signal change at `index`, acted on at the open of `entry_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverEvent {
    pub index: usize,
    pub entry_index: usize,
    pub position: Signal,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
}

pub fn signal_at(short_ma: Option<f64>, long_ma: Option<f64>) -> Signal {
    match (short_ma, long_ma) {
        (Some(short), Some(long)) if short > long => Signal::Long,
        _ => Signal::Flat,
    }
}

pub fn compute_crossover(closes: &[f64], config: &CrossoverConfig) -> CrossoverSeries {
    let short_ma = moving_average(closes, config.short_window, config.kind);
    let long_ma = moving_average(closes, config.long_window, config.kind);
    let signal = short_ma
        .iter()
        .zip(long_ma.iter())
        .map(|(short, long)| signal_at(*short, *long))
        .collect();

    CrossoverSeries {
        short_ma,
        long_ma,
        signal,
    }
}

/// Signal flips that still have a following bar to enter on.
pub fn crossover_events(series: &CrossoverSeries) -> Vec<CrossoverEvent> {
    let len = series.len();
    if len < 3 {
        return Vec::new();
    }

    (1..len - 1)
        .filter(|&idx| series.signal[idx] != series.signal[idx - 1])
        .map(|idx| CrossoverEvent {
            index: idx,
            entry_index: idx + 1,
            position: series.signal[idx],
            short_ma: series.short_ma[idx],
            long_ma: series.long_ma[idx],
        })
        .collect()
}
