use crate::value_objects::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct PnlSeries {
    /// Simple close-to-close return of each bar; 0 for the first bar.
    pub returns: Vec<f64>,
    /// `signal[i - 1] * returns[i]`.
    pub strategy_returns: Vec<f64>,
    /// Running sum of `strategy_returns`.
    pub pnl: Vec<f64>,
}

impl PnlSeries {
    pub fn len(&self) -> usize {
        self.pnl.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pnl.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.pnl.last().copied().unwrap_or(0.0)
    }

    /// Keeps bars from `offset` on as if the series started there: the first
    /// kept return and PnL are 0.
    pub fn rebased_from(&self, offset: usize) -> PnlSeries {
        let offset = offset.min(self.len());
        let base = self.pnl.get(offset).copied().unwrap_or(0.0);
        let mut returns = self.returns[offset..].to_vec();
        let mut strategy_returns = self.strategy_returns[offset..].to_vec();
        if let (Some(ret), Some(realized)) = (returns.first_mut(), strategy_returns.first_mut()) {
            *ret = 0.0;
            *realized = 0.0;
        }
        PnlSeries {
            returns,
            strategy_returns,
            pnl: self.pnl[offset..].iter().map(|v| v - base).collect(),
        }
    }
}

/// Zero when the previous close is zero or either price is not finite.
pub fn bar_return(prev_close: f64, close: f64) -> f64 {
    if prev_close == 0.0 || !prev_close.is_finite() || !close.is_finite() {
        return 0.0;
    }
    (close - prev_close) / prev_close
}

/// Positions are taken at the close of bar `i - 1` and earn the return of bar `i`.
pub fn simulate_pnl(closes: &[f64], signal: &[Signal]) -> PnlSeries {
    debug_assert_eq!(closes.len(), signal.len());

    let mut returns = Vec::with_capacity(closes.len());
    let mut strategy_returns = Vec::with_capacity(closes.len());
    let mut pnl = Vec::with_capacity(closes.len());
    let mut cumulative = 0.0;

    for (idx, close) in closes.iter().copied().enumerate() {
        let (ret, realized) = if idx == 0 {
            (0.0, 0.0)
        } else {
            let ret = bar_return(closes[idx - 1], close);
            let held = signal.get(idx - 1).copied().unwrap_or_default();
            (ret, held.exposure() * ret)
        };
        cumulative += realized;
        returns.push(ret);
        strategy_returns.push(realized);
        pnl.push(cumulative);
    }

    PnlSeries {
        returns,
        strategy_returns,
        pnl,
    }
}
