mod rolling;

pub use rolling::{RollingEma, RollingSma};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MovingAverageKind {
    #[default]
    Sma,
    Ema,
}

impl MovingAverageKind {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_lowercase().as_str() {
            "sma" => Ok(MovingAverageKind::Sma),
            "ema" => Ok(MovingAverageKind::Ema),
            _ => Err(format!("unsupported ma_type: {value} (expected sma or ema)")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovingAverageKind::Sma => "sma",
            MovingAverageKind::Ema => "ema",
        }
    }
}

enum Averager {
    Sma(RollingSma),
    Ema(RollingEma),
}

impl Averager {
    fn new(kind: MovingAverageKind, window: usize) -> Self {
        match kind {
            MovingAverageKind::Sma => Averager::Sma(RollingSma::new(window)),
            MovingAverageKind::Ema => Averager::Ema(RollingEma::new(window)),
        }
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        match self {
            Averager::Sma(sma) => sma.update(value),
            Averager::Ema(ema) => ema.update(value),
        }
    }
}

/// Moving average aligned 1:1 with `values`; `None` where not yet defined.
pub fn moving_average(values: &[f64], window: usize, kind: MovingAverageKind) -> Vec<Option<f64>> {
    let mut averager = Averager::new(kind, window);
    values.iter().map(|v| averager.update(*v)).collect()
}
