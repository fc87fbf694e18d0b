use serde::Serialize;

/// Position held after a bar closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "u8")]
pub enum Signal {
    #[default]
    Flat,
    Long,
}

impl Signal {
    pub fn exposure(self) -> f64 {
        match self {
            Signal::Flat => 0.0,
            Signal::Long => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Flat => "flat",
            Signal::Long => "long",
        }
    }
}

impl From<Signal> for u8 {
    fn from(value: Signal) -> Self {
        match value {
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }
}
