use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingSma {
    window: usize,
    buf: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::new(),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        self.buf.push_back(value);
        self.sum += value;
        while self.buf.len() > self.window {
            if let Some(front) = self.buf.pop_front() {
                self.sum -= front;
            }
        }

        if self.buf.len() == self.window {
            Some(self.sum / self.window as f64)
        } else {
            None
        }
    }
}

/// Recursive EMA seeded with the first value (`adjust = false` convention).
#[derive(Debug, Clone)]
pub struct RollingEma {
    alpha: f64,
    value: Option<f64>,
}

impl RollingEma {
    pub fn new(window: usize) -> Self {
        let alpha = if window == 0 {
            0.0
        } else {
            2.0 / (window as f64 + 1.0)
        };
        Self { alpha, value: None }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.alpha == 0.0 {
            return None;
        }

        let next = match self.value {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.value = Some(next);
        Some(next)
    }
}
