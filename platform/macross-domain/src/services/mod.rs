pub mod crossover;
pub mod indicators;
pub mod pnl;
