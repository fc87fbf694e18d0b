pub mod yahoo;

pub use yahoo::YahooChartClient;
