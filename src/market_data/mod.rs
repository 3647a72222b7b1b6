pub mod price_loader;
pub mod returns;

// Re-export the history types for convenient access (e.g. `use crate::market_data::PriceHistory`).
pub use price_loader::{load_prices, read_prices, PriceHistory, PricePoint};
pub use returns::simple_returns;
