//! Commodity price table for the program's main products.
//!
//! Static placeholder until an ODEPA feed exists; the dashboard re-reads it
//! on every manual refresh so a live source can slot in later.

use crate::model::{MarketEntry, Trend};

pub fn market_prices() -> Vec<MarketEntry> {
    vec![
        MarketEntry {
            product: "Papa".to_string(),
            price: 800,
            unit: "kg".to_string(),
            trend: Trend::Up,
        },
        MarketEntry {
            product: "Trigo".to_string(),
            price: 1200,
            unit: "kg".to_string(),
            trend: Trend::Stable,
        },
        MarketEntry {
            product: "Leche".to_string(),
            price: 450,
            unit: "L".to_string(),
            trend: Trend::Up,
        },
        MarketEntry {
            product: "Carne bovina".to_string(),
            price: 3500,
            unit: "kg".to_string(),
            trend: Trend::Down,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_static_entries() {
        let prices = market_prices();

        assert_eq!(prices.len(), 4);
        let products: Vec<&str> = prices.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(products, ["Papa", "Trigo", "Leche", "Carne bovina"]);
    }

    #[test]
    fn beef_trends_down() {
        let prices = market_prices();
        let beef = prices.iter().find(|p| p.product == "Carne bovina").expect("beef entry");

        assert_eq!(beef.price, 3500);
        assert_eq!(beef.trend, Trend::Down);
    }
}
