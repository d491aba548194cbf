//! Integration tests for the trading runtime kernel

use kernel_core::interval::Interval;
use kernel_core::symbol::Symbol;
use kernel_core::types::{Price, Quantity};
use rust_decimal_macros::dec;

#[test]
fn test_symbol_and_occ_round_trip() {
    use chrono::NaiveDate;
    use kernel_core::symbol::{OccSymbol, OptionType};

    let symbol = Symbol::new("AAPL").unwrap();
    assert_eq!(symbol.as_str(), "AAPL");

    let occ = OccSymbol {
        root: "TWTR".to_string(),
        expiration: NaiveDate::from_ymd_opt(2021, 11, 14).unwrap(),
        option_type: OptionType::Call,
        strike: dec!(50.001),
    };
    let emitted = occ.emit().unwrap();
    assert_eq!(emitted, "TWTR  211114C00050001");
    assert_eq!(OccSymbol::parse(&emitted).unwrap().strike, dec!(50.001));
}

#[test]
fn test_price_quantity_validation() {
    let price = Price::new(dec!(50000.0)).unwrap();
    let quantity = Quantity::new(dec!(1.5)).unwrap();

    assert_eq!(price.as_decimal(), dec!(50000.0));
    assert_eq!(quantity.as_decimal(), dec!(1.5));
    assert!(Price::new(dec!(0)).is_err());
}

#[test]
fn test_order_lifecycle() {
    use chrono::Utc;
    use kernel_core::models::{Order, OrderSide, OrderStatus, TimeInForce};

    let mut order = Order::new(
        Symbol::new("AAPL").unwrap(),
        OrderSide::Buy,
        Quantity::new(dec!(10)).unwrap(),
        Price::new(dec!(150)).unwrap(),
        TimeInForce::Day,
        Utc::now(),
    );
    assert!(order.is_open());

    order
        .fill(Price::new(dec!(149.5)).unwrap(), Quantity::new(dec!(10)).unwrap(), Utc::now())
        .unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert!(order.transition(OrderStatus::Cancelled).is_err());
}

#[test]
fn test_hourly_aggregation_end_to_end() {
    use chrono::{TimeZone, Utc};
    use kernel_core::candle::Candle;
    use kernel_store::PriceStore;

    let store = PriceStore::new(None);
    let symbol = Symbol::new("AAPL").unwrap();
    let mut candles = Vec::new();
    for minute in 0..60u32 {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap();
        let close = rust_decimal::Decimal::from(minute);
        candles.push(Candle::new(ts, close, close, close, close, dec!(1)).unwrap());
    }
    store.store(&symbol, Interval::Min1, &candles).unwrap();
    store.aggregate(&symbol, Interval::Min1, Interval::Hour1).unwrap();

    let hourly = store.load(&symbol, Some(Interval::Hour1), None, None).unwrap();
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly[0].volume, dec!(60));
}

#[tokio::test]
async fn test_paper_broker_rejects_order_beyond_buying_power() {
    use kernel_broker::adapter::BrokerAdapter;
    use kernel_broker::{PaperBroker, PaperBrokerConfig};
    use kernel_core::models::{OrderSide, TimeInForce};
    use kernel_store::PriceStore;
    use std::sync::Arc;

    let store = Arc::new(PriceStore::new(None));
    let broker = PaperBroker::new(
        Arc::clone(&store),
        PaperBrokerConfig {
            initial_cash: dec!(100),
            ..PaperBrokerConfig::default()
        },
    );

    let result = broker
        .place_limit(
            OrderSide::Buy,
            &Symbol::new("AAPL").unwrap(),
            Quantity::new(dec!(10)).unwrap(),
            Price::new(dec!(21)).unwrap(),
            TimeInForce::Day,
            false,
        )
        .await;

    assert!(result.is_err());
    assert_eq!(broker.account_snapshot().equity, dec!(100));
}
