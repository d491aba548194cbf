//! The in-process paper broker: clears limit orders against the price store
//! and maintains cash, positions, and a transaction log without touching a
//! real venue.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_core::models::{
    Account, Order, OrderSide, OrderStatus, Position, TimeInForce, Transaction, TransactionLog,
};
use kernel_core::symbol::{AssetClass, OptionType, Symbol};
use kernel_core::types::{Decimal, Price, Quantity};
use kernel_store::PriceStore;
use parking_lot::RwLock;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapter::{
    AccountSnapshot, BrokerAdapter, ChainEntry, ChainInfo, OptionMarketData, OrderRef,
    PositionsSnapshot, SnapshotCallback,
};
use crate::commission::Commission;
use crate::error::{BrokerErrorKind, Error, Result};
use crate::order_book::OrderBook;
use crate::position_ledger;

/// Configuration fixed at construction.
pub struct PaperBrokerConfig {
    pub initial_cash: Decimal,
    pub multiplier: Decimal,
    pub commission: Commission,
    pub persistence_path: Option<PathBuf>,
}

impl Default for PaperBrokerConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(100_000),
            multiplier: Decimal::ONE,
            commission: Commission::none(),
            persistence_path: None,
        }
    }
}

/// An in-process broker that fills limit orders against the shared
/// [`PriceStore`] rather than a real venue.
pub struct PaperBroker {
    store: Arc<PriceStore>,
    account: RwLock<Account>,
    order_book: OrderBook,
    transactions: RwLock<TransactionLog>,
    commission: Commission,
    persistence_path: Option<PathBuf>,
    next_order_seq: AtomicU64,
    watchlist: RwLock<Vec<Symbol>>,
}

impl PaperBroker {
    pub fn new(store: Arc<PriceStore>, config: PaperBrokerConfig) -> Self {
        Self {
            store,
            account: RwLock::new(Account::new(config.initial_cash, config.multiplier)),
            order_book: OrderBook::new(),
            transactions: RwLock::new(TransactionLog::new(None)),
            commission: config.commission,
            persistence_path: config.persistence_path,
            next_order_seq: AtomicU64::new(1),
            watchlist: RwLock::new(Vec::new()),
        }
    }

    pub fn account_snapshot(&self) -> AccountSnapshot {
        let acct = self.account.read();
        AccountSnapshot {
            equity: acct.equity,
            cash: acct.cash,
            buying_power: acct.buying_power,
            multiplier: acct.multiplier,
        }
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().entries().to_vec()
    }

    /// Evaluates every open order against the most recent candle for its
    /// symbol: a buy fills once `limit_price >= close`, a sell once
    /// `limit_price <= close`. Called by the scheduler on each tick's
    /// order-book poll.
    pub fn check_fills(&self, interval: Interval, algorithm_name: &str, now: DateTime<Utc>) -> Vec<Order> {
        let mut filled = Vec::new();
        for order in self.order_book.pending() {
            let Some(candle) = self.store.last(&order.symbol, interval) else {
                continue;
            };
            let should_fill = match order.side {
                OrderSide::Buy => order.limit_price.as_decimal() >= candle.close,
                OrderSide::Sell => order.limit_price.as_decimal() <= candle.close,
            };
            if !should_fill {
                continue;
            }
            let fill_price = match Price::new(candle.close) {
                Ok(p) => p,
                Err(_) => continue,
            };
            self.settle_fill(&order, fill_price, order.quantity, algorithm_name, now);
            if let Ok(mut updated) = self
                .order_book
                .get(order.order_id)
                .ok_or(Error::OrderNotFound(order.order_id))
            {
                updated.status = OrderStatus::Filled;
                filled.push(updated);
            }
        }
        self.snapshot_to_disk();
        filled
    }

    fn settle_fill(
        &self,
        order: &Order,
        fill_price: Price,
        fill_quantity: Quantity,
        algorithm_name: &str,
        now: DateTime<Utc>,
    ) {
        let multiplier = order.multiplier();
        let notional = fill_price.as_decimal() * fill_quantity.as_decimal() * multiplier;
        let commission = self.commission.charge(order.side, notional);

        {
            let mut account = self.account.write();
            match order.side {
                OrderSide::Buy => {
                    account.cash -= notional + commission;
                    account.buying_power -= notional + commission;
                }
                OrderSide::Sell => {
                    account.cash += notional - commission;
                    account.buying_power += notional - commission;
                }
            }
            position_ledger::apply_fill(&mut account, order, fill_price, fill_quantity);
        }

        let _ = self.order_book.update(order.order_id, |o| {
            let _ = o.fill(fill_price, fill_quantity, now);
        });

        self.transactions.write().record(Transaction {
            timestamp: now,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: fill_quantity,
            price: fill_price,
            algorithm_name: algorithm_name.to_string(),
        });

        info!(
            order_id = %order.order_id,
            symbol = %order.symbol,
            side = ?order.side,
            price = %fill_price,
            "order filled"
        );
    }

    fn check_buying_power(&self, side: OrderSide, notional: Decimal) -> Result<()> {
        if side == OrderSide::Buy {
            let available = self.account.read().buying_power;
            if notional > available {
                warn!(needed = %notional, available = %available, "order rejected: insufficient funds");
                return Err(Error::InsufficientFunds {
                    needed: notional,
                    available,
                });
            }
        }
        Ok(())
    }

    fn snapshot_to_disk(&self) {
        let Some(path) = &self.persistence_path else {
            return;
        };
        let blob = self.to_blob();
        match serde_json::to_vec_pretty(&blob) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(path, bytes) {
                    error!(error = %e, "failed to persist paper broker blob");
                }
            }
            Err(e) => error!(error = %e, "failed to serialize paper broker blob"),
        }
    }

    fn to_blob(&self) -> AccountBlob {
        let account = self.account.read();
        let mut stocks = Vec::new();
        let mut options = Vec::new();
        let mut cryptos = Vec::new();
        for position in account.positions() {
            let bucket = match position.asset_class {
                AssetClass::Stock => &mut stocks,
                AssetClass::Crypto => &mut cryptos,
                AssetClass::Option => &mut options,
            };
            bucket.push(PositionBlob {
                symbol: position.symbol.as_str().to_string(),
                quantity: position.quantity.as_decimal(),
                avg_price: position.avg_price.as_decimal(),
            });
        }
        AccountBlob {
            account: AccountFieldsBlob {
                equity: account.equity,
                cash: account.cash,
                buying_power: account.buying_power,
                multiplier: account.multiplier,
            },
            positions: PositionsBlob {
                stocks,
                options,
                cryptos,
            },
            orders: OrdersBlob {
                orders: self.order_book.all(),
                next_order_id: self.next_order_seq.load(Ordering::SeqCst),
            },
        }
    }
}

/// The tagged account blob persisted on each change.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountBlob {
    pub account: AccountFieldsBlob,
    pub positions: PositionsBlob,
    pub orders: OrdersBlob,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountFieldsBlob {
    pub equity: Decimal,
    pub cash: Decimal,
    pub buying_power: Decimal,
    pub multiplier: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionsBlob {
    pub stocks: Vec<PositionBlob>,
    pub options: Vec<PositionBlob>,
    pub cryptos: Vec<PositionBlob>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionBlob {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersBlob {
    pub orders: Vec<Order>,
    pub next_order_id: u64,
}

#[async_trait]
impl BrokerAdapter for PaperBroker {
    fn name(&self) -> &str {
        "paper"
    }

    fn supported_intervals(&self) -> HashSet<Interval> {
        Interval::ALL.into_iter().collect()
    }

    async fn fetch_price_history(
        &self,
        symbol: &Symbol,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        Ok(self.store.load(symbol, Some(interval), Some(start), Some(end))?)
    }

    async fn fetch_latest_snapshot(&self, watchlist: &[Symbol]) -> Result<HashMap<Symbol, Candle>> {
        let mut out = HashMap::new();
        for symbol in watchlist {
            if let Some(candle) = self.store.last(symbol, Interval::Min1) {
                out.insert(symbol.clone(), candle);
            }
        }
        Ok(out)
    }

    async fn fetch_chain_info(&self, _symbol: &Symbol) -> Result<ChainInfo> {
        Err(Error::broker(
            BrokerErrorKind::Unsupported,
            "paper broker does not model option chains",
        ))
    }

    async fn fetch_chain_data(&self, _symbol: &Symbol, _expiration: NaiveDate) -> Result<Vec<ChainEntry>> {
        Err(Error::broker(
            BrokerErrorKind::Unsupported,
            "paper broker does not model option chains",
        ))
    }

    async fn fetch_option_market_data(&self, _occ_symbol: &Symbol) -> Result<OptionMarketData> {
        Err(Error::broker(
            BrokerErrorKind::Unsupported,
            "paper broker does not model option market data",
        ))
    }

    async fn fetch_account(&self) -> Result<AccountSnapshot> {
        Ok(self.account_snapshot())
    }

    async fn fetch_positions(&self) -> Result<PositionsSnapshot> {
        let account = self.account.read();
        let mut snapshot = PositionsSnapshot::default();
        for position in account.positions() {
            match position.asset_class {
                AssetClass::Stock => snapshot.stock.push(position.clone()),
                AssetClass::Crypto => snapshot.crypto.push(position.clone()),
                AssetClass::Option => snapshot.option.push(position.clone()),
            }
        }
        Ok(snapshot)
    }

    async fn place_limit(
        &self,
        side: OrderSide,
        symbol: &Symbol,
        quantity: Quantity,
        limit_price: Price,
        tif: TimeInForce,
        _extended: bool,
    ) -> Result<OrderRef> {
        let notional = limit_price.as_decimal() * quantity.as_decimal();
        self.check_buying_power(side, notional)?;
        let order = Order::new(symbol.clone(), side, quantity, limit_price, tif, Utc::now());
        self.next_order_seq.fetch_add(1, Ordering::SeqCst);
        let id = self.order_book.place(order);
        Ok(OrderRef(id))
    }

    async fn place_option_limit(
        &self,
        side: OrderSide,
        symbol: &Symbol,
        quantity: Quantity,
        limit_price: Price,
        _option_type: OptionType,
        _expiration: NaiveDate,
        _strike: Decimal,
        tif: TimeInForce,
    ) -> Result<OrderRef> {
        let notional = limit_price.as_decimal() * quantity.as_decimal() * dec!(100);
        self.check_buying_power(side, notional)?;
        let order = Order::new(symbol.clone(), side, quantity, limit_price, tif, Utc::now());
        self.next_order_seq.fetch_add(1, Ordering::SeqCst);
        let id = self.order_book.place(order);
        Ok(OrderRef(id))
    }

    async fn fetch_order_status(&self, order_ref: OrderRef) -> Result<Order> {
        self.order_book.get(order_ref.0).ok_or(Error::OrderNotFound(order_ref.0))
    }

    async fn cancel_order(&self, order_ref: OrderRef) -> Result<()> {
        self.order_book.update(order_ref.0, |o| {
            o.status = OrderStatus::Cancelled;
        })
    }

    async fn pending_orders(&self) -> Result<Vec<OrderRef>> {
        Ok(self.order_book.pending().into_iter().map(|o| OrderRef(o.order_id)).collect())
    }

    async fn configure(&mut self, watchlist: Vec<Symbol>, _callback: SnapshotCallback) -> Result<()> {
        *self.watchlist.write() = watchlist;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        // The paper broker doesn't produce its own candles; it reads from
        // the shared store that a real streamer (or backtest driver) feeds.
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
