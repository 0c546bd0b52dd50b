use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fx::{CurrencyConverter, ExchangeRate};
use crate::money::Money;
use crate::securities::Security;
use crate::trades::TradeCollector;
use crate::transactions::{NoQuotes, QuoteProviderTrait, Transaction, TransactionType};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

struct QuoteTable(Vec<(String, NaiveDate, Decimal)>);

impl QuoteProviderTrait for QuoteTable {
    fn latest_quote(&self, security_id: &str, date: NaiveDate) -> Option<Decimal> {
        self.0
            .iter()
            .filter(|(id, d, _)| id.as_str() == security_id && *d <= date)
            .max_by_key(|(_, d, _)| *d)
            .map(|(_, _, quote)| *quote)
    }
}

fn tx(
    id: &str,
    date_s: &str,
    sequence: i64,
    tx_type: TransactionType,
    shares: Decimal,
    amount: Decimal,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        security_id: "sec1".to_string(),
        date: date(date_s),
        sequence,
        tx_type,
        shares,
        amount: Money::new(amount, "EUR"),
        forex: None,
    }
}

fn security() -> Security {
    Security::new("sec1", "SEC1", "EUR")
}

#[test]
fn round_trip_becomes_one_closed_trade() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let history = vec![
        tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(100), dec!(10000)),
        tx("s1", "2020-02-01", 2, TransactionType::Sell, dec!(100), dec!(11000)),
    ];

    let trades = collector.collect(&security(), &history).unwrap();

    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert!(trade.is_closed());
    assert!(trade.is_long);
    assert_eq!(trade.start, date("2020-01-01"));
    assert_eq!(trade.end, Some(date("2020-02-01")));
    assert_eq!(trade.shares, dec!(100));
    assert_eq!(trade.entry_value, Money::new(dec!(10000), "EUR"));
    assert_eq!(trade.exit_value, Money::new(dec!(11000), "EUR"));
    assert_eq!(trade.profit_loss(), Money::new(dec!(1000), "EUR"));
    assert_eq!(trade.return_rate(), dec!(0.1));
    assert_eq!(trade.holding_period_days(), 31);
    assert_eq!(trade.transactions.len(), 2);
}

#[test]
fn open_position_is_valued_at_horizon_quote() {
    let converter = CurrencyConverter::new(vec![]);
    let quotes = QuoteTable(vec![("sec1".into(), date("2020-02-01"), dec!(110))]);
    let collector = TradeCollector::new(&converter, &quotes, "EUR", date("2020-02-15"));

    let history = vec![tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(100), dec!(10000))];

    let trades = collector.collect(&security(), &history).unwrap();

    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert!(!trade.is_closed());
    assert_eq!(trade.end, None);
    assert_eq!(trade.valued_until, date("2020-02-15"));
    assert_eq!(trade.exit_value, Money::new(dec!(11000), "EUR"));
    assert_eq!(trade.profit_loss(), Money::new(dec!(1000), "EUR"));
    assert_eq!(trade.holding_period_days(), 45);
}

#[test]
fn open_position_without_quote_uses_last_transaction_price() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let history = vec![tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(100), dec!(10000))];

    let trades = collector.collect(&security(), &history).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].exit_value, Money::new(dec!(10000), "EUR"));
    assert!(trades[0].profit_loss().is_zero());
}

#[test]
fn short_round_trip() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let history = vec![
        tx("s1", "2020-01-01", 1, TransactionType::Sell, dec!(100), dec!(10000)),
        tx("b1", "2020-02-01", 2, TransactionType::Buy, dec!(100), dec!(9000)),
    ];

    let trades = collector.collect(&security(), &history).unwrap();

    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert!(!trade.is_long);
    assert!(trade.is_closed());
    assert_eq!(trade.entry_value, Money::new(dec!(10000), "EUR"));
    assert_eq!(trade.exit_value, Money::new(dec!(9000), "EUR"));
    assert_eq!(trade.profit_loss(), Money::new(dec!(1000), "EUR"));
    assert_eq!(trade.return_rate(), dec!(0.1));
    assert!(!trade.is_loss());
}

#[test]
fn position_returning_to_zero_splits_trades() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let history = vec![
        tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(10), dec!(1000)),
        tx("s1", "2020-02-01", 2, TransactionType::Sell, dec!(10), dec!(1200)),
        tx("b2", "2020-03-01", 3, TransactionType::Buy, dec!(5), dec!(600)),
        tx("s2", "2020-04-01", 4, TransactionType::Sell, dec!(5), dec!(550)),
    ];

    let trades = collector.collect(&security(), &history).unwrap();

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].profit_loss(), Money::new(dec!(200), "EUR"));
    assert_eq!(trades[1].start, date("2020-03-01"));
    assert_eq!(trades[1].profit_loss(), Money::new(dec!(-50), "EUR"));
    assert!(trades[1].is_loss());
}

#[test]
fn partial_close_continues_the_same_trade() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let history = vec![
        tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(10), dec!(1000)),
        tx("s1", "2020-02-01", 2, TransactionType::Sell, dec!(4), dec!(480)),
        tx("s2", "2020-03-01", 3, TransactionType::Sell, dec!(6), dec!(780)),
    ];

    let trades = collector.collect(&security(), &history).unwrap();

    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert!(trade.is_closed());
    assert_eq!(trade.end, Some(date("2020-03-01")));
    assert_eq!(trade.exit_value, Money::new(dec!(1260), "EUR"));
    assert_eq!(trade.profit_loss(), Money::new(dec!(260), "EUR"));
    assert_eq!(trade.transactions.len(), 3);
}

#[test]
fn transfers_do_not_open_or_close_trades() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let history = vec![
        tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(10), dec!(1000)),
        tx("t1", "2020-01-15", 2, TransactionType::TransferOut, dec!(10), dec!(1100)),
        tx("t2", "2020-01-15", 3, TransactionType::TransferIn, dec!(10), dec!(1100)),
        tx("s1", "2020-02-01", 4, TransactionType::Sell, dec!(10), dec!(1200)),
    ];

    let trades = collector.collect(&security(), &history).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].transactions.len(), 2);
    assert_eq!(trades[0].profit_loss(), Money::new(dec!(200), "EUR"));
}

#[test]
fn sign_flip_within_one_transaction_fails_fast() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let history = vec![
        tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(5), dec!(500)),
        tx("s1", "2020-02-01", 2, TransactionType::Sell, dec!(8), dec!(880)),
    ];

    assert!(collector.collect(&security(), &history).is_err());
}

#[test]
fn foreign_amounts_are_converted_at_transaction_date() {
    let converter = CurrencyConverter::new(vec![ExchangeRate::new(
        "EUR",
        "USD",
        date("2020-01-01"),
        dec!(1.25),
    )]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let mut buy = tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(100), dec!(12500));
    buy.amount = Money::new(dec!(12500), "USD");
    let mut sell = tx("s1", "2020-02-01", 2, TransactionType::Sell, dec!(100), dec!(13750));
    sell.amount = Money::new(dec!(13750), "USD");

    let trades = collector.collect(&security(), &[buy, sell]).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].entry_value, Money::new(dec!(10000), "EUR"));
    assert_eq!(trades[0].exit_value, Money::new(dec!(11000), "EUR"));
}

#[test]
fn collect_all_orders_trades_by_start() {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));

    let securities = vec![security(), Security::new("sec2", "SEC2", "EUR")];
    let mut second = tx("x1", "2020-01-15", 1, TransactionType::Buy, dec!(1), dec!(10));
    second.security_id = "sec2".into();

    let history = vec![
        tx("b1", "2020-02-01", 2, TransactionType::Buy, dec!(10), dec!(1000)),
        second,
    ];

    let trades = collector.collect_all(&securities, &history).unwrap();

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].security_id, "sec2");
    assert_eq!(trades[1].security_id, "sec1");
}
