use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fx::CurrencyConverter;
use crate::money::Money;
use crate::securities::Security;
use crate::taxonomies::{Classification, TaxonomyProviderTrait};
use crate::trades::{group_trades, Trade, TradeCategory, TradeCollector, TradeTotals};
use crate::transactions::{NoQuotes, Transaction, TransactionType};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
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

/// Buy 100 for 10000, sell 100 for 11000 one month later.
fn long_trade() -> Trade {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));
    let history = vec![
        tx("b1", "2020-01-01", 1, TransactionType::Buy, dec!(100), dec!(10000)),
        tx("s1", "2020-02-01", 2, TransactionType::Sell, dec!(100), dec!(11000)),
    ];
    collector.collect(&security(), &history).unwrap().remove(0)
}

/// Sell 100 for 10000, cover for 9000 one month later.
fn short_trade() -> Trade {
    let converter = CurrencyConverter::new(vec![]);
    let collector = TradeCollector::new(&converter, &NoQuotes, "EUR", date("2020-12-31"));
    let history = vec![
        tx("s1", "2020-01-01", 1, TransactionType::Sell, dec!(100), dec!(10000)),
        tx("b1", "2020-02-01", 2, TransactionType::Buy, dec!(100), dec!(9000)),
    ];
    collector.collect(&security(), &history).unwrap().remove(0)
}

fn stocks() -> Classification {
    Classification::new("stocks", "Stocks")
}

#[test]
fn full_weight_aggregation() {
    let mut category = TradeCategory::new(stocks(), "EUR");
    category.add_trade(long_trade(), dec!(1)).unwrap();

    assert_eq!(category.trade_count(), 1);
    assert_eq!(category.winning_trades_count(), 1);
    assert_eq!(category.losing_trades_count(), 0);
    assert_eq!(category.total_entry_value(), Money::new(dec!(10000.00), "EUR"));
    assert_eq!(category.total_exit_value(), Money::new(dec!(11000.00), "EUR"));
    assert_eq!(category.total_profit_loss(), Money::new(dec!(1000.00), "EUR"));
    assert_eq!(category.average_return(), dec!(0.1));
    assert_eq!(category.average_holding_period(), 31);
    assert_eq!(category.win_rate(), dec!(1));
}

#[test]
fn weighting_scales_totals_but_not_the_return() {
    let mut category = TradeCategory::new(stocks(), "EUR");
    category.add_trade(long_trade(), dec!(0.5)).unwrap();

    assert_eq!(category.total_entry_value(), Money::new(dec!(5000.00), "EUR"));
    assert_eq!(category.total_exit_value(), Money::new(dec!(5500.00), "EUR"));
    assert_eq!(category.total_profit_loss(), Money::new(dec!(500.00), "EUR"));
    assert_eq!(category.average_return(), dec!(0.1));
}

#[test]
fn distinct_counts_ignore_repeated_attribution() {
    let mut category = TradeCategory::new(stocks(), "EUR");
    let trade = long_trade();
    category.add_trade(trade.clone(), dec!(0.4)).unwrap();
    category.add_trade(trade, dec!(0.2)).unwrap();

    assert_eq!(category.trade_count(), 1);
    assert_eq!(category.winning_trades_count(), 1);
    assert_eq!(category.losing_trades_count(), 0);
    assert_eq!(category.total_weight(), dec!(0.6));
    // Money totals still accumulate per attribution.
    assert_eq!(category.total_profit_loss(), Money::new(dec!(600.00), "EUR"));
    assert_eq!(category.win_rate(), dec!(1));
}

#[test]
fn zero_total_weight_yields_zero_aggregates() {
    let mut category = TradeCategory::new(stocks(), "EUR");
    category.add_trade(long_trade(), dec!(0)).unwrap();

    assert_eq!(category.trade_count(), 1);
    assert!(category.total_profit_loss().is_zero());
    assert_eq!(category.average_return(), Decimal::ZERO);
    assert_eq!(category.average_irr(), 0.0);
    assert_eq!(category.average_holding_period(), 0);
    assert_eq!(category.win_rate(), Decimal::ZERO);
}

#[test]
fn weight_outside_unit_interval_is_rejected() {
    let mut category = TradeCategory::new(stocks(), "EUR");
    assert!(category.add_trade(long_trade(), dec!(1.5)).is_err());
    assert!(category.add_trade(long_trade(), dec!(-0.1)).is_err());
}

#[test]
fn currency_mismatch_is_rejected() {
    let mut category = TradeCategory::new(stocks(), "USD");
    assert!(category.add_trade(long_trade(), dec!(1)).is_err());
}

#[test]
fn average_return_of_single_trade_category_matches_trade_return() {
    let trade = short_trade();
    assert!(!trade.is_long);
    assert_eq!(trade.profit_loss(), Money::new(dec!(1000), "EUR"));

    let mut category = TradeCategory::new(Classification::new("shorts", "Shorts"), "EUR");
    let expected = trade.return_rate();
    category.add_trade(trade, dec!(1)).unwrap();

    assert_eq!(category.average_return(), expected);
}

#[test]
fn category_irr_of_one_month_gain() {
    let mut category = TradeCategory::new(stocks(), "EUR");
    category.add_trade(long_trade(), dec!(1)).unwrap();

    // -10000 at day 0, +11000 after 31 days: (1.1)^(365/31) - 1.
    let expected = 1.1f64.powf(365.0 / 31.0) - 1.0;
    assert!((category.average_irr() - expected).abs() < 1e-6);
}

#[test]
fn short_trade_irr_matches_equivalent_long_gain() {
    // Selling for 10000 and covering for 9000 commits the same collateral
    // over the same month as the long trade's 10000 -> 11000.
    let mut longs = TradeCategory::new(stocks(), "EUR");
    longs.add_trade(long_trade(), dec!(1)).unwrap();

    let mut shorts = TradeCategory::new(Classification::new("shorts", "Shorts"), "EUR");
    shorts.add_trade(short_trade(), dec!(1)).unwrap();

    assert!((longs.average_irr() - shorts.average_irr()).abs() < 1e-6);
}

#[test]
fn empty_category_irr_is_zero() {
    let category = TradeCategory::new(stocks(), "EUR");
    assert_eq!(category.average_irr(), 0.0);
    assert_eq!(category.trade_count(), 0);
}

struct FixedTaxonomy(Vec<(String, Classification, Decimal)>);

impl TaxonomyProviderTrait for FixedTaxonomy {
    fn classifications_for(&self, security_id: &str) -> Vec<(Classification, Decimal)> {
        self.0
            .iter()
            .filter(|(id, _, _)| id.as_str() == security_id)
            .map(|(_, c, w)| (c.clone(), *w))
            .collect()
    }
}

#[test]
fn group_trades_by_classification_weights() {
    let taxonomy = FixedTaxonomy(vec![
        ("sec1".into(), stocks(), dec!(0.5)),
        ("sec1".into(), Classification::new("tech", "Technology"), dec!(0.5)),
    ]);

    let categories = group_trades(&[long_trade()], &taxonomy, "EUR").unwrap();

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].classification().id, "stocks");
    assert_eq!(categories[1].classification().id, "tech");
    for category in &categories {
        assert_eq!(category.trade_count(), 1);
        assert_eq!(category.total_profit_loss(), Money::new(dec!(500.00), "EUR"));
    }
}

#[test]
fn totals_row_sums_unweighted_trades() {
    let totals = TradeTotals::from_trades(&[long_trade(), short_trade()], "EUR");

    assert_eq!(totals.trade_count, 2);
    assert_eq!(totals.winning_trades_count, 2);
    assert_eq!(totals.losing_trades_count, 0);
    assert_eq!(totals.total_profit_loss, Money::new(dec!(2000), "EUR"));
    assert_eq!(totals.total_entry_value, Money::new(dec!(20000), "EUR"));
    assert_eq!(totals.win_rate(), dec!(1));
}
