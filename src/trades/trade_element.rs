use rust_decimal::Decimal;

use crate::money::Money;
use crate::trades::trade_category::TradeCategory;
use crate::trades::trades_model::Trade;

/// Grand-total row over a set of trades, unweighted.
#[derive(Debug, Clone)]
pub struct TradeTotals {
    pub currency: String,
    pub trade_count: usize,
    pub winning_trades_count: usize,
    pub losing_trades_count: usize,
    pub total_profit_loss: Money,
    pub total_entry_value: Money,
    pub total_exit_value: Money,
}

impl TradeTotals {
    pub fn from_trades(trades: &[Trade], currency: impl Into<String>) -> Self {
        let currency = currency.into();
        let mut totals = TradeTotals {
            currency: currency.clone(),
            trade_count: trades.len(),
            winning_trades_count: 0,
            losing_trades_count: 0,
            total_profit_loss: Money::zero(currency.clone()),
            total_entry_value: Money::zero(currency.clone()),
            total_exit_value: Money::zero(currency),
        };

        for trade in trades {
            if trade.is_loss() {
                totals.losing_trades_count += 1;
            } else {
                totals.winning_trades_count += 1;
            }
            totals.total_profit_loss.amount += trade.profit_loss().amount;
            totals.total_entry_value.amount += trade.entry_value.amount;
            totals.total_exit_value.amount += trade.exit_value.amount;
        }

        totals
    }

    pub fn win_rate(&self) -> Decimal {
        if self.trade_count == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.winning_trades_count as i64) / Decimal::from(self.trade_count as i64)
        }
    }
}

/// One row of a trade report: a category header, a single trade, or the
/// totals row. Exactly one of the three by construction.
#[derive(Debug)]
pub enum TradeElement {
    Category(TradeCategory),
    Trade(Trade),
    Totals(TradeTotals),
}

impl TradeElement {
    /// Sort rank of the row kind: categories first, trades next, totals last.
    pub fn sort_rank(&self) -> u8 {
        match self {
            TradeElement::Category(_) => 0,
            TradeElement::Trade(_) => 1,
            TradeElement::Totals(_) => 2,
        }
    }

    pub fn as_category(&self) -> Option<&TradeCategory> {
        match self {
            TradeElement::Category(category) => Some(category),
            _ => None,
        }
    }

    pub fn as_trade(&self) -> Option<&Trade> {
        match self {
            TradeElement::Trade(trade) => Some(trade),
            _ => None,
        }
    }

    pub fn as_totals(&self) -> Option<&TradeTotals> {
        match self {
            TradeElement::Totals(totals) => Some(totals),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomies::Classification;

    #[test]
    fn element_is_exactly_one_kind() {
        let totals = TradeElement::Totals(TradeTotals::from_trades(&[], "EUR"));
        assert!(totals.as_totals().is_some());
        assert!(totals.as_trade().is_none());
        assert!(totals.as_category().is_none());

        let category = TradeElement::Category(TradeCategory::new(
            Classification::new("c1", "Stocks"),
            "EUR",
        ));
        assert_eq!(category.sort_rank(), 0);
        assert_eq!(totals.sort_rank(), 2);
    }

    #[test]
    fn empty_totals_are_zero() {
        let totals = TradeTotals::from_trades(&[], "EUR");
        assert_eq!(totals.trade_count, 0);
        assert!(totals.total_profit_loss.is_zero());
        assert_eq!(totals.win_rate(), Decimal::ZERO);
    }
}
