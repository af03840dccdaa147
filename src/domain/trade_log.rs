//! Append-only record of closed trades.

use super::position::ClosedTrade;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLog {
    trades: Vec<ClosedTrade>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: ClosedTrade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn last(&self) -> Option<&ClosedTrade> {
        self.trades.last()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClosedTrade> {
        self.trades.iter()
    }
}

impl<'a> IntoIterator for &'a TradeLog {
    type Item = &'a ClosedTrade;
    type IntoIter = std::slice::Iter<'a, ClosedTrade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}
