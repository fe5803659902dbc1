use crate::socket::types::{OrderCancelledResponse, OrderResponse, OrderSide, OrderStatusResponse};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse_str(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Client-side projection of an order pushed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradingOrder {
    pub id: String,
    pub side: OrderSide,
    pub price: f64,
    pub size: f64,
    pub filled: f64,
    pub status: OrderStatus,
    pub created_at_ms: i64,
    pub label: String,
}

/// Orders seen so far, in arrival order. Entries are updated in place and never removed.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: Vec<TradingOrder>,
}

impl OrderLedger {
    pub fn orders(&self) -> &[TradingOrder] {
        &self.orders
    }

    #[cfg(test)]
    fn get(&self, id: &str) -> Option<&TradingOrder> {
        self.orders.iter().find(|order| order.id == id)
    }

    /// Records every descriptor of a successful order-created push. Returns how many
    /// orders were added.
    pub fn apply_created(&mut self, response: &OrderResponse, now_ms: i64) -> usize {
        let Some(data) = response.data.as_ref().filter(|_| response.success) else {
            return 0;
        };

        for (index, created) in data.orders.iter().enumerate() {
            let side = if created.order_type.to_ascii_lowercase().contains("buy") {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            };
            let size = match created.calculated_order.making_amount.trim().parse::<f64>() {
                Ok(size) => size,
                Err(error) => {
                    warn!(order_id = %created.order_id, %error, "unparseable making amount");
                    0.0
                }
            };

            self.orders.push(TradingOrder {
                id: created.order_id.clone(),
                side,
                price: created.calculated_order.target_price,
                size,
                filled: 0.0,
                status: OrderStatus::Pending,
                created_at_ms: now_ms,
                label: format!("{} Order {}", created.order_type, index + 1),
            });
        }
        data.orders.len()
    }

    /// Returns `true` if a known order was updated.
    pub fn apply_status(&mut self, response: &OrderStatusResponse) -> bool {
        let Some(update) = response.data.as_ref().filter(|_| response.success) else {
            return false;
        };
        let Some(order) = self.orders.iter_mut().find(|order| order.id == update.id) else {
            return false;
        };

        if let Some(status) = update.status.as_deref().and_then(OrderStatus::parse_str) {
            order.status = status;
        }
        // A zero fill reading carries no information; keep what we had.
        if let Some(filled) = update.filled.filter(|filled| *filled != 0.0) {
            order.filled = filled;
        }
        true
    }

    pub fn apply_cancelled(&mut self, response: &OrderCancelledResponse) -> bool {
        let Some(order_id) = response.order_id.as_deref().filter(|_| response.success) else {
            return false;
        };
        match self.orders.iter_mut().find(|order| order.id == order_id) {
            Some(order) => {
                order.status = OrderStatus::Cancelled;
                true
            }
            None => false,
        }
    }
}
