use crate::socket::types::{
    ConnectionStatusSnapshot, OrderCancelledResponse, OrderResponse, OrderStatusResponse,
    SuggestionsResponse,
};
use parking_lot::RwLock;
use std::sync::Arc;

pub type ConnectionChangeCallback = Arc<dyn Fn(&ConnectionStatusSnapshot) + Send + Sync>;
pub type OrderCreatedCallback = Arc<dyn Fn(&OrderResponse) + Send + Sync>;
pub type OrderStatusCallback = Arc<dyn Fn(&OrderStatusResponse) + Send + Sync>;
pub type OrderCancelledCallback = Arc<dyn Fn(&OrderCancelledResponse) + Send + Sync>;
pub type TradingSuggestionsCallback = Arc<dyn Fn(&SuggestionsResponse) + Send + Sync>;
/// `None` clears a previously reported error.
pub type ErrorCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// One slot per event kind; registering again replaces the previous callback.
#[derive(Default)]
pub struct ObserverRegistry {
    connection_change: RwLock<Option<ConnectionChangeCallback>>,
    order_created: RwLock<Option<OrderCreatedCallback>>,
    order_status: RwLock<Option<OrderStatusCallback>>,
    order_cancelled: RwLock<Option<OrderCancelledCallback>>,
    trading_suggestions: RwLock<Option<TradingSuggestionsCallback>>,
    error: RwLock<Option<ErrorCallback>>,
}

impl ObserverRegistry {
    pub fn set_connection_change(&self, callback: ConnectionChangeCallback) {
        *self.connection_change.write() = Some(callback);
    }

    pub fn set_order_created(&self, callback: OrderCreatedCallback) {
        *self.order_created.write() = Some(callback);
    }

    pub fn set_order_status(&self, callback: OrderStatusCallback) {
        *self.order_status.write() = Some(callback);
    }

    pub fn set_order_cancelled(&self, callback: OrderCancelledCallback) {
        *self.order_cancelled.write() = Some(callback);
    }

    pub fn set_trading_suggestions(&self, callback: TradingSuggestionsCallback) {
        *self.trading_suggestions.write() = Some(callback);
    }

    pub fn set_error(&self, callback: ErrorCallback) {
        *self.error.write() = Some(callback);
    }

    // Callbacks are cloned out of the slot before running so one may re-register
    // without deadlocking.

    pub fn connection_changed(&self, snapshot: &ConnectionStatusSnapshot) {
        let callback = self.connection_change.read().clone();
        if let Some(callback) = callback {
            callback(snapshot);
        }
    }

    pub fn order_created(&self, response: &OrderResponse) {
        let callback = self.order_created.read().clone();
        if let Some(callback) = callback {
            callback(response);
        }
    }

    pub fn order_status(&self, response: &OrderStatusResponse) {
        let callback = self.order_status.read().clone();
        if let Some(callback) = callback {
            callback(response);
        }
    }

    pub fn order_cancelled(&self, response: &OrderCancelledResponse) {
        let callback = self.order_cancelled.read().clone();
        if let Some(callback) = callback {
            callback(response);
        }
    }

    pub fn trading_suggestions(&self, response: &SuggestionsResponse) {
        let callback = self.trading_suggestions.read().clone();
        if let Some(callback) = callback {
            callback(response);
        }
    }

    pub fn error(&self, message: Option<&str>) {
        let callback = self.error.read().clone();
        if let Some(callback) = callback {
            callback(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn last_registration_wins() {
        let registry = ObserverRegistry::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        registry.set_error(Arc::new(move |message: Option<&str>| {
            first.lock().push(format!("first:{message:?}"));
        }));
        let second = Arc::clone(&seen);
        registry.set_error(Arc::new(move |message: Option<&str>| {
            second.lock().push(format!("second:{message:?}"));
        }));

        registry.error(Some("boom"));
        registry.error(None);
        assert_eq!(
            *seen.lock(),
            vec![
                "second:Some(\"boom\")".to_string(),
                "second:None".to_string()
            ]
        );
    }

    #[test]
    fn empty_slots_are_silent() {
        let registry = ObserverRegistry::default();
        registry.order_cancelled(&OrderCancelledResponse {
            success: true,
            order_id: Some("o-1".to_string()),
            error: None,
        });
    }
}
