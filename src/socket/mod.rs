pub mod backoff;
pub mod client;
pub mod health;
pub mod heartbeat;
pub mod manager;
pub mod observers;
pub mod orders;
pub mod pool;
pub mod protocol;
pub mod queue;
pub mod transport;
pub mod types;

pub const CLIENT_READY_EVENT: &str = "client_ready";
pub const CLIENT_READY_ACK_EVENT: &str = "client_ready_ack";
pub const PING_EVENT: &str = "ping";
pub const PONG_EVENT: &str = "pong";
pub const CREATE_ORDER_EVENT: &str = "createOrder";
pub const GET_TRADING_SUGGESTIONS_EVENT: &str = "getTradingSuggestions";
pub const GET_ORDER_STATUS_EVENT: &str = "getOrderStatus";
pub const CANCEL_ORDER_EVENT: &str = "cancelOrder";
pub const ORDER_CREATED_EVENT: &str = "orderCreated";
pub const ORDER_STATUS_EVENT: &str = "orderStatus";
pub const ORDER_CANCELLED_EVENT: &str = "orderCancelled";
pub const TRADING_SUGGESTIONS_EVENT: &str = "tradingSuggestions";
pub const PRICE_CHECKED_EVENT: &str = "priceChecked";
pub const MONITORING_STATUS_EVENT: &str = "monitoringStatus";
