//! Event vocabulary exchanged with the trading backend.
//!
//! Every frame is a JSON text message shaped `{"event": <name>, "data": <payload>}`.

use crate::error::AppError;
use crate::socket::types::{
    ClientReady, ClientReadyAck, CreateOrderData, HeartbeatPayload, OrderCancelledResponse,
    OrderResponse, OrderStatusResponse, SuggestionsRequest, SuggestionsResponse,
};
use serde::{Deserialize, Serialize};
use simd_json::OwnedValue;

use super::{
    CANCEL_ORDER_EVENT, CLIENT_READY_ACK_EVENT, CLIENT_READY_EVENT, CREATE_ORDER_EVENT,
    GET_ORDER_STATUS_EVENT, GET_TRADING_SUGGESTIONS_EVENT, MONITORING_STATUS_EVENT,
    ORDER_CANCELLED_EVENT, ORDER_CREATED_EVENT, ORDER_STATUS_EVENT, PING_EVENT, PONG_EVENT,
    PRICE_CHECKED_EVENT, TRADING_SUGGESTIONS_EVENT,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "client_ready")]
    ClientReady(ClientReady),
    #[serde(rename = "ping")]
    Ping(HeartbeatPayload),
    #[serde(rename = "createOrder")]
    CreateOrder(CreateOrderData),
    #[serde(rename = "getTradingSuggestions")]
    GetTradingSuggestions(SuggestionsRequest),
    #[serde(rename = "getOrderStatus")]
    GetOrderStatus(String),
    #[serde(rename = "cancelOrder")]
    CancelOrder(String),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClientReady(_) => CLIENT_READY_EVENT,
            Self::Ping(_) => PING_EVENT,
            Self::CreateOrder(_) => CREATE_ORDER_EVENT,
            Self::GetTradingSuggestions(_) => GET_TRADING_SUGGESTIONS_EVENT,
            Self::GetOrderStatus(_) => GET_ORDER_STATUS_EVENT,
            Self::CancelOrder(_) => CANCEL_ORDER_EVENT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "client_ready_ack")]
    ClientReadyAck(ClientReadyAck),
    #[serde(rename = "pong")]
    Pong(HeartbeatPayload),
    #[serde(rename = "orderCreated")]
    OrderCreated(OrderResponse),
    #[serde(rename = "orderStatus")]
    OrderStatus(OrderStatusResponse),
    #[serde(rename = "orderCancelled")]
    OrderCancelled(OrderCancelledResponse),
    #[serde(rename = "tradingSuggestions")]
    TradingSuggestions(SuggestionsResponse),
    #[serde(rename = "priceChecked")]
    PriceChecked(OwnedValue),
    #[serde(rename = "monitoringStatus")]
    MonitoringStatus(OwnedValue),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClientReadyAck(_) => CLIENT_READY_ACK_EVENT,
            Self::Pong(_) => PONG_EVENT,
            Self::OrderCreated(_) => ORDER_CREATED_EVENT,
            Self::OrderStatus(_) => ORDER_STATUS_EVENT,
            Self::OrderCancelled(_) => ORDER_CANCELLED_EVENT,
            Self::TradingSuggestions(_) => TRADING_SUGGESTIONS_EVENT,
            Self::PriceChecked(_) => PRICE_CHECKED_EVENT,
            Self::MonitoringStatus(_) => MONITORING_STATUS_EVENT,
        }
    }
}

pub fn encode_client_event(event: &ClientEvent) -> Result<String, AppError> {
    Ok(simd_json::serde::to_string(event)?)
}

/// Decodes in place; `payload` is clobbered by the SIMD parser.
pub fn decode_server_event(payload: &mut [u8]) -> Result<ServerEvent, AppError> {
    Ok(simd_json::serde::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::types::{MarketTrend, SuggestedAction};

    #[test]
    fn encodes_handshake_with_event_envelope() {
        let encoded = encode_client_event(&ClientEvent::ClientReady(ClientReady {
            client_type: "desk".to_string(),
            timestamp: 1_700_000_000_000,
        }))
        .expect("handshake should encode");

        assert!(encoded.contains(r#""event":"client_ready""#));
        assert!(encoded.contains(r#""clientType":"desk""#));
        assert!(encoded.contains(r#""timestamp":1700000000000"#));
    }

    #[test]
    fn encodes_order_id_requests_as_bare_strings() {
        let encoded = encode_client_event(&ClientEvent::CancelOrder("ord-7".to_string()))
            .expect("cancel should encode");
        assert_eq!(encoded, r#"{"event":"cancelOrder","data":"ord-7"}"#);
    }

    #[test]
    fn decodes_handshake_ack() {
        let mut payload = br#"{"event":"client_ready_ack","data":{"success":false,"error":"busy"}}"#.to_vec();
        let event = decode_server_event(&mut payload).expect("ack should decode");

        assert_eq!(
            event,
            ServerEvent::ClientReadyAck(ClientReadyAck {
                success: false,
                error: Some("busy".to_string()),
            })
        );
    }

    #[test]
    fn decodes_order_created_payload() {
        let mut payload = br#"{"event":"orderCreated","data":{"success":true,"data":{"orders":[{"orderId":"o-1","orderType":"BUY","jupiterResponse":{"order":"x","transaction":"tx","requestId":"r"},"calculatedOrder":{"type":"limit","makingAmount":"1500000","takingAmount":"10000000","targetPrice":140.5,"expectedOutputAmount":0.0107,"description":"buy"}}],"calculations":{"summary":{"totalOrders":1,"totalInputAmount":1.5,"totalExpectedOutput":0.0107}}}}}"#.to_vec();
        let event = decode_server_event(&mut payload).expect("orderCreated should decode");

        let ServerEvent::OrderCreated(response) = event else {
            panic!("expected orderCreated");
        };
        let data = response.data.expect("order data");
        assert_eq!(data.orders.len(), 1);
        assert_eq!(data.orders[0].order_id, "o-1");
        assert_eq!(data.orders[0].calculated_order.target_price, 140.5);
        assert_eq!(data.orders[0].calculated_order.making_amount, "1500000");
        assert_eq!(
            data.orders[0].execution.as_ref().map(|ticket| ticket.request_id.as_str()),
            Some("r")
        );
    }

    #[test]
    fn decodes_trading_suggestions_payload() {
        let mut payload = br#"{"event":"tradingSuggestions","data":{"success":true,"data":{"currentPrice":150,"suggestions":[{"confidence":0.8,"action":"BUY","entryPrice":149,"takeProfitPrice":160,"stopLossPrice":140,"positionSize":0.5,"riskRewardRatio":1.2,"reasoning":"trend","timeframe":"1h","riskLevel":"moderate"}],"marketAnalysis":{"trend":"BULLISH","strength":0.7,"support":140,"resistance":165,"volatility":"MEDIUM"},"technicalIndicators":{"priceChange":2.5,"confidence":"high","liquidity":"medium"}}}}"#.to_vec();
        let event = decode_server_event(&mut payload).expect("suggestions should decode");

        let ServerEvent::TradingSuggestions(response) = event else {
            panic!("expected tradingSuggestions");
        };
        let data = response.data.expect("suggestions data");
        assert_eq!(data.current_price, 150.0);
        assert_eq!(data.suggestions[0].action, SuggestedAction::Buy);
        assert_eq!(data.market_analysis.trend, MarketTrend::Bullish);
    }

    #[test]
    fn decodes_informational_pushes_as_raw_values() {
        let mut payload = br#"{"event":"priceChecked","data":{"price":1.25}}"#.to_vec();
        let event = decode_server_event(&mut payload).expect("priceChecked should decode");
        assert_eq!(event.name(), PRICE_CHECKED_EVENT);
    }

    #[test]
    fn rejects_unknown_events() {
        let mut payload = br#"{"event":"mystery","data":{}}"#.to_vec();
        assert!(decode_server_event(&mut payload).is_err());
    }
}
