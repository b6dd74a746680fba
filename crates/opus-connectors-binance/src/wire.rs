//! Order-request wire encoding.
//!
//! Binance moved conditional orders (STOP_MARKET, TAKE_PROFIT_MARKET) to
//! the algo-order service: they post to a different path, require
//! `algoType=CONDITIONAL`, and name the trigger `triggerPrice` and the
//! client id `clientAlgoId` instead of the regular-order field names.

use crate::types::OrderRequest;
use opus_models::OrderType;

/// Regular order endpoint.
pub const ORDER_PATH: &str = "/fapi/v1/order";

/// Conditional (algo) order endpoint.
pub const ALGO_ORDER_PATH: &str = "/fapi/v1/algoOrder";

/// Endpoint a request must post to.
pub fn endpoint(request: &OrderRequest) -> &'static str {
    if request.order_type.is_conditional() {
        ALGO_ORDER_PATH
    } else {
        ORDER_PATH
    }
}

/// Encode a request into query parameters, unsigned and in emission
/// order. Numeric fields use plain decimal formatting with trailing zeros
/// trimmed.
pub fn order_params(request: &OrderRequest) -> Vec<(&'static str, String)> {
    let is_algo = request.order_type.is_conditional();
    let mut params: Vec<(&'static str, String)> = vec![
        ("symbol", request.symbol.as_str().to_string()),
        ("side", request.side.as_str().to_string()),
        ("type", request.order_type.as_str().to_string()),
    ];

    if is_algo {
        params.push(("algoType", "CONDITIONAL".to_string()));
    }

    if !request.close_position {
        params.push(("quantity", format_decimal(request.quantity.to_f64())));
    }

    let needs_limit_price = matches!(
        request.order_type,
        OrderType::Limit | OrderType::StopLimit | OrderType::TakeProfit
    );
    if needs_limit_price {
        if let Some(price) = request.price {
            params.push(("price", format_decimal(price.to_f64())));
        }
        params.push(("timeInForce", request.time_in_force.as_str().to_string()));
    }

    if let Some(stop) = request.stop_price.filter(|p| p.is_valid()) {
        let key = if is_algo { "triggerPrice" } else { "stopPrice" };
        params.push((key, format_decimal(stop.to_f64())));
    }

    if let Some(ref id) = request.client_order_id {
        let key = if is_algo { "clientAlgoId" } else { "newClientOrderId" };
        params.push((key, id.clone()));
    }

    if request.close_position {
        // reduceOnly cannot be combined with closePosition.
        params.push(("closePosition", "true".to_string()));
    } else if request.reduce_only {
        params.push(("reduceOnly", "true".to_string()));
    }

    params
}

/// Assemble `k=v&k=v` form from encoded parameters.
pub fn to_query_string(params: &[(&'static str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Format with up to 8 decimals, trailing zeros trimmed.
fn format_decimal(v: f64) -> String {
    let mut s = format!("{v:.8}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
