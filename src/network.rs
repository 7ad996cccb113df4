//! Network URL constants for the tick stream.

/// Default trade-stream WebSocket URL (BTC/USDT spot trades).
pub const DEFAULT_WS_URL: &str = "wss://stream.binance.com:9443/ws/btcusdt@trade";

/// Symbol carried by the default stream.
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

/// Build the trade-stream URL for a lowercase symbol on the default host.
pub fn trade_stream_url(symbol: &str) -> String {
    format!(
        "wss://stream.binance.com:9443/ws/{}@trade",
        symbol.to_ascii_lowercase()
    )
}
