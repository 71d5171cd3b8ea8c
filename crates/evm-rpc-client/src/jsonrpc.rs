//! JSON-RPC 2.0 envelopes and hex quantity helpers

use minter_core::RpcError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// Unwrap the envelope. A `null` result is returned as `Value::Null`.
    pub fn into_result(self) -> Result<serde_json::Value, RpcError> {
        if let Some(err) = self.error {
            // Node reports execution reverts as code 3 with the revert data attached
            if err.code == 3 || err.message.contains("execution reverted") {
                return Err(RpcError::Reverted {
                    reason: err.message,
                });
            }
            return Err(RpcError::JsonRpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(serde_json::Value::Null))
    }
}

/// Parse a hex quantity such as `"0x2105"`
pub fn parse_quantity(value: &str) -> Result<u64, RpcError> {
    let body = value
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::ParseError(format!("Quantity missing 0x prefix: {}", value)))?;
    if body.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(body, 16)
        .map_err(|e| RpcError::ParseError(format!("Bad quantity {}: {}", value, e)))
}

/// Encode a quantity as minimal hex (`0x0` for zero)
pub fn encode_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

/// Decode `0x`-prefixed hex data into bytes
pub fn decode_data(value: &str) -> Result<Vec<u8>, RpcError> {
    let body = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(body).map_err(|e| RpcError::ParseError(format!("Bad hex data: {}", e)))
}

pub fn encode_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x2105").unwrap(), 8453);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x").unwrap(), 0);
        assert!(parse_quantity("2105").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_encode_quantity() {
        assert_eq!(encode_quantity(0), "0x0");
        assert_eq!(encode_quantity(2_500_000_000_000_000), "0x8e1bc9bf04000");
    }

    #[test]
    fn test_data_hex() {
        assert_eq!(decode_data("0x0102").unwrap(), vec![1, 2]);
        assert_eq!(encode_data(&[0xab, 0xcd]), "0xabcd");
        assert!(decode_data("0x0").is_err());
    }

    #[test]
    fn test_response_error_mapping() {
        let resp: JsonRpcResponse = serde_json::from_value(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted: sold out", "data": "0x" }
        }))
        .unwrap();
        assert!(matches!(resp.into_result(), Err(RpcError::Reverted { .. })));

        let resp: JsonRpcResponse = serde_json::from_value(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32601, "message": "method not found" }
        }))
        .unwrap();
        assert!(matches!(
            resp.into_result(),
            Err(RpcError::JsonRpc { code: -32601, .. })
        ));
    }

    #[test]
    fn test_response_null_result() {
        let resp: JsonRpcResponse =
            serde_json::from_value(serde_json::json!({"jsonrpc": "2.0", "id": 7, "result": null}))
                .unwrap();
        assert!(resp.into_result().unwrap().is_null());
    }
}
