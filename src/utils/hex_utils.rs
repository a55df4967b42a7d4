//! Hex 与数量字段工具

use ethers::types::U256;

use crate::error::{WalletError, WalletResult};

pub fn has_hex_prefix(s: &str) -> bool {
    s.starts_with("0x") || s.starts_with("0X")
}

pub fn strip_0x(s: &str) -> &str {
    if has_hex_prefix(s) {
        &s[2..]
    } else {
        s
    }
}

/// 解析数量字段：`0x` 前缀按十六进制，否则按十进制
pub fn parse_quantity(field: &str, value: &str) -> WalletResult<U256> {
    let value = value.trim();
    if has_hex_prefix(value) {
        let digits = &value[2..];
        if digits.is_empty() {
            return Ok(U256::zero());
        }
        U256::from_str_radix(digits, 16).map_err(|e| {
            WalletError::invalid_params(format!("{}: invalid hex '{}': {}", field, value, e))
        })
    } else {
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(WalletError::invalid_params(format!(
                "{}: invalid decimal '{}'",
                field, value
            )));
        }
        U256::from_dec_str(value)
            .map_err(|e| WalletError::invalid_params(format!("{}: {:?}", field, e)))
    }
}

/// 数量转 `0x` 十六进制；已带前缀的原样返回
pub fn to_hex_quantity(value: &str) -> WalletResult<String> {
    let value = value.trim();
    if has_hex_prefix(value) {
        return Ok(value.to_string());
    }
    Ok(format!("{:#x}", parse_quantity("value", value)?))
}

/// 大端最小字节表示（0 为空）
pub fn quantity_bytes(value: &U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    strip_leading_zeros(&buf).to_vec()
}

/// 整数数量转 `0x` 十六进制
pub fn u64_to_hex_quantity(value: u64) -> String {
    format!("{:#x}", value)
}

pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// 解码可选 `0x` 前缀的十六进制字段
pub fn decode_hex(field: &str, value: &str) -> WalletResult<Vec<u8>> {
    hex::decode(strip_0x(value.trim())).map_err(|e| {
        WalletError::invalid_params(format!("{}: invalid hex '{}': {}", field, value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("gas", "0x30D40").unwrap(), U256::from(200_000u64));
        assert_eq!(parse_quantity("gas", "200000").unwrap(), U256::from(200_000u64));
        assert_eq!(parse_quantity("gas", "0x").unwrap(), U256::zero());
        assert!(parse_quantity("gas", "").is_err());
        assert!(parse_quantity("gas", "12abc").is_err());
        assert!(parse_quantity("gas", "-1").is_err());
        assert!(parse_quantity("gas", "0xzz").is_err());
    }

    #[test]
    fn test_to_hex_quantity() {
        assert_eq!(to_hex_quantity("0x29E8D60800").unwrap(), "0x29E8D60800");
        assert_eq!(to_hex_quantity("180000000000").unwrap(), "0x29e8d60800");
        assert_eq!(to_hex_quantity("0").unwrap(), "0x0");

        assert_eq!(u64_to_hex_quantity(0), "0x0");
        assert_eq!(u64_to_hex_quantity(21_000), "0x5208");
        assert_eq!(
            u64_to_hex_quantity(180_000_000_000),
            to_hex_quantity("180000000000").unwrap()
        );
    }

    #[test]
    fn test_minimal_bytes() {
        assert!(quantity_bytes(&U256::zero()).is_empty());
        assert_eq!(quantity_bytes(&U256::from(0x0400u64)), vec![0x04, 0x00]);
        assert_eq!(strip_leading_zeros(&[0, 0, 7, 0]), &[7, 0]);
        assert!(strip_leading_zeros(&[0, 0]).is_empty());
    }
}
