//! Wanchain 交易模型与规范 RLP 编码
//!
//! 字段顺序: `[Txtype, nonce, gasPrice, gasLimit, to, value, data, v, r, s]`。
//! 签名前 v 放链ID、r/s 置空（EIP-155 占位），设备对这段编码签名；
//! 签名后把设备返回的 v/r/s 填回，重新编码得到可广播的原始交易。

use ethers::types::U256;
use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Deserializer, Serialize};
use sha3::{Digest, Keccak256};

use crate::{
    error::{WalletError, WalletResult},
    utils::hex_utils::{
        decode_hex, parse_quantity, quantity_bytes, strip_leading_zeros, u64_to_hex_quantity,
    },
};

/// 普通交易类型标记
pub const TX_TYPE_NORMAL: u8 = 0x01;
/// 180 gwei
pub const DEFAULT_GAS_PRICE: u64 = 0x29E8D60800;
pub const DEFAULT_GAS_LIMIT: u64 = 0x30D40;

const FIELD_COUNT: usize = 10;

/// 调用方未提供 gasPrice / gasLimit 时的默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionDefaults {
    pub gas_price: U256,
    pub gas_limit: U256,
}

impl Default for TransactionDefaults {
    fn default() -> Self {
        Self {
            gas_price: U256::from(DEFAULT_GAS_PRICE),
            gas_limit: U256::from(DEFAULT_GAS_LIMIT),
        }
    }
}

/// 交易参数
///
/// 数量字段接受 `0x` 十六进制或十进制字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_price: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_limit: Option<String>,
    pub to: String,
    #[serde(
        default,
        deserialize_with = "deserialize_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// 缺省时由网络协作方查询
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// 数量字段既可以是字符串也可以是 JSON 整数
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Quantity>::deserialize(deserializer)?.map(|q| match q {
        Quantity::Text(s) => s,
        Quantity::Number(n) => u64_to_hex_quantity(n),
    }))
}

impl TransactionParams {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_gas_price(mut self, gas_price: impl Into<String>) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: impl Into<String>) -> Self {
        self.gas_limit = Some(gas_limit.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WanTransaction {
    pub tx_type: u8,
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    /// 20 字节地址；合约创建时为空
    pub to: Vec<u8>,
    pub value: U256,
    pub data: Vec<u8>,
    pub v: Vec<u8>,
    pub r: Vec<u8>,
    pub s: Vec<u8>,
}

impl WanTransaction {
    /// 按参数构建未签名交易，缺省字段取默认值
    pub fn from_params(
        params: &TransactionParams,
        defaults: &TransactionDefaults,
    ) -> WalletResult<Self> {
        let to = decode_hex("to", &params.to)?;
        if !to.is_empty() && to.len() != 20 {
            return Err(WalletError::invalid_params(format!(
                "to: expected 20-byte address, got {} bytes",
                to.len()
            )));
        }

        let gas_price = match &params.gas_price {
            Some(v) => parse_quantity("gasPrice", v)?,
            None => defaults.gas_price,
        };
        let gas_limit = match &params.gas_limit {
            Some(v) => parse_quantity("gasLimit", v)?,
            None => defaults.gas_limit,
        };
        let value = match &params.value {
            Some(v) => parse_quantity("value", v)?,
            None => U256::zero(),
        };
        let data = match &params.data {
            Some(d) => decode_hex("data", d)?,
            None => Vec::new(),
        };

        Ok(Self {
            tx_type: TX_TYPE_NORMAL,
            nonce: U256::from(params.nonce.unwrap_or(0)),
            gas_price,
            gas_limit,
            to,
            value,
            data,
            v: Vec::new(),
            r: Vec::new(),
            s: Vec::new(),
        })
    }

    /// EIP-155 占位：v = 链ID 低字节（固定一个字节，0 也不省略），r/s 置空
    ///
    /// 设备应用只认单字节链ID。
    pub fn set_replay_protection(&mut self, chain_id: u64) {
        self.v = vec![(chain_id & 0xff) as u8];
        self.r.clear();
        self.s.clear();
    }

    /// 写入设备返回的签名（十六进制，可带 0x）
    ///
    /// r/s 去掉前导零，v 原样保存。
    pub fn apply_signature(&mut self, v: &str, r: &str, s: &str) -> WalletResult<()> {
        let decode = |field: &str, value: &str| {
            decode_hex(field, value)
                .map_err(|e| WalletError::invalid_device_response(e.to_string()))
        };

        let v = decode("v", v)?;
        let r = decode("r", r)?;
        let s = decode("s", s)?;
        if v.is_empty() {
            return Err(WalletError::invalid_device_response("empty v returned by device"));
        }
        if r.len() > 32 || s.len() > 32 {
            return Err(WalletError::invalid_device_response(
                "r/s longer than 32 bytes",
            ));
        }

        self.v = v;
        self.r = strip_leading_zeros(&r).to_vec();
        self.s = strip_leading_zeros(&s).to_vec();
        Ok(())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(FIELD_COUNT);
        stream.append(&self.tx_type);
        stream.append(&quantity_bytes(&self.nonce));
        stream.append(&quantity_bytes(&self.gas_price));
        stream.append(&quantity_bytes(&self.gas_limit));
        stream.append(&self.to);
        stream.append(&quantity_bytes(&self.value));
        stream.append(&self.data);
        stream.append(&self.v);
        stream.append(&self.r);
        stream.append(&self.s);
        stream.out().to_vec()
    }

    pub fn encode_hex(&self) -> String {
        hex::encode(self.encode())
    }

    pub fn decode(bytes: &[u8]) -> WalletResult<Self> {
        let rlp = Rlp::new(bytes);
        let invalid = |e: rlp::DecoderError| {
            WalletError::invalid_params(format!("invalid transaction encoding: {}", e))
        };

        if !rlp.is_list() {
            return Err(WalletError::invalid_params("transaction encoding is not a list"));
        }
        let count = rlp.item_count().map_err(invalid)?;
        if count != FIELD_COUNT {
            return Err(WalletError::invalid_params(format!(
                "expected {} transaction fields, got {}",
                FIELD_COUNT, count
            )));
        }

        let field = |i: usize| -> WalletResult<Vec<u8>> {
            Ok(rlp.at(i).map_err(invalid)?.data().map_err(invalid)?.to_vec())
        };
        let quantity = |i: usize| -> WalletResult<U256> {
            let bytes = field(i)?;
            if bytes.len() > 32 {
                return Err(WalletError::invalid_params("quantity longer than 32 bytes"));
            }
            Ok(U256::from_big_endian(&bytes))
        };

        let tx_type = match field(0)?.as_slice() {
            [] => 0,
            [b] => *b,
            _ => return Err(WalletError::invalid_params("Txtype must be a single byte")),
        };

        Ok(Self {
            tx_type,
            nonce: quantity(1)?,
            gas_price: quantity(2)?,
            gas_limit: quantity(3)?,
            to: field(4)?,
            value: quantity(5)?,
            data: field(6)?,
            v: field(7)?,
            r: field(8)?,
            s: field(9)?,
        })
    }

    /// 编码后的 keccak-256
    pub fn hash(&self) -> [u8; 32] {
        Keccak256::digest(self.encode()).into()
    }

    pub fn is_signed(&self) -> bool {
        !self.r.is_empty() && !self.s.is_empty()
    }
}

/// 从 v 的首字节推导签名所用链ID: `floor((v - 35) / 2)`
pub fn signed_chain_id(v: &[u8]) -> Option<i64> {
    v.first().map(|b| (i64::from(*b) - 35).div_euclid(2))
}

/// 校验签名链ID
///
/// 设备应用只支持单字节链ID，所以只比较低 8 位；不要改成完整比较。
pub fn validate_chain_id(chain_id: u64, v: &[u8]) -> WalletResult<()> {
    let actual = signed_chain_id(v)
        .ok_or_else(|| WalletError::invalid_device_response("empty v returned by device"))?;
    let expected_low = (chain_id & 0xff) as i64;

    if actual != expected_low {
        tracing::warn!(
            expected = chain_id,
            actual = actual,
            "Device signed with unexpected chain id"
        );
        return Err(WalletError::SignatureMismatch {
            expected: chain_id,
            actual,
        });
    }
    Ok(())
}

/// 已签名交易
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: WanTransaction,
    pub chain_id: u64,
    /// `0x` 前缀的原始交易
    pub raw: String,
    /// `0x` 前缀的交易哈希
    pub hash: String,
}

impl SignedTransaction {
    pub fn new(transaction: WanTransaction, chain_id: u64) -> Self {
        let raw = format!("0x{}", transaction.encode_hex());
        let hash = format!("0x{}", hex::encode(transaction.hash()));
        Self {
            transaction,
            chain_id,
            raw,
            hash,
        }
    }

    pub fn v(&self) -> &[u8] {
        &self.transaction.v
    }
}
