//! 错误类型
//!
//! 区分可恢复错误（设备断开、用户拒绝、网络故障）与致命错误（链ID校验失败），
//! 调用方据此决定是否重试。核心层本身不做任何重试。

use thiserror::Error;

/// 错误性质：调用方可据此分支处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 可重试（重新插拔设备、重新确认、网络恢复后）
    Recoverable,
    /// 不变量被破坏或输入非法，重试无意义
    Fatal,
}

/// 设备传输层错误（由 `DeviceTransport` 实现返回）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("device disconnected: {0}")]
    Disconnected(String),

    #[error("user rejected the request on device: {0}")]
    UserRejected(String),

    #[error("device request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Other(String),
}

/// 钱包适配器统一错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("hardware device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("request rejected on device: {0}")]
    UserRejected(String),

    #[error("Invalid networkId signature returned. Expected: {expected}, Got: {actual}")]
    SignatureMismatch { expected: u64, actual: i64 },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("invalid device response: {0}")]
    InvalidDeviceResponse(String),

    #[error("path store error: {0}")]
    Store(String),
}

impl WalletError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub fn invalid_device_response(msg: impl Into<String>) -> Self {
        Self::InvalidDeviceResponse(msg.into())
    }

    /// 网络协作方错误原样透传（保留 anyhow 上下文链）
    pub fn network(err: anyhow::Error) -> Self {
        Self::NetworkError(format!("{:#}", err))
    }

    pub fn store(err: anyhow::Error) -> Self {
        Self::Store(format!("{:#}", err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::DeviceUnavailable(_)
            | WalletError::UserRejected(_)
            | WalletError::NetworkError(_)
            | WalletError::Store(_) => ErrorKind::Recoverable,
            WalletError::SignatureMismatch { .. }
            | WalletError::InvalidParams(_)
            | WalletError::InvalidDeviceResponse(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Recoverable
    }

    /// 稳定的错误码，供 UI 层映射提示文案
    pub fn error_code(&self) -> &'static str {
        match self {
            WalletError::DeviceUnavailable(_) => "device_unavailable",
            WalletError::UserRejected(_) => "user_rejected",
            WalletError::SignatureMismatch { .. } => "signature_mismatch",
            WalletError::NetworkError(_) => "network_error",
            WalletError::InvalidParams(_) => "invalid_params",
            WalletError::InvalidDeviceResponse(_) => "invalid_device_response",
            WalletError::Store(_) => "store_error",
        }
    }
}

impl From<TransportError> for WalletError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::UserRejected(msg) => WalletError::UserRejected(msg),
            other => WalletError::DeviceUnavailable(other.to_string()),
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
