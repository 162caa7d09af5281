//! fish-wire エラー型

use fish_crypto::CipherError;

/// ワイヤ形式のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// 認識できない形式（プレフィックス不正、デコード不能、ペイロード不足）
    MalformedMessage,
    /// 鍵が不正（空）
    InvalidKey,
    /// OS 乱数源から IV を取得できなかった
    RandomFailure,
}

impl core::fmt::Display for WireError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WireError::MalformedMessage => write!(f, "Malformed message"),
            WireError::InvalidKey => write!(f, "Invalid key (empty key material)"),
            WireError::RandomFailure => write!(f, "Failed to read random bytes for IV"),
        }
    }
}

impl From<CipherError> for WireError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::InvalidKey => WireError::InvalidKey,
        }
    }
}
