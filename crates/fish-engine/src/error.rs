//! fish-engine エラー型

use fish_crypto::CipherError;
use fish_dh1080::DhError;
use fish_wire::WireError;

/// エンジン操作のエラー
///
/// どれも致命的ではない。メッセージ単位・コマンド単位で回復できる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 指定ターゲットに鍵が設定されていない
    NotFound,
    /// 鍵が不正（空）
    InvalidKey,
    /// ワイヤ形式のエラー（復号失敗を含む）
    Wire(WireError),
    /// 鍵交換のエラー
    Dh(DhError),
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::NotFound => write!(f, "No key set for target"),
            EngineError::InvalidKey => write!(f, "Invalid key (empty key material)"),
            EngineError::Wire(e) => write!(f, "Wire error: {}", e),
            EngineError::Dh(e) => write!(f, "Key exchange error: {}", e),
        }
    }
}

impl From<WireError> for EngineError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::InvalidKey => EngineError::InvalidKey,
            other => EngineError::Wire(other),
        }
    }
}

impl From<DhError> for EngineError {
    fn from(e: DhError) -> Self {
        EngineError::Dh(e)
    }
}

impl From<CipherError> for EngineError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::InvalidKey => EngineError::InvalidKey,
        }
    }
}
