//! fish-dh1080 エラー型

/// 鍵交換のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhError {
    /// 交換メッセージが不正（トークン・状態・公開値の範囲/部分群検査）
    InvalidMessage,
    /// 共有秘密が未確定（ピアの応答をまだ受け取っていない）
    SecretNotReady,
    /// 鍵ペア生成がリトライ上限まで失敗した（乱数源の故障を含む）
    KeygenFailure,
}

impl core::fmt::Display for DhError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DhError::InvalidMessage => write!(f, "Invalid DH1080 message"),
            DhError::SecretNotReady => write!(f, "Shared secret not established yet"),
            DhError::KeygenFailure => write!(f, "DH1080 key pair generation failed"),
        }
    }
}
