//! 暗号エラー型

/// 暗号操作のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// 鍵が空
    InvalidKey,
}

impl core::fmt::Display for CipherError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CipherError::InvalidKey => write!(f, "Invalid key (empty key material)"),
        }
    }
}
