//! コーデックエラー型

/// コーデックのエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// デコードできない入力（短すぎる、またはアルファベット外の文字）
    InvalidEncoding,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CodecError::InvalidEncoding => write!(f, "Invalid encoding"),
        }
    }
}
