//! Codec A: blowcrypt 非標準 base64
//!
//! ## Wire Format
//! ```text
//! 8 バイト入力チャンク → 12 文字出力チャンク
//!
//! チャンク内:
//!   left  = 先頭 4 バイトの u32 BE
//!   right = 後半 4 バイトの u32 BE
//!   出力 = right の下位 6bit から 6 文字、続いて left から 6 文字
//!          （各ワード内は LSB-first、チャンク間は入力順）
//! ```
//!
//! 8 / 12 の倍数でない入力は呼び出し側の契約違反（エンジンは必ず
//! パディング済みのデータを渡す）。余りチャンクは処理されない。

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::CodecError;

/// blowcrypt アルファベット（インデックス = シンボル値）
const ALPHABET: &[u8; 64] = b"./0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// アルファベットの逆引きテーブルを構築する
///
/// アルファベット外のバイトは `None` 相当の 0xFF。
const fn build_reverse() -> [u8; 256] {
    let mut table = [0xFFu8; 256];
    let mut i = 0;
    while i < 64 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

const REVERSE: [u8; 256] = build_reverse();

/// 8 バイト境界の入力を blowcrypt base64 にエンコードする
pub fn blowcrypt_encode(data: &[u8]) -> String {
    debug_assert!(data.len() % 8 == 0);
    let mut out = String::with_capacity(data.len() / 8 * 12);
    for chunk in data.chunks_exact(8) {
        let left = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let right = u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        let mut r = right;
        for _ in 0..6 {
            out.push(ALPHABET[(r & 0x3F) as usize] as char);
            r >>= 6;
        }
        let mut l = left;
        for _ in 0..6 {
            out.push(ALPHABET[(l & 0x3F) as usize] as char);
            l >>= 6;
        }
    }
    out
}

/// 12 文字境界の blowcrypt base64 をデコードする
///
/// # エラー
/// - `CodecError::InvalidEncoding`: アルファベット外の文字を含む
pub fn blowcrypt_decode(s: &str) -> Result<Vec<u8>, CodecError> {
    let bytes = s.as_bytes();
    debug_assert!(bytes.len() % 12 == 0);
    let mut out = Vec::with_capacity(bytes.len() / 12 * 8);
    for chunk in bytes.chunks_exact(12) {
        let mut right = 0u32;
        for (i, &c) in chunk[0..6].iter().enumerate() {
            let v = REVERSE[c as usize];
            if v == 0xFF {
                return Err(CodecError::InvalidEncoding);
            }
            right |= u32::from(v) << (i * 6);
        }
        let mut left = 0u32;
        for (i, &c) in chunk[6..12].iter().enumerate() {
            let v = REVERSE[c as usize];
            if v == 0xFF {
                return Err(CodecError::InvalidEncoding);
            }
            left |= u32::from(v) << (i * 6);
        }
        out.extend_from_slice(&left.to_be_bytes());
        out.extend_from_slice(&right.to_be_bytes());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_vector() {
        // 既存の FiSH 実装から採った既知ベクタ
        let input: Vec<u8> = (1u8..=16).collect();
        assert_eq!(blowcrypt_encode(&input), "6qu/3.2au./.eWu1b.aGu07.");
    }

    #[test]
    fn test_decode_inverts_encode() {
        let input: Vec<u8> = (0u8..=255).take(64).collect();
        let encoded = blowcrypt_encode(&input);
        assert_eq!(encoded.len(), 96);
        assert_eq!(blowcrypt_decode(&encoded).unwrap(), input);
    }

    #[test]
    fn test_roundtrip_single_chunk() {
        let input = [0xFFu8, 0x00, 0xAB, 0xCD, 0x12, 0x34, 0x56, 0x78];
        let encoded = blowcrypt_encode(&input);
        assert_eq!(encoded.len(), 12);
        assert_eq!(blowcrypt_decode(&encoded).unwrap(), input);
    }

    #[test]
    fn test_decode_rejects_foreign_char() {
        // '=' は blowcrypt アルファベットに含まれない
        assert_eq!(
            blowcrypt_decode("====covered!"),
            Err(CodecError::InvalidEncoding)
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(blowcrypt_encode(&[]), "");
        assert_eq!(blowcrypt_decode("").unwrap(), Vec::<u8>::new());
    }
}
