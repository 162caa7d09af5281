//! ECB / CBC モードヘルパー
//!
//! - ECB: 各 8 バイトブロックを独立に暗号化。鍵展開済みの `Blowfish` を
//!   受け取るので、呼び出し側がインスタンスをキャッシュできる。
//! - CBC: IV から始まるチェーンをこの関数内で完結させる。チェーン状態を
//!   持つオブジェクトを ECB と共有しないよう、鍵素材から毎回構築する。
//!
//! 入力は 8 バイト境界に揃っていること（呼び出し側が `pad_to_block` を
//! 適用する）。揃っていない場合、余りバイトは処理されない。

use alloc::vec::Vec;

use crate::blowfish::Blowfish;
use crate::error::CipherError;
use crate::BLOCK_LEN;

/// ECB モードで暗号化する
///
/// # 引数
/// - `cipher`: 鍵展開済みの Blowfish（キャッシュ可）
/// - `data`: 8 バイト境界に揃った平文
pub fn ecb_encrypt(cipher: &Blowfish, data: &[u8]) -> Vec<u8> {
    debug_assert!(data.len() % BLOCK_LEN == 0);
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks_exact(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        out.extend_from_slice(&cipher.encrypt_block(&block));
    }
    out
}

/// ECB モードで復号する
pub fn ecb_decrypt(cipher: &Blowfish, data: &[u8]) -> Vec<u8> {
    debug_assert!(data.len() % BLOCK_LEN == 0);
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks_exact(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        out.extend_from_slice(&cipher.decrypt_block(&block));
    }
    out
}

/// CBC モードで暗号化する
///
/// # 引数
/// - `key`: 鍵素材（1〜72 バイト、超過分は切り詰め）
/// - `iv`: 8 バイトの初期化ベクトル
/// - `data`: 8 バイト境界に揃った平文
///
/// # エラー
/// - `CipherError::InvalidKey`: 鍵が空
pub fn cbc_encrypt(key: &[u8], iv: &[u8; 8], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    debug_assert!(data.len() % BLOCK_LEN == 0);
    let cipher = Blowfish::new(key)?;
    let mut out = Vec::with_capacity(data.len());
    let mut prev = *iv;
    for chunk in data.chunks_exact(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        prev = cipher.encrypt_block(&block);
        out.extend_from_slice(&prev);
    }
    Ok(out)
}

/// CBC モードで復号する
pub fn cbc_decrypt(key: &[u8], iv: &[u8; 8], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    debug_assert!(data.len() % BLOCK_LEN == 0);
    let cipher = Blowfish::new(key)?;
    let mut out = Vec::with_capacity(data.len());
    let mut prev = *iv;
    for chunk in data.chunks_exact(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        let mut plain = cipher.decrypt_block(&block);
        for (b, p) in plain.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        out.extend_from_slice(&plain);
        prev = block;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padding::pad_to_block;

    #[test]
    fn test_ecb_roundtrip() {
        let cipher = Blowfish::new(b"testkey").unwrap();
        let plain = pad_to_block(b"hello world");
        let enc = ecb_encrypt(&cipher, &plain);
        assert_eq!(enc.len(), plain.len());
        assert_eq!(ecb_decrypt(&cipher, &enc), plain);
    }

    #[test]
    fn test_ecb_known_block_one_byte_key() {
        // 1 バイト鍵でのゼロブロック暗号化（オフライン生成ベクタ）
        let cipher = Blowfish::new(b"a").unwrap();
        let enc = ecb_encrypt(&cipher, &[0u8; 8]);
        assert_eq!(
            enc,
            [0x11, 0x39, 0x79, 0xA6, 0x9C, 0xD0, 0x45, 0x38]
        );
    }

    #[test]
    fn test_ecb_known_block_72_byte_key() {
        let key: Vec<u8> = (1u8..=72).collect();
        let cipher = Blowfish::new(&key).unwrap();
        let enc = ecb_encrypt(&cipher, &[0u8; 8]);
        assert_eq!(
            enc,
            [0x39, 0x3D, 0x0E, 0x2F, 0x37, 0x4C, 0xF4, 0xC7]
        );
    }

    #[test]
    fn test_cbc_roundtrip() {
        let iv = [7u8, 6, 5, 4, 3, 2, 1, 0];
        let plain = pad_to_block(b"two blocks of text!");
        let enc = cbc_encrypt(b"testkey", &iv, &plain).unwrap();
        assert_ne!(enc, plain);
        assert_eq!(cbc_decrypt(b"testkey", &iv, &enc).unwrap(), plain);
    }

    #[test]
    fn test_cbc_differs_from_ecb() {
        // 同一平文ブロックが続いても CBC では暗号文が変わる
        let iv = [0u8; 8];
        let plain = [0x41u8; 16];
        let enc = cbc_encrypt(b"key", &iv, &plain).unwrap();
        assert_ne!(enc[..8], enc[8..]);
    }

    #[test]
    fn test_cbc_empty_key_rejected() {
        let iv = [0u8; 8];
        assert_eq!(
            cbc_encrypt(b"", &iv, &[0u8; 8]).unwrap_err(),
            CipherError::InvalidKey
        );
    }
}
