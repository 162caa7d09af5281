//! "+OK ..." 行のパック/アンパック本体

use alloc::string::String;
use alloc::vec::Vec;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use fish_codec::{blowcrypt_decode, blowcrypt_encode};
use fish_crypto::{
    cbc_decrypt, cbc_encrypt, ecb_decrypt, ecb_encrypt, pad_to_block, strip_plaintext, Blowfish,
    BLOCK_LEN,
};

use crate::error::WireError;
use crate::{PREFIX_MCPS, PREFIX_OK};

/// ECB ペイロードのブロックあたり文字数（8 バイト → 12 文字）
const ECB_CHARS_PER_BLOCK: usize = 12;

/// 平文を ECB 形式の 1 行にパックする。
///
/// 平文はゼロパディングで 8 バイト境界に揃えてから暗号化する。
/// パディング分は復号側の [`strip_plaintext`] で取り除かれる。
pub fn pack_ecb(cipher: &Blowfish, msg: &[u8]) -> String {
    let ct = ecb_encrypt(cipher, &pad_to_block(msg));
    let mut line = String::from(PREFIX_OK);
    line.push_str(&blowcrypt_encode(&ct));
    line
}

/// 平文を CBC 形式の 1 行にパックする。
///
/// IV は毎回 OS 乱数源から 8 バイト取り直す。
pub fn pack_cbc(key: &[u8], msg: &[u8]) -> Result<String, WireError> {
    let mut iv = [0u8; BLOCK_LEN];
    getrandom::getrandom(&mut iv).map_err(|_| WireError::RandomFailure)?;

    let ct = cbc_encrypt(key, &iv, &pad_to_block(msg))?;
    let mut buf = Vec::with_capacity(BLOCK_LEN + ct.len());
    buf.extend_from_slice(&iv);
    buf.extend_from_slice(&ct);

    let mut line = String::from(PREFIX_OK);
    line.push('*');
    line.push_str(&STANDARD.encode(&buf));
    Ok(line)
}

/// 受信行をアンパックして平文を返す。
///
/// プレフィックスは "+OK " と "mcps " の両方を受け付ける。
/// ペイロード先頭が '*' なら CBC 形式、それ以外は ECB 形式として扱う。
pub fn unpack(line: &str, cipher: &Blowfish, key: &[u8]) -> Result<Vec<u8>, WireError> {
    let payload = strip_prefix(line)?;

    if let Some(b64) = payload.strip_prefix('*') {
        unpack_cbc(b64, key)
    } else {
        unpack_ecb(payload, cipher)
    }
}

fn strip_prefix(line: &str) -> Result<&str, WireError> {
    line.strip_prefix(PREFIX_OK)
        .or_else(|| line.strip_prefix(PREFIX_MCPS))
        .ok_or(WireError::MalformedMessage)
}

fn unpack_cbc(b64: &str, key: &[u8]) -> Result<Vec<u8>, WireError> {
    // '=' パディングが欠けていても補ってからデコードする
    let mut padded = String::from(b64);
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    let raw = STANDARD
        .decode(padded.as_bytes())
        .map_err(|_| WireError::MalformedMessage)?;
    if raw.len() < BLOCK_LEN {
        return Err(WireError::MalformedMessage);
    }

    let mut iv = [0u8; BLOCK_LEN];
    iv.copy_from_slice(&raw[..BLOCK_LEN]);

    // 暗号文の端数はゼロパディングでブロック境界に揃える
    let mut ct = Vec::from(&raw[BLOCK_LEN..]);
    while ct.len() % BLOCK_LEN != 0 {
        ct.push(0);
    }

    let plain = cbc_decrypt(key, &iv, &ct)?;
    Ok(strip_plaintext(&plain))
}

fn unpack_ecb(payload: &str, cipher: &Blowfish) -> Result<Vec<u8>, WireError> {
    if payload.len() < ECB_CHARS_PER_BLOCK {
        return Err(WireError::MalformedMessage);
    }
    // 12 文字の倍数に満たない端数は黙って切り捨てる。切断位置が
    // マルチバイト文字の途中に落ちる行はアルファベット外なので不正扱い
    let usable = payload.len() - payload.len() % ECB_CHARS_PER_BLOCK;
    let head = payload.get(..usable).ok_or(WireError::MalformedMessage)?;
    let ct = blowcrypt_decode(head).map_err(|_| WireError::MalformedMessage)?;
    let plain = ecb_decrypt(cipher, &ct);
    Ok(strip_plaintext(&plain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn testkey_cipher() -> Blowfish {
        Blowfish::new(b"testkey").unwrap()
    }

    #[test]
    fn test_pack_ecb_known_vector() {
        let line = pack_ecb(&testkey_cipher(), b"hello world");
        assert_eq!(line, "+OK eTeOX1vWRDS0pv0Ex/4oTFr0");
    }

    #[test]
    fn test_unpack_ecb_known_vector() {
        let plain = unpack("+OK eTeOX1vWRDS0pv0Ex/4oTFr0", &testkey_cipher(), b"testkey").unwrap();
        assert_eq!(plain, b"hello world", "ECB 既知ベクタの復号が一致しない");
    }

    #[test]
    fn test_unpack_accepts_mcps_prefix() {
        let plain =
            unpack("mcps eTeOX1vWRDS0pv0Ex/4oTFr0", &testkey_cipher(), b"testkey").unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn test_unpack_cbc_known_vector() {
        // iv = 00..07, key = "testkey", 平文 = "hello world"
        let plain = unpack(
            "+OK *AAECAwQFBgdKS5B9HKn3mQtiTWR4+Zgq",
            &testkey_cipher(),
            b"testkey",
        )
        .unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn test_pack_cbc_roundtrip() {
        let line = pack_cbc(b"testkey", b"attack at dawn").unwrap();
        assert!(line.starts_with("+OK *"));
        let plain = unpack(&line, &testkey_cipher(), b"testkey").unwrap();
        assert_eq!(plain, b"attack at dawn");
    }

    #[test]
    fn test_pack_cbc_fresh_iv_each_call() {
        let a = pack_cbc(b"testkey", b"same message").unwrap();
        let b = pack_cbc(b"testkey", b"same message").unwrap();
        assert_ne!(a, b, "IV が毎回異なれば暗号文も異なるはず");
    }

    #[test]
    fn test_unpack_cbc_repads_missing_equals() {
        let line = pack_cbc(b"testkey", b"hello").unwrap();
        let stripped = line.trim_end_matches('=').to_string();
        let plain = unpack(&stripped, &testkey_cipher(), b"testkey").unwrap();
        assert_eq!(plain, b"hello");
    }

    #[test]
    fn test_unpack_ecb_truncates_partial_tail() {
        // 末尾に 12 文字未満の端数を継ぎ足しても先頭ブロックは復号できる
        let mut line = pack_ecb(&testkey_cipher(), b"hello world");
        line.push_str("abc");
        let plain = unpack(&line, &testkey_cipher(), b"testkey").unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn test_unpack_rejects_missing_prefix() {
        assert_eq!(
            unpack("eTeOX1vWRDS0pv0Ex/4oTFr0", &testkey_cipher(), b"testkey"),
            Err(WireError::MalformedMessage)
        );
    }

    #[test]
    fn test_unpack_ecb_multibyte_tail_is_malformed() {
        // 11 文字 + 2 バイト文字 'é' = 13 バイト。切り詰め位置 12 が
        // 'é' の途中に落ちるが、パニックせずエラーになること
        assert_eq!(
            unpack("+OK 12345678901é", &testkey_cipher(), b"testkey"),
            Err(WireError::MalformedMessage)
        );
        // マルチバイト文字が切り詰め範囲の内側に収まる場合も
        // アルファベット外としてエラー
        assert_eq!(
            unpack("+OK 123456789éx", &testkey_cipher(), b"testkey"),
            Err(WireError::MalformedMessage)
        );
    }

    #[test]
    fn test_unpack_rejects_short_ecb_payload() {
        assert_eq!(
            unpack("+OK abcdef", &testkey_cipher(), b"testkey"),
            Err(WireError::MalformedMessage)
        );
    }

    #[test]
    fn test_unpack_rejects_cbc_without_full_iv() {
        // base64 を解くと 3 バイトにしかならず IV に足りない
        assert_eq!(
            unpack("+OK *AAAA", &testkey_cipher(), b"testkey"),
            Err(WireError::MalformedMessage)
        );
    }

    #[test]
    fn test_unpack_rejects_garbage_base64() {
        assert_eq!(
            unpack("+OK *?!?!?!?!", &testkey_cipher(), b"testkey"),
            Err(WireError::MalformedMessage)
        );
    }

    #[test]
    fn test_unpack_cbc_with_empty_key_fails() {
        assert_eq!(
            unpack(
                "+OK *AAECAwQFBgdKS5B9HKn3mQtiTWR4+Zgq",
                &testkey_cipher(),
                b""
            ),
            Err(WireError::InvalidKey)
        );
    }
}
