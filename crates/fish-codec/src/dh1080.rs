//! Codec B: DH1080 非標準 base64
//!
//! ## Wire Format
//! ```text
//! エンコード:
//!   入力を MSB-first のビットストリームとして 6bit ずつ切り出し、
//!   各 6bit 値をアルファベットの文字にする。端数ビットは左詰めして
//!   1 文字にする。パディング文字 ('=') は無い。
//!   注意: 入力長が 3 の倍数（ビット数が 6 の倍数）のときは端数処理が
//!   ゼロ値のまま走り、余分な 'A' が末尾に 1 文字付く。これは
//!   既存の FiSH クライアントの挙動で、ワイヤ互換のため保存する。
//!
//! デコード:
//!   末尾の「値 0 のシンボル」をトリムして上記の曖昧さを吸収し、
//!   6bit 値 4 つ → 3 バイトの組み立てで復元する。端数 6bit は捨てる。
//!   トリムの走査は最終文字の 1 つ手前から始まる（既存実装のループと
//!   同一。最終文字自体は走査されない）。
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::CodecError;

/// DH1080 アルファベット（インデックス = シンボル値）
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// 逆引きテーブル。アルファベット外のバイトは 0
/// （既存の FiSH 実装と同じく、未知文字はゼロ値シンボルとして扱われる）
const fn build_reverse() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 64 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

const REVERSE: [u8; 256] = build_reverse();

/// バイト列を DH1080 base64 にエンコードする
///
/// 空入力は空文字列になる。
pub fn dh1080_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() / 3 * 4 + 3);
    for chunk in data.chunks(3) {
        match *chunk {
            [b0, b1, b2] => {
                out.push(ALPHABET[(b0 >> 2) as usize] as char);
                out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
                out.push(ALPHABET[(((b1 & 0x0F) << 2) | (b2 >> 6)) as usize] as char);
                out.push(ALPHABET[(b2 & 0x3F) as usize] as char);
            }
            [b0, b1] => {
                out.push(ALPHABET[(b0 >> 2) as usize] as char);
                out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
                out.push(ALPHABET[((b1 & 0x0F) << 2) as usize] as char);
            }
            [b0] => {
                out.push(ALPHABET[(b0 >> 2) as usize] as char);
                out.push(ALPHABET[((b0 & 0x03) << 4) as usize] as char);
            }
            // chunks(3) は空スライスを返さない
            _ => {}
        }
    }
    // ビット数が 6 の倍数 ⇔ 入力長が 3 の倍数のとき、
    // 既存の FiSH 実装は端数処理でゼロ値の 'A' を 1 文字余分に出す
    if !data.is_empty() && data.len() % 3 == 0 {
        out.push('A');
    }
    out
}

/// DH1080 base64 をデコードする
///
/// # エラー
/// - `CodecError::InvalidEncoding`: トリム後の長さが 2 文字未満
pub fn dh1080_decode(s: &str) -> Result<Vec<u8>, CodecError> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return Err(CodecError::InvalidEncoding);
    }

    // 末尾のゼロ値シンボルをトリムする。走査は最終文字の 1 つ手前から
    let mut len = bytes.len();
    for i in (0..bytes.len() - 1).rev() {
        if REVERSE[bytes[i] as usize] == 0 {
            len -= 1;
        } else {
            break;
        }
    }
    if len < 2 {
        return Err(CodecError::InvalidEncoding);
    }

    let mut out = Vec::with_capacity(len * 3 / 4);
    for chunk in bytes[..len].chunks(4) {
        let v = |c: u8| REVERSE[c as usize];
        match *chunk {
            [c0, c1, c2, c3] => {
                out.push((v(c0) << 2) | (v(c1) >> 4));
                out.push(((v(c1) & 0x0F) << 4) | (v(c2) >> 2));
                out.push(((v(c2) & 0x03) << 6) | v(c3));
            }
            [c0, c1, c2] => {
                out.push((v(c0) << 2) | (v(c1) >> 4));
                out.push(((v(c1) & 0x0F) << 4) | (v(c2) >> 2));
            }
            [c0, c1] => {
                out.push((v(c0) << 2) | (v(c1) >> 4));
            }
            // 単独の 6bit はバイトにならないので捨てる
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_aligned_gets_extra_a() {
        // 3 バイト入力 → 4 文字 + 余分な 'A'（既存実装互換の挙動）
        assert_eq!(dh1080_encode(&[1, 2, 3]), "AQIDA");
    }

    #[test]
    fn test_encode_unaligned() {
        assert_eq!(dh1080_encode(&[0xDE, 0xAD, 0xBE, 0xEF]), "3q2+7w");
        assert_eq!(dh1080_encode(b"hello world"), "aGVsbG8gd29ybGQ");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(dh1080_encode(&[]), "");
    }

    #[test]
    fn test_decode_trims_extra_a() {
        assert_eq!(dh1080_decode("AQIDA").unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_decode_inverts_encode() {
        assert_eq!(dh1080_decode("3q2+7w").unwrap(), [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(dh1080_decode("aGVsbG8gd29ybGQ").unwrap(), b"hello world");
    }

    #[test]
    fn test_roundtrip_various_lengths() {
        // 末尾付近にゼロ値シンボルが出るとトリムで情報が落ちる
        // （この形式固有の曖昧さ）ため、
        // 全シンボルが非ゼロになる 0xFF 埋めで長さだけを変えて往復を確認する
        for n in 1usize..=48 {
            let data = alloc::vec![0xFFu8; n];
            let encoded = dh1080_encode(&data);
            assert_eq!(dh1080_decode(&encoded).unwrap(), data, "len={}", n);
        }
    }

    #[test]
    fn test_tail_ambiguity_is_lossy() {
        // [4, 1] のエンコードは "BAE"。トリムが 'A' で止まらず最終文字まで
        // 巻き込み、2 バイト目が失われる。ワイヤ互換のため意図的にこのまま
        assert_eq!(dh1080_encode(&[4, 1]), "BAE");
        assert_eq!(dh1080_decode("BAE").unwrap(), [4]);
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(dh1080_decode(""), Err(CodecError::InvalidEncoding));
        assert_eq!(dh1080_decode("x"), Err(CodecError::InvalidEncoding));
        // "AA" は全シンボルがゼロ値でトリム後 2 文字未満になる
        assert_eq!(dh1080_decode("AA"), Err(CodecError::InvalidEncoding));
    }
}
