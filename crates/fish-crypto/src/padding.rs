//! パディングとストリップ規則
//!
//! ```text
//! 暗号化前: 0x00 を末尾に足して 8 バイト境界へ（揃っていればそのまま）
//! 復号後:   末尾の 0x00 を全て除去 → 残りから改行 0x0A を全位置で除去
//! ```
//!
//! 復号側の改行除去は末尾だけでなく全位置に及ぶ。平文に埋め込まれた
//! 改行は失われるが、これはワイヤ互換のため仕様として固定されている。

use alloc::vec::Vec;

use crate::BLOCK_LEN;

/// メッセージを 8 バイト境界までゼロパディングする
pub fn pad_to_block(msg: &[u8]) -> Vec<u8> {
    let mut out = msg.to_vec();
    let rem = out.len() % BLOCK_LEN;
    if rem != 0 {
        out.resize(out.len() + (BLOCK_LEN - rem), 0);
    }
    out
}

/// 復号後の平文からパディングと改行を除去する
///
/// 末尾の 0x00 を全て落とし、残った平文から 0x0A を位置を問わず除去する。
pub fn strip_plaintext(plain: &[u8]) -> Vec<u8> {
    let end = plain
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    plain[..end].iter().copied().filter(|&b| b != b'\n').collect()
}
