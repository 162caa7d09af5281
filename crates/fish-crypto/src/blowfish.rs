//! Blowfish 本体（鍵スケジュールと 16 ラウンド Feistel）
//!
//! ## ブロック構造
//! ```text
//! 1 ブロック = 8 バイト = (left: u32 BE, right: u32 BE)
//! ```
//!
//! クレート外部の `blowfish` crate を使わないのは意図的。
//! FiSH の鍵素材は 1〜72 バイトで、既存 crate の 4〜56 バイト制限では
//! 互換な暗号文を作れない。

use crate::consts::{P_INIT, S_INIT};
use crate::error::CipherError;
use crate::MAX_KEY_LEN;

/// 鍵展開済みの Blowfish 暗号器
///
/// ECB ではこのインスタンスをキャッシュして使い回せる
/// （ブロック演算自体は状態を持たない）。
/// CBC のチェーン状態はモード関数側がローカルに持つ。
#[derive(Clone, Debug)]
pub struct Blowfish {
    /// サブ鍵 P 配列（鍵混合済み）
    p: [u32; 18],
    /// S ボックス（鍵混合済み）
    s: [[u32; 256]; 4],
}

impl Blowfish {
    /// 鍵素材から Blowfish を構築する
    ///
    /// # 引数
    /// - `key`: 1 バイト以上の鍵素材。72 バイト超は先頭 72 バイトに切り詰める
    ///
    /// # エラー
    /// - `CipherError::InvalidKey`: 鍵が空
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.is_empty() {
            return Err(CipherError::InvalidKey);
        }
        let key = if key.len() > MAX_KEY_LEN {
            &key[..MAX_KEY_LEN]
        } else {
            key
        };

        let mut bf = Blowfish {
            p: P_INIT,
            s: S_INIT,
        };

        // P 配列に鍵を循環 XOR する（4 バイトずつ big-endian で詰める）
        let mut k = 0usize;
        for p in bf.p.iter_mut() {
            let mut word = 0u32;
            for _ in 0..4 {
                word = (word << 8) | u32::from(key[k % key.len()]);
                k += 1;
            }
            *p ^= word;
        }

        // ゼロブロックを繰り返し暗号化して P と S を置き換える
        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..18).step_by(2) {
            let (nl, nr) = bf.encrypt_words(l, r);
            bf.p[i] = nl;
            bf.p[i + 1] = nr;
            l = nl;
            r = nr;
        }
        for box_i in 0..4 {
            for i in (0..256).step_by(2) {
                let (nl, nr) = bf.encrypt_words(l, r);
                bf.s[box_i][i] = nl;
                bf.s[box_i][i + 1] = nr;
                l = nl;
                r = nr;
            }
        }

        Ok(bf)
    }

    /// 1 ブロックをワード対で暗号化する
    pub fn encrypt_words(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        for i in 0..16 {
            l ^= self.p[i];
            r ^= self.round_f(l);
            core::mem::swap(&mut l, &mut r);
        }
        core::mem::swap(&mut l, &mut r);
        r ^= self.p[16];
        l ^= self.p[17];
        (l, r)
    }

    /// 1 ブロックをワード対で復号する（サブ鍵を逆順に適用）
    pub fn decrypt_words(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        for i in (2..18).rev() {
            l ^= self.p[i];
            r ^= self.round_f(l);
            core::mem::swap(&mut l, &mut r);
        }
        core::mem::swap(&mut l, &mut r);
        r ^= self.p[1];
        l ^= self.p[0];
        (l, r)
    }

    /// ラウンド関数 F(x) = ((S0[a] + S1[b]) ^ S2[c]) + S3[d] (mod 2^32)
    #[inline]
    fn round_f(&self, x: u32) -> u32 {
        let a = self.s[0][(x >> 24) as usize];
        let b = self.s[1][((x >> 16) & 0xFF) as usize];
        let c = self.s[2][((x >> 8) & 0xFF) as usize];
        let d = self.s[3][(x & 0xFF) as usize];
        (a.wrapping_add(b) ^ c).wrapping_add(d)
    }

    /// 8 バイトブロックを暗号化する
    pub fn encrypt_block(&self, block: &[u8; 8]) -> [u8; 8] {
        let (l, r) = split_block(block);
        let (l, r) = self.encrypt_words(l, r);
        join_block(l, r)
    }

    /// 8 バイトブロックを復号する
    pub fn decrypt_block(&self, block: &[u8; 8]) -> [u8; 8] {
        let (l, r) = split_block(block);
        let (l, r) = self.decrypt_words(l, r);
        join_block(l, r)
    }
}

/// 8 バイトブロックを big-endian の (left, right) に分解する
#[inline]
fn split_block(block: &[u8; 8]) -> (u32, u32) {
    let l = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let r = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    (l, r)
}

/// (left, right) を 8 バイトブロックに結合する
#[inline]
fn join_block(l: u32, r: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&l.to_be_bytes());
    out[4..].copy_from_slice(&r.to_be_bytes());
    out
}
