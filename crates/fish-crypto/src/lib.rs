//! # fish-crypto
//!
//! Blowfish 暗号プリミティブ実装
//!
//! FiSH (blowcrypt) ワイヤ形式で使う 64bit ブロック暗号 Blowfish と、
//! ECB / CBC モードのヘルパーを実装するクレート。
//! `no_std` + `alloc` 環境で動作する。
//!
//! ## FiSH の鍵と平文の扱い
//!
//! ```text
//! 鍵:
//!   1〜72 バイト。73 バイト以上は先頭 72 バイトに黙って切り詰める。
//!   空の鍵は InvalidKey。
//!
//! 暗号化前のパディング:
//!   平文の末尾に 0x00 を追加して 8 バイト境界に揃える。
//!   既に揃っている場合は何もしない。
//!
//! 復号後のストリップ:
//!   末尾の 0x00 を全て除去し、さらに残った平文から改行 (0x0A) を
//!   位置を問わず全て除去する（ワイヤ互換のための非可逆仕様）。
//! ```

#![no_std]
extern crate alloc;

mod blowfish;
mod consts;
mod error;
mod mode;
mod padding;

pub use blowfish::Blowfish;
pub use error::CipherError;
pub use mode::{cbc_decrypt, cbc_encrypt, ecb_decrypt, ecb_encrypt};
pub use padding::{pad_to_block, strip_plaintext};

/// Blowfish のブロック長（バイト）
pub const BLOCK_LEN: usize = 8;

/// FiSH が受け付ける鍵素材の最大長（バイト）
///
/// 鍵スケジュールの P 配列 XOR フェーズが消費するのはちょうど
/// 18 * 4 = 72 バイト。これより長い鍵は先頭 72 バイトに切り詰める。
pub const MAX_KEY_LEN: usize = 72;
