//! # fish-codec
//!
//! FiSH ワイヤ形式の 2 種類の非標準 base64 実装。
//!
//! ## 2 つのコーデックは統合しない
//!
//! アルファベットもビット詰め方向も異なる独立した形式で、ワイヤ互換は
//! それぞれを正確に再現することに依存する。共通化せず別実装のまま保つ。
//!
//! ```text
//! Codec A (blowcrypt):
//!   アルファベット "./0-9a-zA-Z"
//!   8 バイト入力チャンク ↔ 12 文字出力チャンク
//!   各 32bit ワードの下位 6bit から順に取り出す（ワード内 LSB-first）
//!   ECB 形式のペイロード専用
//!
//! Codec B (DH1080):
//!   アルファベット "A-Za-z0-9+/"
//!   MSB-first のビットストリームを 6bit ずつ切り出す可変長形式
//!   パディング文字なし。入力長が 3 の倍数のとき余分な 'A' を 1 文字出す
//!   鍵交換の公開値と導出鍵素材専用
//! ```

#![no_std]
extern crate alloc;

mod blowcrypt;
mod dh1080;
mod error;

pub use blowcrypt::{blowcrypt_decode, blowcrypt_encode};
pub use dh1080::{dh1080_decode, dh1080_encode};
pub use error::CodecError;
