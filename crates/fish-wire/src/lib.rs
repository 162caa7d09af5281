//! # fish-wire
//!
//! FiSH の暗号化メッセージ行のパック/アンパック。
//!
//! ## Wire Format
//!
//! ```text
//! ECB 形式:
//!   "+OK " + CodecA( ECB-encrypt( pad(平文) ) )
//!
//! CBC 形式:
//!   "+OK *" + 標準base64( iv(8バイト乱数) || CBC-encrypt(key, iv, pad(平文)) )
//!
//! 受信時のみ "+OK " の別名として旧プレフィックス "mcps " も受け付ける。
//! ```
//!
//! ## 受信側の寛容さ（仕様として固定）
//!
//! - ECB ペイロードが 12 文字の倍数でない場合、端数は黙って切り捨てて
//!   残りをデコードする（エラーにしない）。
//! - CBC ペイロードの base64 は '=' パディングを補ってからデコードする。
//! - 復号後の暗号文長の端数はゼロパディングで 8 バイト境界に揃える。

#![no_std]
extern crate alloc;

mod error;
mod message;

pub use error::WireError;
pub use message::{pack_cbc, pack_ecb, unpack};

/// 送信時に付けるプレフィックス
pub const PREFIX_OK: &str = "+OK ";

/// 受信時のみ受け付ける旧プレフィックス
pub const PREFIX_MCPS: &str = "mcps ";
