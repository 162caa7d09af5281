//! # fish-engine
//!
//! FiSH セッションエンジン。ターゲットごとの鍵と暗号状態を管理し、
//! トランスポートの 1 行単位で暗号化・復号・鍵交換をディスパッチする。
//!
//! ## 内部アーキテクチャ
//!
//! ```text
//! Engine
//!   ├── SessionStore
//!   │     ├── 鍵テーブル   (ターゲット → SessionKey + 遅延構築の暗号器)
//!   │     └── 交換テーブル (ターゲット → 進行中の ExchangeContext)
//!   └── 通知フラグ (ターゲットごとの「暗号化中」告知済みフラグ)
//!
//! 受信行 → handle_inbound  → 復号平文 / 交換応答行 / 素通し
//! 送信行 → handle_outbound → 暗号化済みワイヤ行 / 素通し
//! ```
//!
//! ## ターゲット
//!
//! ターゲットは `(スコープ, ピア)` の組。大文字小文字を区別せず、
//! 内部では小文字の `"scope/peer"` に正規化して扱う。
//!
//! ## スレッド安全性
//!
//! すべて同期・非ブロッキング。内部にロックは持たない。ホストが
//! マルチスレッドの場合、同一ターゲットへのアクセスはホスト側で
//! 直列化すること。現在時刻はホストが `now_ms` で渡す。

#![no_std]
extern crate alloc;

mod engine;
mod error;
mod store;

pub use engine::{AnnounceSink, Engine, InboundOutcome, OutboundOutcome};
pub use error::EngineError;
pub use store::{target_key, CipherMode, KeyEntry, SessionStore};

/// 進行中の鍵交換の生存時間（ミリ秒）
///
/// ピアが応答しないまま放置された交換はこの時間で破棄する。
pub const EXCHANGE_TTL_MS: u64 = 300_000;

/// 永続化レコードの CBC モードプレフィックス
pub const RECORD_CBC_PREFIX: &str = "cbc:";
