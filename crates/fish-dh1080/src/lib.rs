//! # fish-dh1080
//!
//! DH1080 鍵交換のコア状態機械。
//!
//! ## DH1080 の概要
//!
//! 1080bit の安全素数群上の Diffie-Hellman。公開値は非標準 base64
//! （`fish-codec` の DH1080 コーデック）でテキスト化して 1 行で交換する。
//!
//! ### キーコンセプト
//!
//! - **ExchangeContext**: 片側の交換状態。秘密指数・公開値・共有秘密を持つ
//! - **INIT / FINISH**: 往復 1 回で完結。開始側が INIT、応答側が FINISH を返す
//! - **CBC ネゴシエーション**: 行末の " CBC" トークンで合意後のモードを決める
//! - **鍵導出**: 共有秘密の big-endian バイト列を SHA-256 → DH1080 base64
//!
//! ## 交換の状態遷移
//!
//! ```text
//! 開始側: AwaitingPeer --INIT送信--> Engaged --FINISH受信--> secret 確定
//! 応答側: AwaitingPeer --INIT受信--> Engaged (secret 確定) --FINISH送信-->
//! ```
//!
//! ## セキュリティ上の注意
//!
//! この交換は何も認証しない。トランスポート上にメッセージを注入できる
//! 攻撃者は、どちらの側にもなりすませる（中間者攻撃が可能）。これは
//! 元プロトコルの仕様であり、互換性のため意図的にそのままにしてある。

#![no_std]
extern crate alloc;

mod error;
mod exchange;
mod group;

pub use error::DhError;
pub use exchange::{ExchangeContext, ExchangeState};

/// 開始側が送る交換開始トークン
pub const CMD_INIT: &str = "DH1080_INIT ";

/// 受信時のみ受け付ける旧形式の開始トークン（CBC 合意込み）
pub const CMD_INIT_CBC: &str = "DH1080_INIT_CBC ";

/// 応答側が返す交換完了トークン
pub const CMD_FINISH: &str = "DH1080_FINISH ";

/// 秘密指数のバイト長（1080bit）
pub const PRIVATE_LEN: usize = 135;

/// 公開値の生成リトライ上限
///
/// 採択率はほぼ 1/2 なので、この回数失敗する確率は約 2^-64。
/// ここまで失敗するのは乱数源の故障と判断して諦める。
pub const KEYGEN_MAX_ATTEMPTS: usize = 64;
