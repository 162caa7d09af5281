//! 行ディスパッチ
//!
//! トランスポートから渡される 1 行を見て、復号・鍵交換・素通しの
//! いずれかに振り分ける。ターゲットの暗号化状態が変わったときだけ
//! `AnnounceSink` に通知する。

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use fish_dh1080::{ExchangeContext, CMD_FINISH, CMD_INIT, CMD_INIT_CBC};
use fish_wire::{PREFIX_MCPS, PREFIX_OK};

use crate::error::EngineError;
use crate::store::{target_key, SessionStore};

/// 暗号化状態の変化通知先
///
/// エンジンはターゲットごとに「暗号化中」を告知済みかを覚えていて、
/// 状態が変わった最初の 1 回だけ呼ぶ。実装はホスト側（画面表示など）。
pub trait AnnounceSink {
    /// ターゲットとのやり取りが暗号化されるようになった
    fn encrypted(&mut self, target: &str);
    /// ターゲットとのやり取りが暗号化されなくなった
    fn unencrypted(&mut self, target: &str);
}

/// 受信行の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// 復号された平文
    Decrypted(Vec<u8>),
    /// 鍵交換を処理して鍵を設定した。`reply` は送り返すべき FINISH 行（応答側のみ）
    KeyExchanged { reply: Option<String> },
    /// エンジンの対象外の行。元の行をそのまま使う
    Passthrough,
}

/// 送信行の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundOutcome {
    /// 暗号化済みワイヤ行
    Encrypted(String),
    /// 鍵が無いのでそのまま送る
    Passthrough,
}

/// FiSH セッションエンジン
///
/// セッションストアと告知済みフラグを持つ。1 インスタンスを
/// ホストが所有し、行ごとに handle_inbound / handle_outbound を呼ぶ。
pub struct Engine {
    store: SessionStore,
    /// 「暗号化中」を告知済みのターゲット
    announced: BTreeSet<String>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            store: SessionStore::new(),
            announced: BTreeSet::new(),
        }
    }

    /// コマンド操作（set/remove/exchange/list）用のストア参照
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// 受信行を処理する
    ///
    /// - `DH1080_FINISH`: 進行中の交換があれば完了させ、鍵を設定する
    /// - `DH1080_INIT` / 旧 `DH1080_INIT_CBC`: 応答側として FINISH を
    ///   組み立て、導出した鍵を即座に設定する
    /// - `+OK ` / `mcps `: 鍵があれば復号する。復号失敗は未暗号化を
    ///   通知した上でエラーとして返す（黙って握り潰さない）
    /// - それ以外: 未暗号化を通知して素通し
    pub fn handle_inbound<S: AnnounceSink>(
        &mut self,
        scope: &str,
        peer: &str,
        line: &str,
        now_ms: u64,
        sink: &mut S,
    ) -> Result<InboundOutcome, EngineError> {
        let key = target_key(scope, peer);
        self.store.evict_stale_exchanges(now_ms);

        if line.starts_with(CMD_FINISH) {
            if let Some(ctx) = self.store.exchange_mut(&key) {
                if ctx.unpack_inbound(line).is_err() {
                    self.mark_unencrypted(&key, sink);
                    return Ok(InboundOutcome::Passthrough);
                }
                let material = ctx.derive_session_key()?;
                let cbc = ctx.negotiates_cbc();
                self.store.drop_exchange(&key);
                self.store.install_derived(&key, &material, cbc);
                return Ok(InboundOutcome::KeyExchanged { reply: None });
            }
            // 進行中の交換が無い FINISH は下の素通し扱いに落ちる
        } else if line.starts_with(CMD_INIT) || line.starts_with(CMD_INIT_CBC) {
            let mut ctx = ExchangeContext::new(true)?;
            if ctx.unpack_inbound(line).is_err() {
                self.mark_unencrypted(&key, sink);
                return Ok(InboundOutcome::Passthrough);
            }
            let reply = ctx.pack_outbound();
            let material = ctx.derive_session_key()?;
            // こちらから開始した交換が進行中でも、相手の INIT を優先する
            self.store.drop_exchange(&key);
            self.store.install_derived(&key, &material, ctx.negotiates_cbc());
            return Ok(InboundOutcome::KeyExchanged { reply: Some(reply) });
        } else if line.starts_with(PREFIX_OK) || line.starts_with(PREFIX_MCPS) {
            if !self.store.contains(&key) {
                self.mark_unencrypted(&key, sink);
                return Ok(InboundOutcome::Passthrough);
            }
            return match self.store.decrypt(&key, line) {
                Ok(clean) => {
                    self.mark_encrypted(&key, sink);
                    Ok(InboundOutcome::Decrypted(clean))
                }
                Err(e) => {
                    self.mark_unencrypted(&key, sink);
                    Err(e)
                }
            };
        }

        self.mark_unencrypted(&key, sink);
        Ok(InboundOutcome::Passthrough)
    }

    /// 送信行を処理する
    ///
    /// 鍵があればセッションのモードで暗号化し、無ければ素通し。
    pub fn handle_outbound<S: AnnounceSink>(
        &mut self,
        scope: &str,
        peer: &str,
        line: &str,
        sink: &mut S,
    ) -> Result<OutboundOutcome, EngineError> {
        let key = target_key(scope, peer);
        if !self.store.contains(&key) {
            self.mark_unencrypted(&key, sink);
            return Ok(OutboundOutcome::Passthrough);
        }
        let wire = self.store.encrypt(&key, line.as_bytes())?;
        self.mark_encrypted(&key, sink);
        Ok(OutboundOutcome::Encrypted(wire))
    }

    fn mark_encrypted<S: AnnounceSink>(&mut self, key: &str, sink: &mut S) {
        if self.announced.insert(String::from(key)) {
            sink.encrypted(key);
        }
    }

    fn mark_unencrypted<S: AnnounceSink>(&mut self, key: &str, sink: &mut S) {
        if self.announced.remove(key) {
            sink.unencrypted(key);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
