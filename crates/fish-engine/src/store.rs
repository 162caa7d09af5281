//! セッションストア
//!
//! ターゲットごとの SessionKey・暗号器キャッシュ・進行中の鍵交換を持つ。
//! グローバル状態は持たず、ホストがストア（を包む Engine）を所有する。

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use fish_crypto::{Blowfish, MAX_KEY_LEN};
use fish_dh1080::ExchangeContext;
use fish_wire::{pack_cbc, pack_ecb, unpack};

use crate::error::EngineError;
use crate::{EXCHANGE_TTL_MS, RECORD_CBC_PREFIX};

/// `(スコープ, ピア)` を正規化済みの複合キーにする
///
/// 大文字小文字を区別しないため、小文字の `"scope/peer"` に揃える。
pub fn target_key(scope: &str, peer: &str) -> String {
    let mut key = String::with_capacity(scope.len() + peer.len() + 1);
    key.push_str(scope);
    key.push('/');
    key.push_str(peer);
    key.to_lowercase()
}

/// セッション鍵の暗号モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    Ecb,
    Cbc,
}

/// 鍵一覧・設定表示用のエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// 正規化済み複合キー
    pub target: String,
    /// 鍵素材（最大 72 バイト）
    pub material: String,
    /// 暗号モード
    pub mode: CipherMode,
}

impl KeyEntry {
    /// 永続化レコード形式（CBC なら `cbc:` プレフィックス付き）
    pub fn record(&self) -> String {
        match self.mode {
            CipherMode::Cbc => {
                let mut rec = String::from(RECORD_CBC_PREFIX);
                rec.push_str(&self.material);
                rec
            }
            CipherMode::Ecb => self.material.clone(),
        }
    }
}

/// 1 ターゲット分のセッション状態
struct Session {
    material: String,
    mode: CipherMode,
    /// 遅延構築される ECB 用暗号器。鍵の変更・削除で無効化する
    cipher: Option<Blowfish>,
}

impl Session {
    /// 暗号器を（未構築なら構築して）使える状態にする
    fn ensure_cipher(&mut self) -> Result<(), EngineError> {
        if self.cipher.is_none() {
            self.cipher = Some(Blowfish::new(self.material.as_bytes())?);
        }
        Ok(())
    }
}

/// 進行中の鍵交換
struct PendingExchange {
    ctx: ExchangeContext,
    /// 作成時刻（ミリ秒）。TTL 失効判定に使う
    created_ms: u64,
}

/// セッションストア
///
/// 鍵テーブルと交換テーブルの両方を持つ。1 ターゲットにつき
/// SessionKey は最大 1 つ、進行中の交換も最大 1 つ。
pub struct SessionStore {
    sessions: BTreeMap<String, Session>,
    exchanges: BTreeMap<String, PendingExchange>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: BTreeMap::new(),
            exchanges: BTreeMap::new(),
        }
    }

    /// ターゲットに鍵を設定する
    ///
    /// `record` 先頭の `cbc:` プレフィックスでモードを指定する。
    /// 鍵素材は 72 バイトに黙って切り詰める。既存の鍵は置き換え、
    /// キャッシュ済み暗号器は捨てる。
    pub fn set_key(&mut self, scope: &str, peer: &str, record: &str) -> KeyEntry {
        let key = target_key(scope, peer);
        let (mode, material) = parse_record(record);
        let material = truncate_material(material).to_string();

        let entry = KeyEntry {
            target: key.clone(),
            material: material.clone(),
            mode,
        };
        self.sessions.insert(
            key,
            Session {
                material,
                mode,
                cipher: None,
            },
        );
        entry
    }

    /// 永続化レコードから鍵を復元する（設定ロード用）
    pub fn load_record(&mut self, scope: &str, peer: &str, record: &str) -> KeyEntry {
        self.set_key(scope, peer, record)
    }

    /// ターゲットの鍵を削除する
    ///
    /// 暗号器キャッシュも一緒に落ちる。未設定なら `NotFound`。
    pub fn remove_key(&mut self, scope: &str, peer: &str) -> Result<(), EngineError> {
        let key = target_key(scope, peer);
        self.sessions
            .remove(&key)
            .map(|_| ())
            .ok_or(EngineError::NotFound)
    }

    /// ターゲットに鍵が設定されているか
    pub fn has_key(&self, scope: &str, peer: &str) -> bool {
        self.sessions.contains_key(&target_key(scope, peer))
    }

    /// 鍵一覧（複合キー順）
    pub fn list(&self) -> Vec<KeyEntry> {
        self.sessions
            .iter()
            .map(|(target, s)| KeyEntry {
                target: target.clone(),
                material: s.material.clone(),
                mode: s.mode,
            })
            .collect()
    }

    /// ターゲットとの鍵交換を開始し、送信すべき INIT 行を返す
    ///
    /// 進行中の交換があれば新しいコンテキストで置き換える。
    pub fn begin_exchange(
        &mut self,
        scope: &str,
        peer: &str,
        cbc: bool,
        now_ms: u64,
    ) -> Result<String, EngineError> {
        let key = target_key(scope, peer);
        let mut ctx = ExchangeContext::new(cbc)?;
        let line = ctx.pack_outbound();
        self.exchanges
            .insert(key, PendingExchange { ctx, created_ms: now_ms });
        Ok(line)
    }

    /// TTL を過ぎた進行中の交換を破棄し、破棄した数を返す
    pub fn evict_stale_exchanges(&mut self, now_ms: u64) -> usize {
        let before = self.exchanges.len();
        self.exchanges
            .retain(|_, ex| now_ms.saturating_sub(ex.created_ms) < EXCHANGE_TTL_MS);
        before - self.exchanges.len()
    }

    /// 交換完了で導出された鍵を設定する（暗号器キャッシュも無効化）
    pub(crate) fn install_derived(&mut self, key: &str, material: &str, cbc: bool) {
        let material = truncate_material(material).to_string();
        self.sessions.insert(
            key.to_string(),
            Session {
                material,
                mode: if cbc { CipherMode::Cbc } else { CipherMode::Ecb },
                cipher: None,
            },
        );
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    pub(crate) fn exchange_mut(&mut self, key: &str) -> Option<&mut ExchangeContext> {
        self.exchanges.get_mut(key).map(|ex| &mut ex.ctx)
    }

    pub(crate) fn drop_exchange(&mut self, key: &str) {
        self.exchanges.remove(key);
    }

    /// 受信行を復号する
    pub(crate) fn decrypt(&mut self, key: &str, line: &str) -> Result<Vec<u8>, EngineError> {
        let session = self.sessions.get_mut(key).ok_or(EngineError::NotFound)?;
        session.ensure_cipher()?;
        let Session { material, cipher, .. } = session;
        let cipher = cipher.as_ref().ok_or(EngineError::InvalidKey)?;
        Ok(unpack(line, cipher, material.as_bytes())?)
    }

    /// 平文をワイヤ行に暗号化する（モードはセッション鍵に従う）
    pub(crate) fn encrypt(&mut self, key: &str, msg: &[u8]) -> Result<String, EngineError> {
        let session = self.sessions.get_mut(key).ok_or(EngineError::NotFound)?;
        match session.mode {
            CipherMode::Cbc => Ok(pack_cbc(session.material.as_bytes(), msg)?),
            CipherMode::Ecb => {
                session.ensure_cipher()?;
                let Session { cipher, .. } = session;
                let cipher = cipher.as_ref().ok_or(EngineError::InvalidKey)?;
                Ok(pack_ecb(cipher, msg))
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::new()
    }
}

/// レコードを (モード, 鍵素材) に分解する
fn parse_record(record: &str) -> (CipherMode, &str) {
    match record.strip_prefix(RECORD_CBC_PREFIX) {
        Some(rest) => (CipherMode::Cbc, rest),
        None => (CipherMode::Ecb, record),
    }
}

/// 鍵素材を 72 バイトに切り詰める（UTF-8 境界は壊さない）
///
/// 72 バイト目がマルチバイト文字の途中に落ちる場合は直前の文字境界まで
/// 戻るため、保存される素材が 72 バイト未満になることがある。そのとき
/// バイト単位で 72 バイトちょうどに切り詰めるピアとは異なる鍵で暗号化
/// することになる。交換で導出される鍵は ASCII 43 文字なのでこの分岐には
/// 入らない。手動設定の鍵で相互運用する場合は 72 バイト以内の素材を使う。
fn truncate_material(material: &str) -> &str {
    if material.len() <= MAX_KEY_LEN {
        return material;
    }
    let mut end = MAX_KEY_LEN;
    while !material.is_char_boundary(end) {
        end -= 1;
    }
    &material[..end]
}
