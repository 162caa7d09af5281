//! DH1080 交換コンテキスト
//!
//! 片側分の交換状態を持ち、INIT/FINISH 行のパック・アンパックと
//! セッション鍵の導出を担当する。

use alloc::string::String;
use alloc::vec::Vec;

use fish_codec::{dh1080_decode, dh1080_encode};
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};

use crate::error::DhError;
use crate::group::Group;
use crate::{CMD_FINISH, CMD_INIT, CMD_INIT_CBC, KEYGEN_MAX_ATTEMPTS, PRIVATE_LEN};

/// 交換の進行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// まだ何も送受信していない
    AwaitingPeer,
    /// INIT を送った、または受け取った（以後は FINISH のみ受け付ける）
    Engaged,
}

/// DH1080 交換コンテキスト（片側分）
///
/// 共有秘密の確定は `secret != 0` で判定する。開始側は FINISH を
/// 受け取るまで、`derive_session_key` が `SecretNotReady` を返す。
pub struct ExchangeContext {
    group: Group,
    private: BigUint,
    public: BigUint,
    secret: BigUint,
    state: ExchangeState,
    cbc: bool,
}

impl ExchangeContext {
    /// 新しい交換コンテキストを生成する
    ///
    /// 秘密指数は 135 バイト (1080bit) の乱数。公開値が
    /// 2 <= pub <= p-2 かつ部分群メンバーになるまで引き直す。
    /// 採択率は約 1/2 なので通常は 1〜2 回で決まる。
    pub fn new(cbc: bool) -> Result<Self, DhError> {
        let group = Group::new();
        for _ in 0..KEYGEN_MAX_ATTEMPTS {
            let mut buf = [0u8; PRIVATE_LEN];
            getrandom::getrandom(&mut buf).map_err(|_| DhError::KeygenFailure)?;
            let private = BigUint::from_bytes_be(&buf);
            let public = group.g.modpow(&private, &group.p);
            if group.acceptable_own_public(&public) {
                return Ok(ExchangeContext {
                    group,
                    private,
                    public,
                    secret: BigUint::zero(),
                    state: ExchangeState::AwaitingPeer,
                    cbc,
                });
            }
        }
        Err(DhError::KeygenFailure)
    }

    /// この交換が CBC モードの鍵を合意するか
    pub fn negotiates_cbc(&self) -> bool {
        self.cbc
    }

    /// 現在の進行状態
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// 送信する交換行を組み立てる
    ///
    /// 最初の送信なら `DH1080_INIT`、以後（応答側を含む）は
    /// `DH1080_FINISH`。公開値は big-endian バイト列を DH1080 base64 で
    /// テキスト化し、CBC 合意なら " CBC" を末尾に付ける。
    pub fn pack_outbound(&mut self) -> String {
        let cmd = if self.state == ExchangeState::AwaitingPeer {
            self.state = ExchangeState::Engaged;
            CMD_INIT
        } else {
            CMD_FINISH
        };
        let mut line = String::from(cmd);
        line.push_str(&dh1080_encode(&self.public.to_bytes_be()));
        if self.cbc {
            line.push_str(" CBC");
        }
        line
    }

    /// 受信した交換行を処理し、共有秘密を計算する
    ///
    /// - 未着手なら `DH1080_INIT` / 旧形式 `DH1080_INIT_CBC` のみ受け付ける
    /// - INIT 送受信後は `DH1080_FINISH` のみ受け付ける
    /// - 公開値は範囲検査 (1 < pub < p-1) と部分群検査の両方を通す
    pub fn unpack_inbound(&mut self, msg: &str) -> Result<(), DhError> {
        if !msg.starts_with("DH1080_") {
            return Err(DhError::InvalidMessage);
        }

        match self.state {
            ExchangeState::AwaitingPeer => {
                let (payload, legacy_cbc) = if let Some(rest) = msg.strip_prefix(CMD_INIT) {
                    (rest, false)
                } else if let Some(rest) = msg.strip_prefix(CMD_INIT_CBC) {
                    (rest, true)
                } else {
                    return Err(DhError::InvalidMessage);
                };
                // 検証より先に状態を進める（元プロトコルの挙動に合わせる）
                self.state = ExchangeState::Engaged;

                let (public, trailing) = parse_payload(payload)?;
                self.accept_peer_public(&public)?;
                self.cbc = legacy_cbc || trailing.iter().any(|t| *t == "CBC");
                Ok(())
            }
            ExchangeState::Engaged => {
                let payload = msg
                    .strip_prefix(CMD_FINISH)
                    .ok_or(DhError::InvalidMessage)?;

                let (public, trailing) = parse_payload(payload)?;
                self.accept_peer_public(&public)?;
                self.cbc = trailing.iter().any(|t| *t == "CBC");
                Ok(())
            }
        }
    }

    /// セッション鍵を導出する
    ///
    /// SHA-256(共有秘密の big-endian バイト列) を DH1080 base64 で
    /// テキスト化したもの。両側で同一の文字列になる。
    pub fn derive_session_key(&self) -> Result<String, DhError> {
        if self.secret.is_zero() {
            return Err(DhError::SecretNotReady);
        }
        let digest = Sha256::digest(self.secret.to_bytes_be());
        Ok(dh1080_encode(digest.as_slice()))
    }

    fn accept_peer_public(&mut self, public: &BigUint) -> Result<(), DhError> {
        if !self.group.acceptable_peer_public(public) {
            return Err(DhError::InvalidMessage);
        }
        self.secret = public.modpow(&self.private, &self.group.p);
        Ok(())
    }
}

/// 交換行のペイロードを (公開値, 後続トークン列) に分解する
fn parse_payload(payload: &str) -> Result<(BigUint, Vec<&str>), DhError> {
    let mut tokens = payload.split(' ');
    let public_raw = tokens.next().ok_or(DhError::InvalidMessage)?;
    let raw = dh1080_decode(public_raw).map_err(|_| DhError::InvalidMessage)?;
    Ok((BigUint::from_bytes_be(&raw), tokens.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    const A_PRIV_HEX: &str = "991974add09faa4e309ed463a81eeacd6f3b557fa8aff4e13c1c4f57f16613072d7862274154ce5428523a821f845db581a30cbfda06ae18b4788d83a962acdd0cbe2be07d0a4b30fa789f13d91aceae89e4f5896e1ce08b0c9faa8f199eea9d74ce4c9b1df1e0394db58dbc8bf4e5b2fd2db2f95774a4851b1b5593d7550d4800fca20b394918";
    const B_PRIV_HEX: &str = "70e998d66020637f2a514315df18c9c7df98a41910e9fca6355eeb7d44319d81672490b58da829a3d827ba3252548989d0d7c2abe47593492fcc5a379989141f6ddc977cc3938de156aa03c4271d87b47d8552e06134f4724e6c5ac160287b20240ddfeafd36cd02c83fc5d565bb554b42ad5afeb3082845b87ffc6d95e72c67a6bf787c82f67a";
    const A_PUB_B64: &str = "mOuf3wKXS5L6BfGkpLE0Dwz4L5/5A/U9YV4/c12fbqjaeqprN5ZyUjkBZjXy6tef/N53G3m0PSP0RVlrWPs+o1DwNPpWLtu4GX1sonPZiumm6HqXIDS87EI9fOiy6stUNLSJjQ+jq73azT1tetKw/Ek4GU94q3unLp6JAFwqe4McD/pq9Xm/A";
    const B_PUB_B64: &str = "38io/i09fN1jaaMdNeQNVhB9wrK00doVbSxV4bqW6MQku5Vy3bL+9shAzwYe0B+jAJWiLglZJDtl2j5ecIwvVq2k4HNmU6JQeZqfouaM6BpfjshElcv7WsTD3HevdZJdhZyJsohV8SHWvCveBsQ4dpLPxkfyTwybJxsJinj8b9onz/9RmbqpA";
    const SESSION_KEY: &str = "bEomCqzvXrmO5mjyw4z8bOz34b3CRigkKF5upvIMSO4";

    fn fixed_ctx(priv_hex: &str, cbc: bool) -> ExchangeContext {
        let group = Group::new();
        let private = BigUint::parse_bytes(priv_hex.as_bytes(), 16).unwrap();
        let public = group.g.modpow(&private, &group.p);
        assert!(group.acceptable_own_public(&public));
        ExchangeContext {
            group,
            private,
            public,
            secret: BigUint::zero(),
            state: ExchangeState::AwaitingPeer,
            cbc,
        }
    }

    #[test]
    fn test_pack_init_known_vector() {
        let mut a = fixed_ctx(A_PRIV_HEX, true);
        let line = a.pack_outbound();
        assert_eq!(line, format!("DH1080_INIT {} CBC", A_PUB_B64));
        assert_eq!(a.state(), ExchangeState::Engaged);
    }

    #[test]
    fn test_initiator_side_known_vector() {
        let mut a = fixed_ctx(A_PRIV_HEX, true);
        let _ = a.pack_outbound();
        a.unpack_inbound(&format!("DH1080_FINISH {} CBC", B_PUB_B64))
            .unwrap();
        assert!(a.negotiates_cbc());
        assert_eq!(a.derive_session_key().unwrap(), SESSION_KEY);
    }

    #[test]
    fn test_responder_side_known_vector() {
        let mut b = fixed_ctx(B_PRIV_HEX, true);
        b.unpack_inbound(&format!("DH1080_INIT {}", A_PUB_B64))
            .unwrap();
        // INIT に CBC トークンが無ければ合意は ECB に倒れる
        assert!(!b.negotiates_cbc());
        let reply = b.pack_outbound();
        assert_eq!(reply, format!("DH1080_FINISH {}", B_PUB_B64));
        assert_eq!(b.derive_session_key().unwrap(), SESSION_KEY);
    }

    #[test]
    fn test_legacy_init_cbc_token() {
        let mut b = fixed_ctx(B_PRIV_HEX, false);
        b.unpack_inbound(&format!("DH1080_INIT_CBC {}", A_PUB_B64))
            .unwrap();
        assert!(b.negotiates_cbc(), "旧形式トークンでも CBC 合意になるはず");
    }

    #[test]
    fn test_full_handshake_with_random_keys() {
        let mut a = ExchangeContext::new(true).unwrap();
        let mut b = ExchangeContext::new(true).unwrap();
        let init = a.pack_outbound();
        b.unpack_inbound(&init).unwrap();
        let finish = b.pack_outbound();
        a.unpack_inbound(&finish).unwrap();
        assert_eq!(
            a.derive_session_key().unwrap(),
            b.derive_session_key().unwrap(),
            "両側で同一のセッション鍵に到達するはず"
        );
        assert!(a.negotiates_cbc() && b.negotiates_cbc());
    }

    #[test]
    fn test_derive_before_completion_fails() {
        let mut a = fixed_ctx(A_PRIV_HEX, true);
        assert_eq!(a.derive_session_key(), Err(DhError::SecretNotReady));
        let _ = a.pack_outbound();
        // INIT を送っただけでは秘密は未確定
        assert_eq!(a.derive_session_key(), Err(DhError::SecretNotReady));
    }

    #[test]
    fn test_rejects_foreign_prefix() {
        let mut a = fixed_ctx(A_PRIV_HEX, true);
        assert_eq!(
            a.unpack_inbound("hello world"),
            Err(DhError::InvalidMessage)
        );
    }

    #[test]
    fn test_rejects_finish_before_init() {
        let mut a = fixed_ctx(A_PRIV_HEX, true);
        assert_eq!(
            a.unpack_inbound(&format!("DH1080_FINISH {}", B_PUB_B64)),
            Err(DhError::InvalidMessage)
        );
    }

    #[test]
    fn test_rejects_second_init() {
        let mut b = fixed_ctx(B_PRIV_HEX, true);
        b.unpack_inbound(&format!("DH1080_INIT {}", A_PUB_B64))
            .unwrap();
        assert_eq!(
            b.unpack_inbound(&format!("DH1080_INIT {}", A_PUB_B64)),
            Err(DhError::InvalidMessage)
        );
    }

    #[test]
    fn test_rejects_out_of_range_public() {
        // p-1 は範囲検査に落ちる
        let group = Group::new();
        let pm1 = (&group.p - 1u32).to_bytes_be();
        let line = format!("DH1080_INIT {}", dh1080_encode(&pm1));
        let mut b = fixed_ctx(B_PRIV_HEX, true);
        assert_eq!(b.unpack_inbound(&line), Err(DhError::InvalidMessage));
    }

    #[test]
    fn test_rejects_non_subgroup_public() {
        // 5 は範囲検査は通るが部分群検査に落ちる
        let line = format!("DH1080_INIT {}", dh1080_encode(&[5u8]));
        let mut b = fixed_ctx(B_PRIV_HEX, true);
        assert_eq!(b.unpack_inbound(&line), Err(DhError::InvalidMessage));
    }

    #[test]
    fn test_rejects_undecodable_public() {
        let mut b = fixed_ctx(B_PRIV_HEX, true);
        assert_eq!(
            b.unpack_inbound("DH1080_INIT A"),
            Err(DhError::InvalidMessage)
        );
    }

    #[test]
    fn test_keygen_produces_valid_pair() {
        let ctx = ExchangeContext::new(false).unwrap();
        assert!(ctx.group.acceptable_own_public(&ctx.public));
        assert!(!ctx.negotiates_cbc());
        assert_eq!(ctx.state(), ExchangeState::AwaitingPeer);
        // 公開値のテキスト化が復号で元に戻ること
        let encoded = dh1080_encode(&ctx.public.to_bytes_be());
        let decoded = dh1080_decode(&encoded).unwrap();
        assert_eq!(BigUint::from_bytes_be(&decoded), ctx.public);
    }

    #[test]
    fn test_session_key_is_printable_and_stable_length() {
        // SHA-256 の 32 バイトは DH1080 base64 で常に 43 文字
        let mut a = fixed_ctx(A_PRIV_HEX, true);
        let _ = a.pack_outbound();
        a.unpack_inbound(&format!("DH1080_FINISH {}", B_PUB_B64))
            .unwrap();
        let key = a.derive_session_key().unwrap();
        assert_eq!(key.len(), 43);
        assert!(key.is_ascii());
    }
}
