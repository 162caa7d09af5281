//! DH1080 群定数と公開値の検証
//!
//! 1080bit 素数 p と生成元 g=2。部分群の位数 q = (p-1)/2。

use num_bigint::BigUint;
use num_traits::One;

/// 1080bit 素数 p（big-endian、135 バイト）
const P_BYTES: [u8; 135] = [
    0xFB, 0xE1, 0x02, 0x2E, 0x23, 0xD2, 0x13, 0xE8, 0xAC, 0xFA, 0x9A, 0xE8,
    0xB9, 0xDF, 0xAD, 0xA3, 0xEA, 0x6B, 0x7A, 0xC7, 0xA7, 0xB7, 0xE9, 0x5A,
    0xB5, 0xEB, 0x2D, 0xF8, 0x58, 0x92, 0x1F, 0xEA, 0xDE, 0x95, 0xE6, 0xAC,
    0x7B, 0xE7, 0xDE, 0x6A, 0xDB, 0xAB, 0x8A, 0x78, 0x3E, 0x7A, 0xF7, 0xA7,
    0xFA, 0x6A, 0x2B, 0x7B, 0xEB, 0x1E, 0x72, 0xEA, 0xE2, 0xB7, 0x2F, 0x9F,
    0xA2, 0xBF, 0xB2, 0xA2, 0xEF, 0xBE, 0xFA, 0xC8, 0x68, 0xBA, 0xDB, 0x3E,
    0x82, 0x8F, 0xA8, 0xBA, 0xDF, 0xAD, 0xA3, 0xE4, 0xCC, 0x1B, 0xE7, 0xE8,
    0xAF, 0xE8, 0x5E, 0x96, 0x98, 0xA7, 0x83, 0xEB, 0x68, 0xFA, 0x07, 0xA7,
    0x7A, 0xB6, 0xAD, 0x7B, 0xEB, 0x61, 0x8A, 0xCF, 0x9C, 0xA2, 0x89, 0x7E,
    0xB2, 0x8A, 0x61, 0x89, 0xEF, 0xA0, 0x7A, 0xB9, 0x9A, 0x8A, 0x7F, 0xA9,
    0xAE, 0x29, 0x9E, 0xFA, 0x7B, 0xA6, 0x6D, 0xEA, 0xFE, 0xFB, 0xEF, 0xBF,
    0x0B, 0x7D, 0x8B,
];

/// 群パラメータ一式
pub(crate) struct Group {
    /// 素数 p
    pub(crate) p: BigUint,
    /// 部分群の位数 q = (p-1)/2
    pub(crate) q: BigUint,
    /// 生成元 g = 2
    pub(crate) g: BigUint,
}

impl Group {
    pub(crate) fn new() -> Self {
        let p = BigUint::from_bytes_be(&P_BYTES);
        let q = (&p - 1u32) >> 1;
        Group {
            p,
            q,
            g: BigUint::from(2u32),
        }
    }

    /// 生成側の採択条件: 2 <= pub <= p-2 かつ pub^q mod p == 1
    ///
    /// 部分群メンバーシップ検査は RFC 2631 2.1.5 のもの。
    pub(crate) fn acceptable_own_public(&self, public: &BigUint) -> bool {
        self.in_exchange_range(public) && public.modpow(&self.q, &self.p).is_one()
    }

    /// 受信側の検証条件: 1 < pub < p-1 かつ pub^q mod p == 1
    ///
    /// 正規のピアは生成側検査を通った値しか送らないので、
    /// ここで部分群検査まで行っても正当な交換は一切拒否されない。
    pub(crate) fn acceptable_peer_public(&self, public: &BigUint) -> bool {
        self.acceptable_own_public(public)
    }

    fn in_exchange_range(&self, public: &BigUint) -> bool {
        let upper = &self.p - 1u32;
        *public > BigUint::one() && *public < upper
    }
}
