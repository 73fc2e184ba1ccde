//! AES key schedules.

use crate::{Error, Result};
use aes::{Aes128, Aes192, Aes256};
use cipher::{consts::U16, BlockCipher, BlockClosure, BlockEncrypt, BlockSizeUser, KeyInit};
use core::fmt;

/// AES key size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeySize {
    /// 128-bit key, 10 rounds.
    Aes128,
    /// 192-bit key, 12 rounds.
    Aes192,
    /// 256-bit key, 14 rounds.
    Aes256,
}

impl KeySize {
    /// All key sizes, smallest first.
    pub const ALL: [KeySize; 3] = [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256];

    /// Key size from a length in bits.
    pub fn from_bits(bits: usize) -> Option<Self> {
        match bits {
            128 => Some(Self::Aes128),
            192 => Some(Self::Aes192),
            256 => Some(Self::Aes256),
            _ => None,
        }
    }

    /// Length of the key in bits.
    pub fn bits(self) -> usize {
        match self {
            Self::Aes128 => 128,
            Self::Aes192 => 192,
            Self::Aes256 => 256,
        }
    }
}

/// Expanded AES round keys.
///
/// Immutable once created. A schedule is borrowed by every
/// [`CipherContext`](crate::CipherContext) using it and may be shared
/// between threads.
#[derive(Clone)]
pub enum KeySchedule {
    /// AES-128 round keys.
    Aes128(Aes128),
    /// AES-192 round keys.
    Aes192(Aes192),
    /// AES-256 round keys.
    Aes256(Aes256),
}

impl KeySchedule {
    /// Expand a raw 16, 24 or 32 byte key.
    pub fn expand(raw_key: &[u8]) -> Result<Self> {
        let bits = 8 * raw_key.len();
        let invalid = |_| Error::InvalidKeySize(bits);
        match KeySize::from_bits(bits) {
            Some(KeySize::Aes128) => Aes128::new_from_slice(raw_key).map(Self::Aes128).map_err(invalid),
            Some(KeySize::Aes192) => Aes192::new_from_slice(raw_key).map(Self::Aes192).map_err(invalid),
            Some(KeySize::Aes256) => Aes256::new_from_slice(raw_key).map(Self::Aes256).map_err(invalid),
            None => Err(Error::InvalidKeySize(bits)),
        }
    }

    /// Size of the key this schedule was expanded from.
    pub fn key_size(&self) -> KeySize {
        match self {
            Self::Aes128(_) => KeySize::Aes128,
            Self::Aes192(_) => KeySize::Aes192,
            Self::Aes256(_) => KeySize::Aes256,
        }
    }
}

impl BlockSizeUser for KeySchedule {
    type BlockSize = U16;
}

impl BlockCipher for KeySchedule {}

impl BlockEncrypt for KeySchedule {
    #[inline]
    fn encrypt_with_backend(&self, f: impl BlockClosure<BlockSize = U16>) {
        match self {
            Self::Aes128(c) => c.encrypt_with_backend(f),
            Self::Aes192(c) => c.encrypt_with_backend(f),
            Self::Aes256(c) => c.encrypt_with_backend(f),
        }
    }
}

impl fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeySchedule::{:?} {{ .. }}", self.key_size())
    }
}
