//! [Cipher Feedback with eight bit feedback][1] (CFB-8) mode.
//!
//! [1]: https://en.wikipedia.org/wiki/Block_cipher_mode_of_operation#CFB-1,_CFB-8,_CFB-64,_CFB-128,_etc.

#![no_std]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/media/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/media/master/logo.svg"
)]
#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub use cipher;

use cipher::{
    consts::U1,
    crypto_common::{InnerUser, IvSizeUser},
    inout::{InOut, InOutBuf},
    AsyncStreamCipher, Block, BlockBackend, BlockCipher, BlockClosure, BlockDecryptMut,
    BlockEncryptMut, BlockSizeUser, InnerIvInit, Iv, IvState, ParBlocksSizeUser,
};
use core::fmt;

/// CFB-8 mode encryptor and decryptor.
///
/// Since it works over one byte blocks, it implements both block-based
/// and slice-based traits. [`Cfb8::encrypt_buf`] and [`Cfb8::decrypt_buf`]
/// keep the state, so input of any length can be fed across any number of
/// calls.
#[derive(Clone)]
pub struct Cfb8<C: BlockEncryptMut + BlockCipher> {
    cipher: C,
    iv: Block<C>,
}

impl<C: BlockEncryptMut + BlockCipher> Cfb8<C> {
    /// Encrypt `buf` in place, keeping the state for the next call.
    pub fn encrypt_buf(&mut self, buf: &mut [u8]) {
        let (blocks, _) = InOutBuf::from(buf).into_chunks::<U1>();
        self.encrypt_blocks_inout_mut(blocks);
    }

    /// Decrypt `buf` in place, keeping the state for the next call.
    pub fn decrypt_buf(&mut self, buf: &mut [u8]) {
        let (blocks, _) = InOutBuf::from(buf).into_chunks::<U1>();
        self.decrypt_blocks_inout_mut(blocks);
    }
}

impl<C: BlockEncryptMut + BlockCipher> BlockEncryptMut for Cfb8<C> {
    fn encrypt_with_backend_mut(&mut self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        let Self { cipher, iv } = self;
        f.call(&mut Backend {
            cipher,
            iv,
            encrypt: true,
        });
    }
}

impl<C: BlockEncryptMut + BlockCipher> BlockDecryptMut for Cfb8<C> {
    fn decrypt_with_backend_mut(&mut self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        let Self { cipher, iv } = self;
        f.call(&mut Backend {
            cipher,
            iv,
            encrypt: false,
        });
    }
}

impl<C: BlockEncryptMut + BlockCipher> AsyncStreamCipher for Cfb8<C> {}

impl<C: BlockEncryptMut + BlockCipher> BlockSizeUser for Cfb8<C> {
    type BlockSize = U1;
}

impl<C: BlockEncryptMut + BlockCipher> InnerUser for Cfb8<C> {
    type Inner = C;
}

impl<C: BlockEncryptMut + BlockCipher> IvSizeUser for Cfb8<C> {
    type IvSize = C::BlockSize;
}

impl<C: BlockEncryptMut + BlockCipher> InnerIvInit for Cfb8<C> {
    #[inline]
    fn inner_iv_init(cipher: C, iv: &Iv<Self>) -> Self {
        Self {
            cipher,
            iv: iv.clone(),
        }
    }
}

impl<C: BlockEncryptMut + BlockCipher> IvState for Cfb8<C> {
    #[inline]
    fn iv_state(&self) -> Iv<Self> {
        self.iv.clone()
    }
}

impl<C: BlockEncryptMut + BlockCipher> fmt::Debug for Cfb8<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str("Cfb8 { .. }")
    }
}

#[cfg(feature = "zeroize")]
impl<C: BlockEncryptMut + BlockCipher> Drop for Cfb8<C> {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.iv.as_mut_slice().zeroize();
    }
}

struct Backend<'a, C: BlockEncryptMut + BlockCipher> {
    cipher: &'a mut C,
    iv: &'a mut Block<C>,
    encrypt: bool,
}

impl<'a, C: BlockEncryptMut + BlockCipher> BlockSizeUser for Backend<'a, C> {
    type BlockSize = U1;
}

impl<'a, C: BlockEncryptMut + BlockCipher> ParBlocksSizeUser for Backend<'a, C> {
    type ParBlocksSize = U1;
}

impl<'a, C: BlockEncryptMut + BlockCipher> BlockBackend for Backend<'a, C> {
    #[inline]
    fn proc_block(&mut self, mut block: InOut<'_, '_, Block<Self>>) {
        let mut t = self.iv.clone();
        self.cipher.encrypt_block_mut(&mut t);
        let input = block.get_in()[0];
        let output = input ^ t[0];
        block.get_out()[0] = output;
        // the ciphertext byte is fed back in both directions
        let r = if self.encrypt { output } else { input };
        let n = self.iv.len();
        self.iv.copy_within(1..n, 0);
        self.iv[n - 1] = r;
    }
}
