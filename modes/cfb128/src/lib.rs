//! [Cipher feedback][1] (CFB) mode with full block feedback.
//!
//! The mode is defined for single-pass streaming: any number of full blocks
//! may be processed over successive calls to [`Cfb::encrypt_buf`] and
//! [`Cfb::decrypt_buf`], but a trailing partial block ends the stream. Calls
//! made after that fail with [`StreamCipherError`].
//!
//! The block traits (`BlockEncryptMut`, `BlockDecryptMut`) process whole
//! blocks only, and the [`AsyncStreamCipher`] methods consume the mode, so
//! both are usable for one-shot processing of a complete message.
//!
//! [1]: https://en.wikipedia.org/wiki/Block_cipher_mode_of_operation#Cipher_feedback_(CFB)

#![no_std]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/media/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/media/master/logo.svg"
)]
#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub use cipher;

use cipher::{
    consts::{U1, U8},
    crypto_common::{InnerUser, IvSizeUser},
    generic_array::{typenum::Unsigned, GenericArray},
    inout::{InOut, InOutBuf},
    AsyncStreamCipher, Block, BlockBackend, BlockCipher, BlockClosure, BlockDecryptMut,
    BlockEncryptMut, BlockSizeUser, InnerIvInit, Iv, IvState, ParBlocksSizeUser,
    StreamCipherError,
};
use core::fmt;

/// Maximum number of blocks whose keystream [`Cfb::decrypt_par`] generates
/// with a single call into the block cipher.
pub type ParBlocks = U8;

/// CFB mode encryptor and decryptor with full block feedback.
#[derive(Clone)]
pub struct Cfb<C: BlockEncryptMut + BlockCipher> {
    cipher: C,
    iv: Block<C>,
    finished: bool,
}

impl<C: BlockEncryptMut + BlockCipher> Cfb<C> {
    /// Encrypt `buf` in place.
    pub fn encrypt_buf(&mut self, buf: &mut [u8]) -> Result<(), StreamCipherError> {
        self.check()?;
        let (blocks, mut tail) = InOutBuf::from(buf).into_chunks::<C::BlockSize>();
        self.encrypt_blocks_inout_mut(blocks);
        self.apply_tail(tail.get_out());
        Ok(())
    }

    /// Decrypt `buf` in place, one block cipher invocation per block.
    pub fn decrypt_buf(&mut self, buf: &mut [u8]) -> Result<(), StreamCipherError> {
        self.check()?;
        let (blocks, mut tail) = InOutBuf::from(buf).into_chunks::<C::BlockSize>();
        self.decrypt_blocks_inout_mut(blocks);
        self.apply_tail(tail.get_out());
        Ok(())
    }

    /// Decrypt `buf` in place, generating the keystream for up to
    /// [`ParBlocks`] blocks at once.
    ///
    /// Every keystream block of CFB decryption is the encryption of a
    /// ciphertext block already known to the caller, so they can go through
    /// `encrypt_blocks_mut` together and use the cipher's parallel backend.
    /// The output is identical to [`Cfb::decrypt_buf`].
    pub fn decrypt_par(&mut self, buf: &mut [u8]) -> Result<(), StreamCipherError> {
        self.check()?;
        let bs = C::BlockSize::USIZE;
        let mut batches = buf.chunks_exact_mut(bs * ParBlocks::USIZE);
        for batch in &mut batches {
            self.decrypt_batch(batch);
        }
        let rem = batches.into_remainder();
        let (blocks, tail) = rem.split_at_mut(rem.len() - rem.len() % bs);
        if !blocks.is_empty() {
            self.decrypt_batch(blocks);
        }
        self.apply_tail(tail);
        Ok(())
    }

    /// Whether a partial block has ended the stream.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn check(&self) -> Result<(), StreamCipherError> {
        if self.finished {
            Err(StreamCipherError)
        } else {
            Ok(())
        }
    }

    // `blocks` holds between one and `ParBlocks` whole blocks.
    fn decrypt_batch(&mut self, blocks: &mut [u8]) {
        let bs = C::BlockSize::USIZE;
        let n = blocks.len() / bs;
        let mut ks: GenericArray<Block<C>, ParBlocks> = Default::default();
        ks[0] = self.iv.clone();
        for (k, c) in ks[1..n].iter_mut().zip(blocks.chunks_exact(bs)) {
            k.copy_from_slice(c);
        }
        self.iv.copy_from_slice(&blocks[(n - 1) * bs..]);
        self.cipher.encrypt_blocks_mut(&mut ks[..n]);
        for (c, k) in blocks.chunks_exact_mut(bs).zip(ks.iter()) {
            xor(c, k);
        }
    }

    // The keystream for a partial block is truncated; there is no
    // ciphertext block to feed back, so the stream ends here.
    fn apply_tail(&mut self, tail: &mut [u8]) {
        if tail.is_empty() {
            return;
        }
        let mut t = self.iv.clone();
        self.cipher.encrypt_block_mut(&mut t);
        xor(tail, &t[..tail.len()]);
        self.finished = true;
    }
}

impl<C: BlockEncryptMut + BlockCipher> BlockEncryptMut for Cfb<C> {
    fn encrypt_with_backend_mut(&mut self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        let Self { cipher, iv, .. } = self;
        f.call(&mut Backend {
            cipher,
            iv,
            encrypt: true,
        });
    }
}

impl<C: BlockEncryptMut + BlockCipher> BlockDecryptMut for Cfb<C> {
    fn decrypt_with_backend_mut(&mut self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        let Self { cipher, iv, .. } = self;
        f.call(&mut Backend {
            cipher,
            iv,
            encrypt: false,
        });
    }
}

impl<C: BlockEncryptMut + BlockCipher> AsyncStreamCipher for Cfb<C> {}

impl<C: BlockEncryptMut + BlockCipher> BlockSizeUser for Cfb<C> {
    type BlockSize = C::BlockSize;
}

impl<C: BlockEncryptMut + BlockCipher> InnerUser for Cfb<C> {
    type Inner = C;
}

impl<C: BlockEncryptMut + BlockCipher> IvSizeUser for Cfb<C> {
    type IvSize = C::BlockSize;
}

impl<C: BlockEncryptMut + BlockCipher> InnerIvInit for Cfb<C> {
    #[inline]
    fn inner_iv_init(cipher: C, iv: &Iv<Self>) -> Self {
        Self {
            cipher,
            iv: iv.clone(),
            finished: false,
        }
    }
}

impl<C: BlockEncryptMut + BlockCipher> IvState for Cfb<C> {
    #[inline]
    fn iv_state(&self) -> Iv<Self> {
        self.iv.clone()
    }
}

impl<C: BlockEncryptMut + BlockCipher> fmt::Debug for Cfb<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str("Cfb { .. }")
    }
}

#[cfg(feature = "zeroize")]
impl<C: BlockEncryptMut + BlockCipher> Drop for Cfb<C> {
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
    type BlockSize = C::BlockSize;
}

impl<'a, C: BlockEncryptMut + BlockCipher> ParBlocksSizeUser for Backend<'a, C> {
    type ParBlocksSize = U1;
}

impl<'a, C: BlockEncryptMut + BlockCipher> BlockBackend for Backend<'a, C> {
    #[inline]
    fn proc_block(&mut self, mut block: InOut<'_, '_, Block<Self>>) {
        let mut t = self.iv.clone();
        self.cipher.encrypt_block_mut(&mut t);
        let input = block.clone_in();
        let out = block.get_out();
        out.copy_from_slice(&input);
        xor(out, &t);
        // the ciphertext block is fed back in both directions
        if self.encrypt {
            self.iv.copy_from_slice(out);
        } else {
            self.iv.copy_from_slice(&input);
        }
    }
}

#[inline(always)]
fn xor(out: &mut [u8], buf: &[u8]) {
    assert_eq!(out.len(), buf.len());
    for (a, b) in out.iter_mut().zip(buf) {
        *a ^= *b;
    }
}
