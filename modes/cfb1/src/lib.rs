//! [Cipher Feedback with one bit feedback][1] (CFB-1) mode.
//!
//! Every bit of output costs one full block cipher invocation, so this mode
//! is only useful for interoperating with systems that require it.
//!
//! Bits are processed MSB-first within each byte. The block and stream
//! cipher traits work on whole bytes; [`Cfb1::encrypt_bits`] and
//! [`Cfb1::decrypt_bits`] take an explicit length in bits, which lets a
//! stream end (or pause) in the middle of a byte.
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
    BlockEncryptMut, BlockSizeUser, InnerIvInit, InvalidLength, Iv, IvState, ParBlocksSizeUser,
};
use core::fmt;

/// CFB-1 mode encryptor and decryptor.
#[derive(Clone)]
pub struct Cfb1<C: BlockEncryptMut + BlockCipher> {
    cipher: C,
    iv: Block<C>,
}

impl<C: BlockEncryptMut + BlockCipher> Cfb1<C> {
    /// Encrypt every bit of `buf` in place, keeping the state for the next
    /// call.
    pub fn encrypt_buf(&mut self, buf: &mut [u8]) {
        let (blocks, _) = InOutBuf::from(buf).into_chunks::<U1>();
        self.encrypt_blocks_inout_mut(blocks);
    }

    /// Decrypt every bit of `buf` in place, keeping the state for the next
    /// call.
    pub fn decrypt_buf(&mut self, buf: &mut [u8]) {
        let (blocks, _) = InOutBuf::from(buf).into_chunks::<U1>();
        self.decrypt_blocks_inout_mut(blocks);
    }

    /// Encrypt the first `nbits` bits of `buf` in place.
    ///
    /// Bits past `nbits` are left untouched. Fails if `buf` is shorter than
    /// `nbits` bits.
    pub fn encrypt_bits(&mut self, buf: &mut [u8], nbits: usize) -> Result<(), InvalidLength> {
        self.process_bits(buf, nbits, true)
    }

    /// Decrypt the first `nbits` bits of `buf` in place.
    ///
    /// Bits past `nbits` are left untouched. Fails if `buf` is shorter than
    /// `nbits` bits.
    pub fn decrypt_bits(&mut self, buf: &mut [u8], nbits: usize) -> Result<(), InvalidLength> {
        self.process_bits(buf, nbits, false)
    }

    fn process_bits(&mut self, buf: &mut [u8], nbits: usize, encrypt: bool) -> Result<(), InvalidLength> {
        if nbits > 8 * buf.len() {
            return Err(InvalidLength);
        }
        let (whole, rest) = buf.split_at_mut(nbits / 8);
        if encrypt {
            self.encrypt_buf(whole);
        } else {
            self.decrypt_buf(whole);
        }
        let partial = nbits % 8;
        if partial != 0 {
            rest[0] = process_byte(&mut self.cipher, &mut self.iv, rest[0], partial, encrypt);
        }
        Ok(())
    }
}

impl<C: BlockEncryptMut + BlockCipher> BlockEncryptMut for Cfb1<C> {
    fn encrypt_with_backend_mut(&mut self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        let Self { cipher, iv } = self;
        f.call(&mut Backend {
            cipher,
            iv,
            encrypt: true,
        });
    }
}

impl<C: BlockEncryptMut + BlockCipher> BlockDecryptMut for Cfb1<C> {
    fn decrypt_with_backend_mut(&mut self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        let Self { cipher, iv } = self;
        f.call(&mut Backend {
            cipher,
            iv,
            encrypt: false,
        });
    }
}

impl<C: BlockEncryptMut + BlockCipher> AsyncStreamCipher for Cfb1<C> {}

impl<C: BlockEncryptMut + BlockCipher> BlockSizeUser for Cfb1<C> {
    type BlockSize = U1;
}

impl<C: BlockEncryptMut + BlockCipher> InnerUser for Cfb1<C> {
    type Inner = C;
}

impl<C: BlockEncryptMut + BlockCipher> IvSizeUser for Cfb1<C> {
    type IvSize = C::BlockSize;
}

impl<C: BlockEncryptMut + BlockCipher> InnerIvInit for Cfb1<C> {
    #[inline]
    fn inner_iv_init(cipher: C, iv: &Iv<Self>) -> Self {
        Self {
            cipher,
            iv: iv.clone(),
        }
    }
}

impl<C: BlockEncryptMut + BlockCipher> IvState for Cfb1<C> {
    #[inline]
    fn iv_state(&self) -> Iv<Self> {
        self.iv.clone()
    }
}

impl<C: BlockEncryptMut + BlockCipher> fmt::Debug for Cfb1<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str("Cfb1 { .. }")
    }
}

#[cfg(feature = "zeroize")]
impl<C: BlockEncryptMut + BlockCipher> Drop for Cfb1<C> {
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
        let byte = block.get_in()[0];
        block.get_out()[0] = process_byte(self.cipher, self.iv, byte, 8, self.encrypt);
    }
}

/// Process the `nbits` most significant bits of `byte`.
fn process_byte<C: BlockEncryptMut + BlockCipher>(
    cipher: &mut C,
    iv: &mut Block<C>,
    byte: u8,
    nbits: usize,
    encrypt: bool,
) -> u8 {
    let mut out = byte;
    for i in 0..nbits {
        let shift = 7 - i;
        let bit = (byte >> shift) & 1;
        let mut t = iv.clone();
        cipher.encrypt_block_mut(&mut t);
        let r = bit ^ (t[0] >> 7);
        out = (out & !(1u8 << shift)) | (r << shift);
        shift_in(iv, if encrypt { r } else { bit });
    }
    out
}

#[inline]
fn shift_in(iv: &mut [u8], bit: u8) {
    let n = iv.len();
    for i in 0..n - 1 {
        iv[i] = (iv[i] << 1) | (iv[i + 1] >> 7);
    }
    iv[n - 1] = (iv[n - 1] << 1) | bit;
}
