//! AES in [Cipher Feedback][1] (CFB) mode with full block, eight bit and one
//! bit feedback.
//!
//! An engine is selected per key size and feedback width from a registry of
//! reference and hardware-accelerated implementations. The registry is built
//! once, on first use, from runtime CPU feature detection. Both kinds of
//! engine produce identical output.
//!
//! # Usage example
//! ```
//! use aes_cfb::{aes_cfb8, CipherContext, Direction, KeySchedule};
//! use hex_literal::hex;
//!
//! let keys = KeySchedule::expand(&hex!("2b7e151628aed2a6abf7158809cf4f3c"))?;
//! let iv = hex!("000102030405060708090a0b0c0d0e0f");
//! let engine = aes_cfb8(128)?;
//!
//! let mut enc = CipherContext::new(engine);
//! enc.init(Direction::Encrypt, &keys, &iv)?;
//! let ciphertext = enc.process(&hex!("6bc1bee22e409f96e93d7e117393172aae2d"))?;
//! assert_eq!(ciphertext, hex!("3b79424c9c0dd436bace9e0ed4586a4f32b9"));
//!
//! let mut dec = aes_cfb::init(engine, Direction::Decrypt, &keys, &iv)?;
//! let mut plaintext = dec.process(&ciphertext[..5])?;
//! plaintext.extend(dec.process(&ciphertext[5..])?);
//! assert_eq!(plaintext, hex!("6bc1bee22e409f96e93d7e117393172aae2d"));
//! # Ok::<(), aes_cfb::Error>(())
//! ```
//!
//! # Configuration
//! - `force-soft`: never register hardware-accelerated engines.
//! - `zeroize`: wipe feedback registers and round keys on drop.
//!
//! [1]: https://en.wikipedia.org/wiki/Block_cipher_mode_of_operation#Cipher_feedback_(CFB)

#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/media/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/media/master/logo.svg"
)]
#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod context;
mod dispatch;
mod error;
mod key;

pub use cipher;

pub use crate::{
    context::{init, CipherContext, Direction, State, IV_LEN},
    dispatch::{
        aes_cfb, aes_cfb1, aes_cfb128, aes_cfb8, registry, select_engine, EngineDescriptor,
        EngineHandle, EngineKind, FeedbackWidth, Registry,
    },
    error::{Error, Result},
    key::{KeySchedule, KeySize},
};
