//! Error types.

/// Result type with [`Error`] as the error.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced while selecting an engine or driving a [`CipherContext`].
///
/// None of them are transient: retrying the same call gives the same error.
///
/// [`CipherContext`]: crate::CipherContext
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Key is not 128, 192 or 256 bits, or does not match the engine.
    #[error("invalid AES key size: {0} bits")]
    InvalidKeySize(usize),
    /// IV is not exactly one block long.
    #[error("invalid IV length: expected 16 bytes, got {0}")]
    InvalidIvLength(usize),
    /// No engine exists for the requested key size and feedback width.
    #[error("unsupported configuration: {key_bits}-bit key with {width_bits}-bit feedback")]
    UnsupportedConfiguration {
        /// Requested key size in bits.
        key_bits: usize,
        /// Requested feedback width in bits.
        width_bits: usize,
    },
    /// Context was used before [`CipherContext::init`](crate::CipherContext::init).
    #[error("cipher context used before initialization")]
    UninitializedContext,
    /// Context was initialized twice.
    #[error("cipher context is already initialized")]
    AlreadyInitialized,
    /// A CFB-128 stream was ended by a partial block.
    #[error("CFB-128 stream already ended with a partial block")]
    StreamExhausted,
    /// Bit length exceeds the input.
    #[error("bit length {bits} exceeds input of {available} bits")]
    InvalidBitLength {
        /// Requested number of bits.
        bits: usize,
        /// Number of bits in the input.
        available: usize,
    },
}
