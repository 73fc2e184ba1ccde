//! Stateful CFB encryption and decryption contexts.

use crate::{EngineDescriptor, EngineKind, Error, FeedbackWidth, KeySchedule, Result};
use cfb1::Cfb1;
use cfb128::Cfb;
use cfb8::Cfb8;
use cipher::{InnerIvInit, IvState};

/// IV length in bytes, one AES block.
pub const IV_LEN: usize = 16;

/// Whether a context encrypts or decrypts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// Lifecycle of a [`CipherContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Created, but not yet bound to a key and IV.
    Uninitialized,
    /// Bound to a key and IV, nothing processed yet.
    Initialized,
    /// At least one non-empty input processed.
    InUse,
    /// A CFB-128 stream ended with a partial block; no further input is
    /// accepted.
    Exhausted,
}

enum Engine<'k> {
    Cfb128(Cfb<&'k KeySchedule>),
    Cfb8(Cfb8<&'k KeySchedule>),
    Cfb1(Cfb1<&'k KeySchedule>),
}

struct Active<'k> {
    direction: Direction,
    engine: Engine<'k>,
}

/// CFB state for one message: the feedback register, the borrowed key
/// schedule and the position in the stream.
///
/// A context is bound to a key and IV exactly once. Encrypting another
/// message, even under the same key and IV, takes a fresh context.
pub struct CipherContext<'k> {
    descriptor: EngineDescriptor,
    active: Option<Active<'k>>,
    state: State,
    position_bits: u64,
}

impl<'k> CipherContext<'k> {
    /// Uninitialized context served by `engine`.
    pub fn new(engine: &EngineDescriptor) -> Self {
        Self {
            descriptor: *engine,
            active: None,
            state: State::Uninitialized,
            position_bits: 0,
        }
    }

    /// Bind the context to a key schedule and IV.
    ///
    /// The key schedule must have the size the engine was selected for.
    pub fn init(&mut self, direction: Direction, keys: &'k KeySchedule, iv: &[u8]) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }
        if keys.key_size() != self.descriptor.key_size {
            return Err(Error::InvalidKeySize(keys.key_size().bits()));
        }
        if iv.len() != IV_LEN {
            return Err(Error::InvalidIvLength(iv.len()));
        }
        let bad_iv = |_| Error::InvalidIvLength(iv.len());
        let engine = match self.descriptor.width {
            FeedbackWidth::Cfb128 => Engine::Cfb128(Cfb::inner_iv_slice_init(keys, iv).map_err(bad_iv)?),
            FeedbackWidth::Cfb8 => Engine::Cfb8(Cfb8::inner_iv_slice_init(keys, iv).map_err(bad_iv)?),
            FeedbackWidth::Cfb1 => Engine::Cfb1(Cfb1::inner_iv_slice_init(keys, iv).map_err(bad_iv)?),
        };
        self.active = Some(Active { direction, engine });
        self.state = State::Initialized;
        tracing::debug!(
            key_bits = self.descriptor.key_size.bits(),
            width_bits = self.descriptor.width.bits(),
            kind = ?self.descriptor.kind,
            ?direction,
            "initialized CFB context"
        );
        Ok(())
    }

    /// Transform `input`, returning output of the same length.
    pub fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = input.to_vec();
        self.process_in_place(&mut out)?;
        Ok(out)
    }

    /// Transform `buf` in place. On error `buf` is left untouched.
    pub fn process_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        let accelerated = self.descriptor.kind == EngineKind::HardwareAccelerated;
        let active = self.ready()?;
        if buf.is_empty() {
            return Ok(());
        }
        let res = match (&mut active.engine, active.direction) {
            (Engine::Cfb128(c), Direction::Encrypt) => c.encrypt_buf(buf),
            (Engine::Cfb128(c), Direction::Decrypt) if accelerated => c.decrypt_par(buf),
            (Engine::Cfb128(c), Direction::Decrypt) => c.decrypt_buf(buf),
            (Engine::Cfb8(c), Direction::Encrypt) => {
                c.encrypt_buf(buf);
                Ok(())
            }
            (Engine::Cfb8(c), Direction::Decrypt) => {
                c.decrypt_buf(buf);
                Ok(())
            }
            (Engine::Cfb1(c), Direction::Encrypt) => {
                c.encrypt_buf(buf);
                Ok(())
            }
            (Engine::Cfb1(c), Direction::Decrypt) => {
                c.decrypt_buf(buf);
                Ok(())
            }
        };
        res.map_err(|_| Error::StreamExhausted)?;
        self.advance(8 * buf.len());
        Ok(())
    }

    /// Transform the first `nbits` bits of `input`, MSB-first.
    ///
    /// The output is `ceil(nbits / 8)` bytes long with any bits past `nbits`
    /// cleared. CFB-1 contexts accept any bit length and continue the stream
    /// from the exact bit where the previous call stopped. Other widths
    /// accept only whole bytes.
    pub fn process_bits(&mut self, input: &[u8], nbits: usize) -> Result<Vec<u8>> {
        let unsupported = Error::UnsupportedConfiguration {
            key_bits: self.descriptor.key_size.bits(),
            width_bits: self.descriptor.width.bits(),
        };
        let active = self.ready()?;
        if nbits > 8 * input.len() {
            return Err(Error::InvalidBitLength {
                bits: nbits,
                available: 8 * input.len(),
            });
        }
        let len = (nbits + 7) / 8;
        let mut out = input[..len].to_vec();
        if nbits % 8 == 0 {
            self.process_in_place(&mut out)?;
            return Ok(out);
        }

        let res = match (&mut active.engine, active.direction) {
            (Engine::Cfb1(c), Direction::Encrypt) => c.encrypt_bits(&mut out, nbits),
            (Engine::Cfb1(c), Direction::Decrypt) => c.decrypt_bits(&mut out, nbits),
            (Engine::Cfb128(_) | Engine::Cfb8(_), _) => return Err(unsupported),
        };
        // `nbits` was checked against the buffer above.
        res.map_err(|_| Error::InvalidBitLength {
            bits: nbits,
            available: 8 * len,
        })?;
        out[len - 1] &= 0xffu8 << (8 - nbits % 8);
        self.advance(nbits);
        Ok(out)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Engine serving this context.
    pub fn engine(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    /// Direction, once initialized.
    pub fn direction(&self) -> Option<Direction> {
        self.active.as_ref().map(|a| a.direction)
    }

    /// Number of bits processed so far.
    pub fn position_bits(&self) -> u64 {
        self.position_bits
    }

    /// Offset of the next bit within its byte. Non-zero only after a CFB-1
    /// context processed a bit length that is not a multiple of eight.
    pub fn bit_offset(&self) -> u8 {
        (self.position_bits % 8) as u8
    }

    /// Current contents of the feedback register, once initialized.
    pub fn iv_state(&self) -> Option<[u8; IV_LEN]> {
        let iv = match &self.active.as_ref()?.engine {
            Engine::Cfb128(c) => c.iv_state(),
            Engine::Cfb8(c) => c.iv_state(),
            Engine::Cfb1(c) => c.iv_state(),
        };
        let mut out = [0u8; IV_LEN];
        out.copy_from_slice(&iv);
        Some(out)
    }

    fn ready(&mut self) -> Result<&mut Active<'k>> {
        if self.state == State::Exhausted {
            return Err(Error::StreamExhausted);
        }
        self.active.as_mut().ok_or(Error::UninitializedContext)
    }

    fn advance(&mut self, bits: usize) {
        self.position_bits += bits as u64;
        let exhausted = matches!(
            &self.active,
            Some(Active { engine: Engine::Cfb128(c), .. }) if c.is_finished()
        );
        self.state = if exhausted {
            tracing::debug!(position_bits = self.position_bits, "CFB-128 stream ended with a partial block");
            State::Exhausted
        } else {
            State::InUse
        };
    }
}

/// Shorthand for [`CipherContext::new`] followed by
/// [`CipherContext::init`].
pub fn init<'k>(
    engine: &EngineDescriptor,
    direction: Direction,
    keys: &'k KeySchedule,
    iv: &[u8],
) -> Result<CipherContext<'k>> {
    let mut ctx = CipherContext::new(engine);
    ctx.init(direction, keys, iv)?;
    Ok(ctx)
}

impl<'k> core::fmt::Debug for CipherContext<'k> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CipherContext")
            .field("engine", &self.descriptor)
            .field("direction", &self.direction())
            .field("state", &self.state)
            .field("position_bits", &self.position_bits)
            .finish_non_exhaustive()
    }
}
