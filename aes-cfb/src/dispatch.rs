//! Engine selection between the reference CFB implementations and the
//! hardware-accelerated ones, with runtime detection of AES instructions.

use crate::{Error, KeySize, Result};
use cfg_if::cfg_if;
use std::sync::OnceLock;

cfg_if! {
    if #[cfg(all(
        any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64"),
        not(feature = "force-soft"),
    ))] {
        // CPUID access expands to unsafe code inside the macro.
        #[allow(unsafe_code)]
        mod cpu {
            cpufeatures::new!(aes_intrinsics, "aes");

            pub(super) fn aes_intrinsics_present() -> bool {
                aes_intrinsics::get()
            }
        }

        use self::cpu::aes_intrinsics_present;
    } else {
        fn aes_intrinsics_present() -> bool {
            false
        }
    }
}

/// Number of keystream bits consumed and fed back per step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeedbackWidth {
    /// Full block feedback.
    Cfb128,
    /// One byte feedback.
    Cfb8,
    /// One bit feedback.
    Cfb1,
}

impl FeedbackWidth {
    /// All feedback widths, widest first.
    pub const ALL: [FeedbackWidth; 3] = [Self::Cfb128, Self::Cfb8, Self::Cfb1];

    /// Feedback width from a number of bits.
    pub fn from_bits(bits: usize) -> Option<Self> {
        match bits {
            128 => Some(Self::Cfb128),
            8 => Some(Self::Cfb8),
            1 => Some(Self::Cfb1),
            _ => None,
        }
    }

    /// Width in bits.
    pub fn bits(self) -> usize {
        match self {
            Self::Cfb128 => 128,
            Self::Cfb8 => 8,
            Self::Cfb1 => 1,
        }
    }
}

/// Implementation flavor of an engine.
///
/// Both flavors produce identical output; they differ only in speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// One block cipher invocation at a time.
    Reference,
    /// Batches independent block cipher invocations so that pipelined AES
    /// instructions can process them together.
    HardwareAccelerated,
}

/// A registered engine: the implementation serving one key size and
/// feedback width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EngineDescriptor {
    /// Key size served.
    pub key_size: KeySize,
    /// Feedback width served.
    pub width: FeedbackWidth,
    /// Implementation flavor.
    pub kind: EngineKind,
}

/// Handle to an engine in the process-wide registry.
pub type EngineHandle = &'static EngineDescriptor;

/// Table of available engines.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    engines: Vec<EngineDescriptor>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with reference engines for every key size and width.
    pub fn reference() -> Self {
        let mut registry = Self::new();
        for key_size in KeySize::ALL {
            for width in FeedbackWidth::ALL {
                registry = registry.register(EngineDescriptor {
                    key_size,
                    width,
                    kind: EngineKind::Reference,
                });
            }
        }
        registry
    }

    /// Registry with reference engines, plus hardware-accelerated CFB-128
    /// engines when the CPU supports AES instructions.
    ///
    /// CFB-8 and CFB-1 feed every output unit back before the next block
    /// cipher invocation, so there is nothing to batch and they always use
    /// the reference engine.
    pub fn detect() -> Self {
        let accelerated = aes_intrinsics_present();
        let mut registry = Self::reference();
        if accelerated {
            for key_size in KeySize::ALL {
                registry = registry.register(EngineDescriptor {
                    key_size,
                    width: FeedbackWidth::Cfb128,
                    kind: EngineKind::HardwareAccelerated,
                });
            }
        }
        tracing::debug!(
            aes_intrinsics = accelerated,
            engines = registry.engines.len(),
            "built CFB engine registry"
        );
        registry
    }

    /// Add an engine to the table.
    pub fn register(mut self, engine: EngineDescriptor) -> Self {
        if !self.engines.contains(&engine) {
            self.engines.push(engine);
        }
        self
    }

    /// All registered engines.
    pub fn engines(&self) -> &[EngineDescriptor] {
        &self.engines
    }

    /// Select the engine for a key size and feedback width, both in bits.
    ///
    /// A hardware-accelerated engine is preferred over the reference one.
    pub fn select(&self, key_bits: usize, width_bits: usize) -> Result<&EngineDescriptor> {
        let unsupported = Error::UnsupportedConfiguration {
            key_bits,
            width_bits,
        };
        let (key_size, width) = match (KeySize::from_bits(key_bits), FeedbackWidth::from_bits(width_bits)) {
            (Some(k), Some(w)) => (k, w),
            _ => return Err(unsupported),
        };
        let mut found: Option<&EngineDescriptor> = None;
        for engine in self.engines.iter() {
            if engine.key_size != key_size || engine.width != width {
                continue;
            }
            if engine.kind == EngineKind::HardwareAccelerated {
                found = Some(engine);
                break;
            }
            if found.is_none() {
                found = Some(engine);
            }
        }
        let engine = found.ok_or(unsupported)?;
        tracing::trace!(key_bits, width_bits, kind = ?engine.kind, "selected CFB engine");
        Ok(engine)
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, built by [`Registry::detect`] on first use
/// and never modified afterwards.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::detect)
}

/// Select an engine from the process-wide registry.
pub fn select_engine(key_bits: usize, width_bits: usize) -> Result<EngineHandle> {
    registry().select(key_bits, width_bits)
}

/// AES-CFB engine with full block feedback for the given key size.
pub fn aes_cfb128(key_bits: usize) -> Result<EngineHandle> {
    select_engine(key_bits, 128)
}

/// AES-CFB engine with one bit feedback for the given key size.
pub fn aes_cfb1(key_bits: usize) -> Result<EngineHandle> {
    select_engine(key_bits, 1)
}

/// AES-CFB engine with one byte feedback for the given key size.
pub fn aes_cfb8(key_bits: usize) -> Result<EngineHandle> {
    select_engine(key_bits, 8)
}

/// Plain "AES-CFB" is the full block variant.
pub use self::aes_cfb128 as aes_cfb;
