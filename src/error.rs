use thiserror::Error;

/// Errors raised by setup paths that cannot sensibly continue: a
/// zero-sized viewport, or an I/O failure on a file whose absence
/// leaves nothing useful to fall back to.
///
/// Asset loads that the contract allows to fail softly (texture
/// decode, raw-buffer reads, mesh loads) do *not* go through this
/// type; they're reported via `log::warn!` and leave the previous
/// state untouched.
#[derive(Error, Debug)]
pub enum SoftGpuError {
    #[error("viewport dimensions must be non-zero, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },

    #[error("cubemap face index {0} out of range (expected 0..=5)")]
    BadCubemapFace(usize),

    #[error("raw buffer {path}: expected {expected} bytes, found {found}")]
    ShortRawBuffer {
        path: String,
        expected: usize,
        found: usize,
    },
}
