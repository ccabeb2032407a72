//! Frequency-domain transforms.
//!
//! - Orthonormal DCT-II / DCT-III pair used for brick-wall filtering
//! - Short-time Fourier transform and spectrogram

mod dct;
mod stft;

pub use dct::{dct_ortho, idct_ortho};
pub use stft::{spectrogram, stft_magnitude, SpectrogramGrid, StftMagnitude};
