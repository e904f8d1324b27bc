pub mod accumulator;
pub mod capture;
pub mod file;
pub mod level;

pub use accumulator::AudioAccumulator;
pub use capture::{AudioCapture, AudioFrame, CaptureConfig, WavCapture};
pub use file::{write_wav, AudioFile};
pub use level::{is_silent, rms_energy};
