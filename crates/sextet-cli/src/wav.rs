//! 32-bit float WAV output.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write interleaved-on-the-fly channels to a float WAV.
///
/// `channels` holds one buffer per output channel; all must share a length.
pub fn write_float_wav(
    path: impl AsRef<Path>,
    channels: &[&[f32]],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;

    let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    for frame in 0..frames {
        for channel in channels {
            writer.write_sample(channel[frame])?;
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn stereo_file_reads_back() {
        let file = NamedTempFile::new().unwrap();
        let left = [0.1f32, 0.2, 0.3];
        let right = [-0.1f32, -0.2, -0.3];
        write_float_wav(file.path(), &[&left, &right], 44100).unwrap();

        let mut reader = hound::WavReader::open(file.path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.sample_format, SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
    }
}
