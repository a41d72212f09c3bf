//! WAV fragment parsing and the Concatenator (spec §4.9) — validates that
//! every fragment shares the same PCM format before splicing their payloads
//! into one RIFF/WAVE file.

use std::io::Cursor;

use hound::{WavReader, WavSpec, WavWriter};

use crate::error::{AudioFormat, EngineError, Result};

/// A parsed WAV fragment: its format descriptor and raw interleaved PCM
/// samples (16-bit signed).
pub struct AudioFragment {
    pub format: AudioFormat,
    pub samples: Vec<i16>,
}

/// Parses a complete in-memory WAV file into its format and sample data.
pub fn parse_fragment(bytes: &[u8]) -> Result<AudioFragment> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| EngineError::PostProcessing(format!("invalid wav fragment: {e}")))?;
    let spec = reader.spec();
    let format = AudioFormat {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
    };
    let samples: std::result::Result<Vec<i16>, _> = reader.into_samples::<i16>().collect();
    let samples =
        samples.map_err(|e| EngineError::PostProcessing(format!("invalid wav samples: {e}")))?;
    Ok(AudioFragment { format, samples })
}

/// Concatenates fragments (already in the desired final order, including
/// inserted silence fragments) into a single WAV file. Fails hard on any
/// format mismatch rather than silently adopting the first fragment's
/// format (spec §4.9 Decision).
pub fn concatenate(fragments: &[AudioFragment]) -> Result<Vec<u8>> {
    let Some(first) = fragments.first() else {
        return Err(EngineError::PostProcessing(
            "cannot concatenate zero fragments".to_string(),
        ));
    };
    let expected = first.format;

    for (index, fragment) in fragments.iter().enumerate().skip(1) {
        if fragment.format != expected {
            return Err(EngineError::FormatMismatch {
                expected,
                found: fragment.format,
                fragment_index: index,
            });
        }
    }

    let spec = WavSpec {
        channels: expected.channels,
        sample_rate: expected.sample_rate,
        bits_per_sample: expected.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| EngineError::PostProcessing(format!("cannot open wav writer: {e}")))?;
        for fragment in fragments {
            for &sample in &fragment.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| EngineError::PostProcessing(format!("wav write failed: {e}")))?;
            }
        }
        writer
            .finalize()
            .map_err(|e| EngineError::PostProcessing(format!("wav finalize failed: {e}")))?;
    }
    Ok(cursor.into_inner())
}
