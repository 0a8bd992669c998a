//! Wraps raw speech PCM into a playable WAV data URI

use std::io::Cursor;

use crate::services::data_uri;

/// Sample rate reported when the response MIME type omits one
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Read `rate=<hz>` from a MIME type like `audio/L16;codec=pcm;rate=24000`
pub fn sample_rate_from_mime(mime: &str) -> u32 {
    mime.split(';')
        .filter_map(|part| part.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Little-endian signed 16-bit mono PCM to `data:audio/wav;base64,...`
pub fn pcm_to_wav_data_uri(pcm: &[u8], sample_rate: u32) -> Result<String, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for frame in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([frame[0], frame[1]]))?;
        }
        writer.finalize()?;
    }

    Ok(data_uri::encode("audio/wav", &cursor.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    #[test]
    fn test_sample_rate_from_mime() {
        assert_eq!(sample_rate_from_mime("audio/L16;codec=pcm;rate=16000"), 16_000);
        assert_eq!(sample_rate_from_mime("audio/L16"), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_wav_is_readable() {
        let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let uri = pcm_to_wav_data_uri(&pcm, 24_000).unwrap();
        let (mime, payload) = data_uri::split(&uri).unwrap();
        assert_eq!(mime, "audio/wav");

        let bytes = STANDARD.decode(payload).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }
}
