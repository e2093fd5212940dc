//! RIFF/WAVE header arithmetic.

use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

/// Walk the RIFF chunk list and derive the duration from the `fmt ` fields
/// and the declared `data` byte length. `None` means the stream is not a
/// usable WAVE container.
pub(super) fn duration<R: Read + Seek>(reader: &mut R) -> Option<Duration> {
    let stream_len = reader.seek(SeekFrom::End(0)).ok()?;
    reader.seek(SeekFrom::Start(0)).ok()?;

    let mut riff = [0u8; 12];
    reader.read_exact(&mut riff).ok()?;
    if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return None;
    }

    let mut sample_rate = 0u32;
    let mut channels = 0u16;
    let mut bits_per_sample = 0u16;
    let mut data_len = 0u64;

    loop {
        let pos = reader.stream_position().ok()?;
        if pos + 8 > stream_len {
            break;
        }

        let mut header = [0u8; 8];
        reader.read_exact(&mut header).ok()?;
        let chunk_size = u64::from(u32::from_le_bytes([
            header[4], header[5], header[6], header[7],
        ]));

        if &header[0..4] == b"fmt " {
            let mut fmt = [0u8; 16];
            reader.read_exact(&mut fmt).ok()?;
            channels = u16::from_le_bytes([fmt[2], fmt[3]]);
            sample_rate = u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]);
            // 6 bytes of avg-bytes-per-second and block-align sit in between.
            bits_per_sample = u16::from_le_bytes([fmt[14], fmt[15]]);
            if chunk_size > 16 {
                reader.seek(SeekFrom::Current((chunk_size - 16) as i64)).ok()?;
            }
        } else if &header[0..4] == b"data" {
            // The sample data itself need not be read, only its length.
            data_len = chunk_size;
            break;
        } else {
            reader.seek(SeekFrom::Current(chunk_size as i64)).ok()?;
        }
    }

    if sample_rate == 0 || channels == 0 || bits_per_sample == 0 {
        return None;
    }

    let bytes_per_second =
        f64::from(sample_rate) * f64::from(channels) * (f64::from(bits_per_sample) / 8.0);
    Some(Duration::from_secs_f64(data_len as f64 / bytes_per_second))
}
