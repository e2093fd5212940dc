//! MPEG audio frame-header arithmetic.
//!
//! Duration comes from the first frame header found after any ID3v2 tag:
//! exactly, when a Xing/Info or VBRI header carries a total frame count, or
//! approximately via average-bitrate arithmetic for CBR streams. ID3v1/APE
//! trailers are not subtracted from the CBR byte length.

use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

/// Lookahead window scanned for the first frame sync.
const LOOKAHEAD_LEN: usize = 4096;

/// Bitrates in kbps from the MPEG specification, keyed by version/layer row
/// and the 4-bit bitrate index. Index 0 is "free format" and index 15 is
/// invalid; both map to 0.
const BITRATES_KBPS: [[u32; 16]; 5] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0], // V1, L1
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],    // V1, L2
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],     // V1, L3
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],    // V2, L1
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],         // V2, L2/L3
];

/// Sample rates in Hz keyed by version and the 2-bit rate index.
const SAMPLE_RATES_HZ: [[u32; 3]; 3] = [
    [44_100, 48_000, 32_000], // V1
    [22_050, 24_000, 16_000], // V2
    [11_025, 12_000, 8_000],  // V2.5
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpegVersion {
    V1,
    V2,
    V2_5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelMode {
    Mono,
    Stereo,
}

/// Fields decoded from the 4-byte frame header at the first sync.
#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    bitrate_kbps: u32,
    sample_rate_hz: u32,
    samples_per_frame: u32,
    version: MpegVersion,
    channels: ChannelMode,
}

impl FrameHeader {
    /// Decode a frame header. `None` only for the reserved sample-rate index.
    fn parse(bytes: [u8; 4]) -> Option<Self> {
        let b1 = bytes[1];
        let b2 = bytes[2];
        let b3 = bytes[3];

        let version = match (b1 >> 3) & 0x03 {
            0 => MpegVersion::V2_5,
            2 => MpegVersion::V2,
            // 3 is MPEG 1; the reserved index 1 is treated the same way.
            _ => MpegVersion::V1,
        };
        let layer = 4 - ((b1 >> 1) & 0x03);
        let bitrate_index = usize::from((b2 >> 4) & 0x0F);
        let rate_index = usize::from((b2 >> 2) & 0x03);
        let channels = if (b3 >> 6) & 0x03 == 3 {
            ChannelMode::Mono
        } else {
            ChannelMode::Stereo
        };

        if rate_index > 2 {
            return None;
        }

        let bitrate_row = match (version, layer) {
            (MpegVersion::V1, layer) => usize::from(layer) - 1,
            (_, 1) => 3,
            _ => 4,
        };
        let version_row = match version {
            MpegVersion::V1 => 0,
            MpegVersion::V2 => 1,
            MpegVersion::V2_5 => 2,
        };
        let samples_per_frame = match (layer, version) {
            (1, _) => 384,
            (2, _) => 1152,
            (_, MpegVersion::V1) => 1152,
            _ => 576,
        };

        Some(Self {
            bitrate_kbps: BITRATES_KBPS[bitrate_row][bitrate_index],
            sample_rate_hz: SAMPLE_RATES_HZ[version_row][rate_index],
            samples_per_frame,
            version,
            channels,
        })
    }

    /// Layer III side-information length, which separates the frame header
    /// from a candidate Xing/Info tag.
    fn side_info_len(self) -> usize {
        match (self.version, self.channels) {
            (MpegVersion::V1, ChannelMode::Mono) => 17,
            (MpegVersion::V1, ChannelMode::Stereo) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, ChannelMode::Stereo) => 17,
        }
    }
}

pub(super) fn duration<R: Read + Seek>(reader: &mut R) -> Option<Duration> {
    let stream_len = reader.seek(SeekFrom::End(0)).ok()?;
    reader.seek(SeekFrom::Start(0)).ok()?;

    let id3_len = skip_id3v2(reader)?;

    let mut lookahead = [0u8; LOOKAHEAD_LEN];
    let filled = read_up_to(reader, &mut lookahead)?;
    let buf = &lookahead[..filled];

    let sync = find_frame_sync(buf)?;
    let header = FrameHeader::parse([
        buf[sync],
        *buf.get(sync + 1)?,
        *buf.get(sync + 2)?,
        *buf.get(sync + 3)?,
    ])?;

    if let Some(frame_count) = vbr_frame_count(buf, sync, header) {
        let seconds = f64::from(frame_count) * f64::from(header.samples_per_frame)
            / f64::from(header.sample_rate_hz);
        return Some(Duration::from_secs_f64(seconds));
    }

    // CBR fallback over the byte length past the leading tag.
    if header.bitrate_kbps == 0 {
        return None;
    }
    let audio_len = stream_len.saturating_sub(id3_len);
    let seconds = audio_len as f64 * 8.0 / (f64::from(header.bitrate_kbps) * 1000.0);
    Some(Duration::from_secs_f64(seconds))
}

/// Skip a leading ID3v2 tag if present, returning its total length in bytes
/// (header included). Leaves the reader positioned at the first audio byte.
fn skip_id3v2<R: Read + Seek>(reader: &mut R) -> Option<u64> {
    let mut header = [0u8; 10];
    let filled = read_up_to(reader, &mut header)?;

    if filled == 10 && &header[0..3] == b"ID3" {
        let tag_len = u64::from(synchsafe_u32(&header[6..10])) + 10;
        reader.seek(SeekFrom::Start(tag_len)).ok()?;
        Some(tag_len)
    } else {
        reader.seek(SeekFrom::Start(0)).ok()?;
        Some(0)
    }
}

/// Decode a 28-bit synchsafe integer (high bit of each byte cleared).
fn synchsafe_u32(bytes: &[u8]) -> u32 {
    (u32::from(bytes[0] & 0x7F) << 21)
        | (u32::from(bytes[1] & 0x7F) << 14)
        | (u32::from(bytes[2] & 0x7F) << 7)
        | u32::from(bytes[3] & 0x7F)
}

/// Offset of the first frame sync: `0xFF` followed by a byte with its top
/// three bits set. First match wins.
fn find_frame_sync(buf: &[u8]) -> Option<usize> {
    buf.windows(2)
        .position(|pair| pair[0] == 0xFF && (pair[1] & 0xE0) == 0xE0)
}

/// Total frame count from a Xing/Info or VBRI header in the first frame,
/// when one is present and carries the frame-count field.
fn vbr_frame_count(buf: &[u8], sync: usize, header: FrameHeader) -> Option<u32> {
    let xing = sync + 4 + header.side_info_len();
    if xing + 8 >= buf.len() {
        return None;
    }

    if &buf[xing..xing + 4] == b"Xing" || &buf[xing..xing + 4] == b"Info" {
        let flags = read_be_u32(buf, xing + 4)?;
        if flags & 0x01 != 0 {
            return read_be_u32(buf, xing + 8);
        }
    }

    // VBRI sits at a fixed 32-byte offset from the frame sync, with the
    // frame count 14 bytes into the tag.
    let vbri = sync + 32;
    if vbri + 26 < buf.len() && &buf[vbri..vbri + 4] == b"VBRI" {
        return read_be_u32(buf, vbri + 14);
    }

    None
}

fn read_be_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = buf.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// Fill as much of `buf` as the stream can provide. Short reads near the end
/// of a stream are expected and not an error.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Option<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(_) => return None,
        }
    }
    Some(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// MPEG1 Layer III, 128 kbps, 44100 Hz, stereo.
    const CBR_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

    fn build_id3v2(payload_len: u32) -> Vec<u8> {
        let mut bytes = vec![b'I', b'D', b'3', 0x04, 0x00, 0x00];
        bytes.push(((payload_len >> 21) & 0x7F) as u8);
        bytes.push(((payload_len >> 14) & 0x7F) as u8);
        bytes.push(((payload_len >> 7) & 0x7F) as u8);
        bytes.push((payload_len & 0x7F) as u8);
        bytes.resize(bytes.len() + payload_len as usize, 0);
        bytes
    }

    /// A CBR stream: one frame header at offset 0, zero-padded to `len`.
    fn build_cbr(len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[..4].copy_from_slice(&CBR_HEADER);
        bytes
    }

    fn build_xing(frame_count: u32) -> Vec<u8> {
        let mut bytes = build_cbr(4096);
        // V1 stereo side info is 32 bytes, placing the tag at sync + 36.
        bytes[36..40].copy_from_slice(b"Xing");
        bytes[40..44].copy_from_slice(&1u32.to_be_bytes());
        bytes[44..48].copy_from_slice(&frame_count.to_be_bytes());
        bytes
    }

    #[test]
    fn test_cbr_duration_from_stream_length() {
        // 64000 bytes at 128 kbps = 4 seconds
        let bytes = build_cbr(64_000);
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(result, Duration::from_secs(4));
    }

    #[test]
    fn test_cbr_excludes_id3v2_tag_length() {
        let mut bytes = build_id3v2(256);
        bytes.extend_from_slice(&build_cbr(64_000));
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(result, Duration::from_secs(4));
    }

    #[test]
    fn test_sync_found_past_garbage() {
        let mut bytes = vec![0x00, 0x12, 0x34];
        bytes.extend_from_slice(&build_cbr(64_000));
        // Stream is 3 bytes longer than the frame data, so the CBR estimate
        // grows accordingly rather than matching exactly.
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        assert!(result > Duration::from_secs(4));
        assert!(result < Duration::from_millis(4010));
    }

    #[test]
    fn test_xing_frame_count_is_exact() {
        let bytes = build_xing(1000);
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        let expected = 1000.0 * 1152.0 / 44_100.0;
        assert!((result.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_xing_ignores_trailing_length() {
        let short = duration(&mut Cursor::new(build_xing(500))).unwrap();
        let mut padded = build_xing(500);
        padded.extend_from_slice(&[0u8; 100_000]);
        let long = duration(&mut Cursor::new(padded)).unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn test_info_tag_treated_like_xing() {
        let mut bytes = build_xing(800);
        bytes[36..40].copy_from_slice(b"Info");
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        let expected = 800.0 * 1152.0 / 44_100.0;
        assert!((result.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_xing_without_frame_count_falls_back_to_cbr() {
        let mut bytes = build_xing(1000);
        // Clear the frames-present flag; the count field must be ignored.
        bytes[40..44].copy_from_slice(&0u32.to_be_bytes());
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        let expected = 4096.0 * 8.0 / 128_000.0;
        assert!((result.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_vbri_frame_count() {
        let mut bytes = build_cbr(4096);
        bytes[32..36].copy_from_slice(b"VBRI");
        bytes[46..50].copy_from_slice(&2000u32.to_be_bytes());
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        let expected = 2000.0 * 1152.0 / 44_100.0;
        assert!((result.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_sync_is_zero() {
        let bytes = vec![0u8; 5000];
        assert!(duration(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn test_free_bitrate_is_zero() {
        // Bitrate index 0 = free format, which the estimator cannot price.
        let mut bytes = build_cbr(64_000);
        bytes[2] = 0x00;
        assert!(duration(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn test_reserved_sample_rate_index_is_zero() {
        let mut bytes = build_cbr(64_000);
        bytes[2] = 0x9C; // rate index 3 (reserved)
        assert!(duration(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn test_id3_only_stream_is_zero() {
        let bytes = build_id3v2(64);
        assert!(duration(&mut Cursor::new(bytes)).is_none());
    }

    #[test]
    fn test_synchsafe_decoding() {
        assert_eq!(synchsafe_u32(&[0x00, 0x00, 0x02, 0x01]), 257);
        assert_eq!(synchsafe_u32(&[0x7F, 0x7F, 0x7F, 0x7F]), 0x0FFF_FFFF);
        // High bits are masked off, not carried.
        assert_eq!(synchsafe_u32(&[0x80, 0x80, 0x80, 0x81]), 1);
    }

    #[test]
    fn test_mpeg2_samples_per_frame() {
        // MPEG2 Layer III, 64 kbps, 22050 Hz: 576 samples per frame.
        let mut bytes = vec![0u8; 4096];
        bytes[..4].copy_from_slice(&[0xFF, 0xF3, 0x80, 0x00]);
        // V2 stereo side info is 17 bytes, placing the tag at sync + 21.
        bytes[21..25].copy_from_slice(b"Xing");
        bytes[25..29].copy_from_slice(&1u32.to_be_bytes());
        bytes[29..33].copy_from_slice(&441u32.to_be_bytes());
        let result = duration(&mut Cursor::new(bytes)).unwrap();
        let expected = 441.0 * 576.0 / 22_050.0;
        assert!((result.as_secs_f64() - expected).abs() < 1e-9);
    }
}
