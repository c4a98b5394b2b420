//! End-to-end recognition of synthetic SCHl files.

use std::io::Write;
use std::path::Path;

use schl_format::{
    ByteSource, CodingKind, Endian, FileSource, FormatVersion, HeaderFault, Platform, Recognizer,
    SchlError, SchlReader, SliceSource,
};

// ─── Builders ──────────────────────────────────────────────────────────────

fn tag(tag: u8, value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(3);
    let mut out = vec![tag, (4 - skip) as u8];
    out.extend_from_slice(&bytes[skip..]);
    out
}

fn pt(code: u8) -> Vec<u8> {
    vec![b'P', b'T', code, 0x00]
}

/// `SCHl` block around a platform marker and tag list.
fn header_block(marker: &[u8], tags: &[Vec<u8>]) -> Vec<u8> {
    let mut stream = marker.to_vec();
    for t in tags {
        stream.extend_from_slice(t);
    }
    stream.push(0xFF);
    while (stream.len() + 8) % 4 != 0 {
        stream.push(0x00);
    }
    block(b"SCHl", &stream)
}

fn block(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32 + 8).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn u32_bytes(value: u32, endian: Endian) -> [u8; 4] {
    match endian {
        Endian::Big => value.to_be_bytes(),
        Endian::Little => value.to_le_bytes(),
    }
}

/// Data block: sample count, one zero offset per channel, then filler.
fn data_block(samples: u32, endian: Endian, channels: usize, filler: usize) -> Vec<u8> {
    let mut payload = u32_bytes(samples, endian).to_vec();
    for _ in 0..channels {
        payload.extend_from_slice(&[0; 4]);
    }
    payload.extend(std::iter::repeat_n(0x5A, filler));
    block(b"SCDl", &payload)
}

fn count_block(count: u32) -> Vec<u8> {
    block(b"SCCl", &count.to_le_bytes())
}

fn end_block() -> Vec<u8> {
    block(b"SCEl", &[])
}

fn recognize(file: &[u8]) -> schl_format::Result<schl_format::DecodableStream> {
    Recognizer::new().recognize(&SliceSource::new(file), "stream.asf")
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[test]
fn test_pc_ea_xa_from_file() {
    let mut file = header_block(
        &pt(0x00),
        &[
            tag(0x06, 0x65),
            tag(0x80, 3),
            tag(0x82, 2),
            tag(0xA0, 0x0A),
            tag(0x84, 44100),
            tag(0x85, 88200),
            tag(0x86, 100),
            tag(0x87, 88000),
        ],
    );
    file.extend(count_block(2));
    file.extend(data_block(44100, Endian::Little, 2, 64));
    file.extend(data_block(44100, Endian::Little, 2, 64));
    file.extend(end_block());

    let mut tmp = tempfile::Builder::new().suffix(".sng").tempfile().unwrap();
    tmp.write_all(&file).unwrap();
    tmp.flush().unwrap();

    let reader = SchlReader::open(tmp.path()).unwrap();
    let stream = reader.stream();
    assert_eq!(stream.platform, Platform::Pc);
    assert_eq!(stream.version, FormatVersion::V3);
    assert_eq!(stream.coding, CodingKind::EaXa);
    assert_eq!(stream.codec_variant, 1);
    assert_eq!(stream.channels, 2);
    assert_eq!(stream.sample_rate, 44100);
    assert_eq!(stream.num_samples, 88200);
    assert!(stream.loop_flag);
    assert_eq!((stream.loop_start, stream.loop_end), (100, 88000));
    assert!(!stream.big_endian);
    assert!((stream.duration_secs() - 2.0).abs() < 1e-9);
}

#[test]
fn test_concatenated_substreams_sum() {
    let mut file = header_block(&pt(0x00), &[tag(0x85, 100)]);
    file.extend(count_block(1));
    file.extend(data_block(1000, Endian::Little, 1, 0x60));
    file.extend(end_block());
    // Second sub-stream after zero padding.
    file.extend(std::iter::repeat_n(0u8, 0x20));
    file.extend(header_block(&pt(0x00), &[tag(0x85, 100)]));
    file.extend(count_block(1));
    file.extend(data_block(2345, Endian::Little, 1, 0x60));
    file.extend(end_block());

    let stream = recognize(&file).unwrap();
    assert_eq!(stream.num_samples, 3345);
}

#[test]
fn test_header_count_kept_when_larger() {
    let mut file = header_block(&pt(0x00), &[tag(0x85, 99_999)]);
    file.extend(count_block(1));
    file.extend(data_block(10, Endian::Little, 1, 0));
    file.extend(end_block());

    assert_eq!(recognize(&file).unwrap().num_samples, 99_999);
}

#[test]
fn test_gamecube_adpcm_coefficients() {
    let coefs: [[i16; 16]; 2] = [
        std::array::from_fn(|i| (i as i16) * 100 - 800),
        std::array::from_fn(|i| -((i as i16) * 37)),
    ];
    let coef_patch = |table: &[i16; 16]| {
        let mut out = vec![0x20u8];
        for c in table {
            out.extend_from_slice(&c.to_be_bytes());
        }
        out
    };

    let mut tags = vec![tag(0x82, 2), tag(0xA0, 0x12), tag(0x84, 32000)];
    let mut coef0 = vec![0x8F];
    coef0.extend(coef_patch(&coefs[0]));
    let mut coef1 = vec![0x90];
    coef1.extend(coef_patch(&coefs[1]));
    tags.push(coef0);
    tags.push(coef1);

    let mut file = header_block(&pt(0x06), &tags);
    file.extend(count_block(1));
    file.extend(data_block(0x0001_0000, Endian::Big, 2, 32));
    file.extend(end_block());

    let stream = recognize(&file).unwrap();
    assert_eq!(stream.platform, Platform::GcWii);
    assert!(stream.big_endian);
    assert_eq!(stream.coding, CodingKind::NgcDsp);
    assert_eq!(stream.coefs, coefs.to_vec());
    // Big-endian per-block sample count.
    assert_eq!(stream.num_samples, 0x0001_0000);
}

#[test]
fn test_3ds_needs_explicit_rate() {
    let mut body = count_block(1);
    body.extend(data_block(5, Endian::Little, 1, 0));
    body.extend(end_block());

    let mut file = header_block(&pt(0x14), &[]);
    file.extend_from_slice(&body);
    assert!(matches!(
        recognize(&file),
        Err(SchlError::MalformedHeader(HeaderFault::NoDefaultForPlatform {
            field: "sample rate",
            platform: Platform::ThreeDs,
        }))
    ));

    let mut coef = vec![0x8F, 0x20];
    coef.extend_from_slice(&[0x01, 0x00].repeat(16));
    let mut file = header_block(&pt(0x14), &[tag(0x84, 32728), coef]);
    file.extend_from_slice(&body);
    let stream = recognize(&file).unwrap();
    assert_eq!(stream.coding, CodingKind::NgcDsp);
    assert_eq!(stream.version, FormatVersion::V3);
    // Little-endian platform: 01 00 reads as 1.
    assert_eq!(stream.coefs, vec![[1i16; 16]]);
}

#[test]
fn test_mpeg_payload_offset() {
    let mut file = header_block(&pt(0x00), &[tag(0x82, 2), tag(0xA0, 0x10)]);
    file.extend(count_block(1));
    let data_at = file.len() as u64;
    file.extend(data_block(1152, Endian::Little, 2, 0x40));
    file.extend(end_block());

    let stream = recognize(&file).unwrap();
    assert_eq!(stream.coding, CodingKind::MpegLayer3);
    assert_eq!(stream.payload_offset, Some(data_at + 0x0C + 2 * 4));
    assert_eq!(stream.num_samples, 1152);
}

#[test]
fn test_mpeg_rejects_loop_block_before_data() {
    let mut file = header_block(&pt(0x00), &[tag(0xA0, 0x0F)]);
    file.extend(count_block(1));
    file.extend(block(b"SCLl", &[0; 4]));
    file.extend(data_block(1152, Endian::Little, 1, 0x40));
    file.extend(end_block());

    assert!(matches!(
        recognize(&file),
        Err(SchlError::BlockScanAborted { .. })
    ));
}

#[test]
fn test_ps2_adpcm_sample_count() {
    let mut file = header_block(&pt(0x05), &[]);
    file.extend(count_block(2));
    for _ in 0..2 {
        let mut payload = vec![0u8; 8];
        payload.extend(std::iter::repeat_n(0x0C, 0x800));
        file.extend(block(b"SCDl", &payload));
    }
    file.extend(end_block());

    let stream = recognize(&file).unwrap();
    assert_eq!(stream.coding, CodingKind::Psx);
    assert_eq!(stream.version, FormatVersion::V1);
    assert_eq!(stream.channels, 1);
    assert_eq!(stream.num_samples, 2 * (0x800 / 16 * 28));
}

#[test]
fn test_generic_platform() {
    let marker = [b'G', b'S', b'T', b'R', 0x00, 0x00, 0x01, 0x00];
    let mut file = header_block(&marker, &[tag(0x82, 1)]);
    file.extend(count_block(1));
    file.extend(data_block(480, Endian::Big, 1, 0));
    file.extend(end_block());

    let stream = recognize(&file).unwrap();
    assert_eq!(stream.platform, Platform::Generic);
    assert_eq!(stream.sample_rate, 48000);
    assert_eq!(stream.coding, CodingKind::EaXa);
    assert_eq!(stream.codec_variant, 1);
    assert!(stream.big_endian);
    assert_eq!(stream.num_samples, 480);
}

#[test]
fn test_big_endian_header_size() {
    // Header block padded to 0xF4 bytes with its size written big-endian.
    let mut stream = pt(0x03);
    stream.extend(tag(0x84, 11025));
    stream.push(0xFF);
    stream.resize(0xF4 - 8, 0x00);
    let mut file = b"SCHl".to_vec();
    file.extend_from_slice(&0xF4u32.to_be_bytes());
    file.extend(stream);
    file.extend(count_block(1));
    file.extend(data_block(77, Endian::Big, 1, 0));
    file.extend(end_block());

    let stream = recognize(&file).unwrap();
    assert_eq!(stream.platform, Platform::Mac);
    assert_eq!(stream.sample_rate, 11025);
    assert_eq!(stream.body_start, 0xF4);
    assert_eq!(stream.num_samples, 77);
}

#[test]
fn test_leading_field_before_marker() {
    let mut marker = vec![0x00, 0x00, 0x56, 0x22];
    marker.extend(pt(0x01));
    let mut file = header_block(&marker, &[tag(0x82, 2)]);
    file.extend(count_block(1));
    let mut payload = vec![0u8; 8];
    payload.extend(std::iter::repeat_n(0x00, 0x40));
    file.extend(block(b"SCDl", &payload));
    file.extend(end_block());

    let stream = recognize(&file).unwrap();
    assert_eq!(stream.platform, Platform::Psx);
    assert_eq!(stream.coding, CodingKind::Psx);
    assert_eq!(stream.num_samples, 0x40 / 2 / 16 * 28);
}

#[test]
fn test_unknown_platform_is_malformed() {
    let mut file = header_block(&pt(0x04), &[]);
    file.extend(count_block(1));
    file.extend(end_block());

    assert!(matches!(
        recognize(&file),
        Err(SchlError::MalformedHeader(
            HeaderFault::NoDefaultForPlatform { field: "version", .. }
        ))
    ));
}

#[test]
fn test_random_bytes_are_not_this_format() {
    let data: Vec<u8> = (0..512u32).map(|i| (i * 31 % 251) as u8).collect();
    assert!(recognize(&data).unwrap_err().is_not_this_format());
}

#[test]
fn test_shared_file_source_across_threads() {
    let mut file = header_block(&pt(0x07), &[tag(0x82, 2)]);
    file.extend(count_block(1));
    file.extend(data_block(24000, Endian::Little, 2, 16));
    file.extend(end_block());

    let mut tmp = tempfile::Builder::new().suffix(".xsf").tempfile().unwrap();
    tmp.write_all(&file).unwrap();
    tmp.flush().unwrap();

    let source = FileSource::open(tmp.path()).unwrap();
    let recognizer = Recognizer::new();
    let name = tmp.path().to_string_lossy().into_owned();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| recognizer.recognize(&source, &name).unwrap()))
            .collect();
        for handle in handles {
            let stream = handle.join().unwrap();
            assert_eq!(stream.coding, CodingKind::Pcm16Le);
            assert_eq!(stream.sample_rate, 24000);
            assert_eq!(stream.num_samples, 24000);
        }
    });
    assert_eq!(source.size(), file.len() as u64);
}

#[test]
fn test_reader_lists_blocks() {
    let mut file = header_block(&pt(0x00), &[]);
    file.extend(count_block(1));
    file.extend(data_block(10, Endian::Little, 1, 0));
    file.extend(end_block());

    let reader = SchlReader::from_bytes("voice.str", file).unwrap();
    let tags: Vec<String> = reader
        .blocks()
        .map(|b| schl_format::FourCc(b.unwrap().tag).to_string())
        .collect();
    assert_eq!(tags, ["SCHl", "SCCl", "SCDl", "SCEl"]);
    assert!(Path::new(reader.name()).extension().is_some());
}
