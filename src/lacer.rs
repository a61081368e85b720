//! Handler for lacing and delacing operations on frame data.

use crate::Error;

/// Handler for lacing and delacing operations on frame data.
pub enum Lacer {
    /// Xiph lacing (variable-size frames with size prefixes)
    Xiph,
    /// Fixed-size lacing (all frames have the same size)
    FixedSize,
    /// EBML lacing (variable-size frames with EBML-encoded sizes)
    Ebml,
}

impl Lacer {
    /// Encode multiple frames into a single laced block
    pub fn lace(&self, frames: &[&[u8]]) -> Vec<u8> {
        match self {
            Lacer::Xiph => {
                if frames.is_empty() {
                    return vec![];
                }
                let num_frames = frames.len();
                let mut output = vec![];
                output.push((num_frames - 1) as u8); // Number of frames - 1
                for frame in &frames[..num_frames - 1] {
                    let mut size = frame.len();
                    while size >= 0xFF {
                        output.push(0xFF);
                        size -= 0xFF;
                    }
                    output.push(size as u8);
                }
                for frame in frames {
                    output.extend_from_slice(frame);
                }
                output
            }
            Lacer::FixedSize => {
                if frames.is_empty() {
                    return vec![];
                }
                let num_frames = frames.len();
                let mut output = vec![(num_frames - 1) as u8];
                for frame in frames {
                    output.extend_from_slice(frame);
                }
                output
            }
            Lacer::Ebml => {
                if frames.is_empty() {
                    return vec![];
                }
                let num_frames = frames.len();
                let mut output = vec![(num_frames - 1) as u8];
                output.extend(encode_uvint(frames[0].len() as u64));
                let mut prev_size = frames[0].len() as i64;
                for frame in &frames[1..num_frames - 1] {
                    let size = frame.len() as i64;
                    output.extend(encode_svint(size - prev_size));
                    prev_size = size;
                }
                for frame in frames {
                    output.extend_from_slice(frame);
                }
                output
            }
        }
    }

    /// Decode a laced block into individual frames
    pub fn delace<'a>(&self, data: &'a [u8]) -> crate::Result<Vec<&'a [u8]>> {
        // TODO(perf): avoid heap allocations ideally
        // we should be able to return a `impl Iterator<Item = crate::Result<&'a [u8]>>` here
        // can make it work using nightly features like `generators`.
        // but not sure how to do that with the current stable Rust.

        match self {
            Lacer::Xiph => {
                if data.is_empty() {
                    return Ok(vec![]);
                }

                let num_frames = data[0] as usize + 1;
                if num_frames == 1 {
                    return Ok(vec![&data[1..]]);
                }
                let mut out = Vec::with_capacity(num_frames);

                let data_start_pos = data
                    .iter()
                    .enumerate()
                    .skip(1)
                    .filter(|(_, b)| **b != 0xFF)
                    .nth(num_frames - 2)
                    .map(|(i, _)| i)
                    .ok_or(Error::MalformedLacingData)?
                    + 1;

                let laced_data = data
                    .get(data_start_pos..)
                    .ok_or(Error::MalformedLacingData)?;

                let mut start = 0;
                for size in data[1..data_start_pos]
                    .split_inclusive(|b| *b != 0xFF)
                    .map(|chunk| chunk.iter().map(|b| *b as usize).sum::<usize>())
                {
                    out.push(
                        laced_data
                            .get(start..start + size)
                            .ok_or(Error::MalformedLacingData)?,
                    );
                    start += size;
                }
                out.push(laced_data.get(start..).ok_or(Error::MalformedLacingData)?);
                Ok(out)
            }
            Lacer::FixedSize => {
                if data.is_empty() {
                    return Ok(vec![]);
                }
                let num_frames = data[0] as usize + 1;
                let rest = &data[1..];
                if rest.len() % num_frames != 0 {
                    return Err(Error::MalformedLacingData);
                }
                let frame_size = rest.len() / num_frames;
                Ok(rest.chunks(frame_size).collect())
            }
            Lacer::Ebml => {
                if data.is_empty() {
                    return Ok(vec![]);
                }
                let num_frames = data[0] as usize + 1;
                if num_frames == 1 {
                    return Ok(vec![&data[1..]]);
                }

                let mut pos = 1;
                let (first_size, len) =
                    decode_uvint(data.get(pos..).ok_or(Error::MalformedLacingData)?)?;
                pos += len;

                let mut sizes = Vec::with_capacity(num_frames - 1);
                let mut prev = first_size as i64;
                sizes.push(prev);
                for _ in 0..num_frames - 2 {
                    let (delta, len) =
                        decode_svint(data.get(pos..).ok_or(Error::MalformedLacingData)?)?;
                    pos += len;
                    prev += delta;
                    sizes.push(prev);
                }

                let laced_data = data.get(pos..).ok_or(Error::MalformedLacingData)?;
                let mut out = Vec::with_capacity(num_frames);
                let mut start = 0usize;
                for size in &sizes {
                    let size = *size as usize;
                    out.push(
                        laced_data
                            .get(start..start + size)
                            .ok_or(Error::MalformedLacingData)?,
                    );
                    start += size;
                }
                out.push(laced_data.get(start..).ok_or(Error::MalformedLacingData)?);
                Ok(out)
            }
        }
    }
}

/// Minimal byte length of an EBML-lacing unsigned VInt encoding `value`.
///
/// Unlike `VInt64`, lacing VInts never need to represent "unknown size", so
/// there is no 127-byte special case here.
fn uvint_len(value: u64) -> usize {
    let total_bits = 64 - value.leading_zeros() as usize;
    total_bits.div_ceil(7).max(1)
}

fn encode_uvint(value: u64) -> Vec<u8> {
    let len = uvint_len(value);
    let mut buf = vec![0u8; len];
    buf.copy_from_slice(&value.to_be_bytes()[8 - len..]);
    buf[0] |= 1u8 << (8 - len);
    buf
}

/// Decodes a leading EBML-lacing unsigned VInt from `data`, returning the
/// value and the number of bytes it occupied.
fn decode_uvint(data: &[u8]) -> crate::Result<(u64, usize)> {
    let first = *data.first().ok_or(Error::MalformedLacingData)?;
    let len = first.leading_zeros() as usize + 1;
    if len > 8 || data.len() < len {
        return Err(Error::MalformedLacingData);
    }
    let mut bytes = [0u8; 8];
    bytes[8 - len..].copy_from_slice(&data[..len]);
    bytes[8 - len] &= 0xFF >> len;
    Ok((u64::from_be_bytes(bytes), len))
}

/// Bias used by EBML lacing's signed VInt: the value `v` is stored as the
/// unsigned VInt `v + bias(len)`, where `bias(len) = 2^(7*len - 1) - 1`. The
/// encoded length is the smallest one whose bias can represent `v`.
fn svint_bias(len: usize) -> i64 {
    (1i64 << (7 * len - 1)) - 1
}

fn encode_svint(value: i64) -> Vec<u8> {
    let mut len = 1usize;
    while value < -svint_bias(len) || value > svint_bias(len) {
        len += 1;
    }
    encode_uvint((value + svint_bias(len)) as u64)
}

fn decode_svint(data: &[u8]) -> crate::Result<(i64, usize)> {
    let (biased, len) = decode_uvint(data)?;
    Ok((biased as i64 - svint_bias(len), len))
}

// The Xiph lacing uses the same coding of size as found in the Ogg container [@?RFC3533]. The bits 5-6 of the Block Header flags are set to 01.
// The Block data with laced frames is stored as follows:
//     Lacing Head on 1 Octet: Number of frames in the lace minus 1.
//     Lacing size of each frame except the last one.
//     Binary data of each frame consecutively.
// The lacing size is split into 255 values, stored as unsigned octets – for example, 500 is coded 255;245 or [0xFF 0xF5]. A frame with a size multiple of 255 is coded with a 0 at the end of the size – for example, 765 is coded 255;255;255;0 or [0xFF 0xFF 0xFF 0x00].
// The size of the last frame is deduced from the size remaining in the Block after the other frames.
#[cfg(test)]
mod lacer_tests {
    use super::*;
    #[test]
    fn test_xiph_lacing() {
        // 0 frames
        let laced = Lacer::Xiph.lace(&[]);
        assert_eq!(laced, vec![]);
        let frames: Vec<_> = Lacer::Xiph.delace(&[]).unwrap();
        assert_eq!(frames.len(), 0);

        // 4 frames, sizes: 255, 256, 1, remaining
        let len = vec![0x03, 0xFF, 0x00, 0xFF, 0x1, 0x1];
        let frame0 = vec![2u8; 255];
        let frame1 = vec![42u8; 256];
        let frame2 = vec![38u8; 1];
        let frame3 = vec![100u8; 1];

        let laced = Lacer::Xiph.lace(&[&frame0, &frame1, &frame2, &frame3]);
        let data = [len, frame0, frame1, frame2, frame3].concat();
        assert_eq!(laced, data);

        let frames: Vec<_> = Lacer::Xiph.delace(&data).unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], &[2u8; 255]);
        assert_eq!(frames[1], &[42u8; 256]);
        assert_eq!(frames[2], &[38u8; 1]);
        assert_eq!(frames[3], &[100u8; 1]);

        // 1 frame, size: remaining
        let len = vec![0x00];
        let frame0 = vec![2u8; 255];

        let laced = Lacer::Xiph.lace(&[&frame0]);
        let data = [len, frame0].concat();
        assert_eq!(laced, data);

        let frames: Vec<_> = Lacer::Xiph.delace(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], &[2u8; 255]);

        // 2 frames, sizes: 32, remaining
        let len = vec![0x01, 0x20];
        let frame0 = vec![2u8; 32];
        let frame1 = vec![42u8; 256];

        let laced = Lacer::Xiph.lace(&[&frame0, &frame1]);
        let data = [len, frame0, frame1].concat();
        assert_eq!(laced, data);

        let frames: Vec<_> = Lacer::Xiph.delace(&data).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], &[2u8; 32]);
        assert_eq!(frames[1], &[42u8; 256]);

        // 4 frames, sizes: 600, 3, 520, remaining
        let len = vec![0x03, 0xFF, 0xFF, 0x5A, 0x3, 0xFF, 0xFF, 0xA];
        assert_eq!(0xff + 0xff + 0x5A, 600);
        assert_eq!(0xff + 0xff + 0xA, 520);
        let frame0 = vec![2u8; 600];
        let frame1 = vec![42u8; 3];
        let frame2 = vec![38u8; 520];
        let frame3 = vec![100u8; 1];

        let laced = Lacer::Xiph.lace(&[&frame0, &frame1, &frame2, &frame3]);
        let data = [len, frame0, frame1, frame2, frame3].concat();
        assert_eq!(laced, data);

        let frames: Vec<_> = Lacer::Xiph.delace(&data).unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], &[2u8; 600]);
        assert_eq!(frames[1], &[42u8; 3]);
        assert_eq!(frames[2], &[38u8; 520]);
        assert_eq!(frames[3], &[100u8; 1]);
    }

    #[test]
    fn test_fixed_size_lacing() {
        let laced = Lacer::FixedSize.lace(&[]);
        assert_eq!(laced, vec![]);
        assert_eq!(Lacer::FixedSize.delace(&[]).unwrap().len(), 0);

        let frame0 = vec![1u8; 40];
        let frame1 = vec![2u8; 40];
        let frame2 = vec![3u8; 40];
        let laced = Lacer::FixedSize.lace(&[&frame0, &frame1, &frame2]);
        assert_eq!(laced[0], 2); // 3 frames - 1
        assert_eq!(laced.len(), 1 + 3 * 40);

        let frames = Lacer::FixedSize.delace(&laced).unwrap();
        assert_eq!(frames, vec![frame0.as_slice(), frame1.as_slice(), frame2.as_slice()]);
    }

    #[test]
    fn test_fixed_size_delacing_uneven_errors() {
        let data = vec![1u8, 0, 0, 0]; // 2 frames claimed, 3 bytes remain
        assert!(Lacer::FixedSize.delace(&data).is_err());
    }

    #[test]
    fn test_ebml_lacing_roundtrip() {
        let laced = Lacer::Ebml.lace(&[]);
        assert_eq!(laced, vec![]);
        assert_eq!(Lacer::Ebml.delace(&[]).unwrap().len(), 0);

        // single frame: just the header byte plus raw data, no size at all.
        let frame0 = vec![9u8; 12];
        let laced = Lacer::Ebml.lace(&[&frame0]);
        assert_eq!(laced, [vec![0u8], frame0.clone()].concat());
        let frames = Lacer::Ebml.delace(&laced).unwrap();
        assert_eq!(frames, vec![frame0.as_slice()]);

        // varying sizes, including a delta that forces a 2-byte signed VInt.
        let frame0 = vec![1u8; 10];
        let frame1 = vec![2u8; 10 + 200];
        let frame2 = vec![3u8; 5];
        let frame3 = vec![4u8; 33];
        let frames_in = [&frame0[..], &frame1[..], &frame2[..], &frame3[..]];

        let laced = Lacer::Ebml.lace(&frames_in);
        let frames_out = Lacer::Ebml.delace(&laced).unwrap();
        assert_eq!(frames_out, frames_in);
    }

    #[test]
    fn test_svint_roundtrip() {
        for value in [-8064i64, -64, -1, 0, 1, 63, 64, 8063, 8064, 1_000_000] {
            let encoded = encode_svint(value);
            let (decoded, len) = decode_svint(&encoded).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(len, encoded.len());
        }
    }

    #[test]
    fn test_uvint_roundtrip() {
        for value in [0u64, 1, 126, 127, 128, 16383, 16384, 1_000_000] {
            let encoded = encode_uvint(value);
            let (decoded, len) = decode_uvint(&encoded).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(len, encoded.len());
        }
    }
}
