/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
use super::common::MEMORY_V1_TERM;

/// RLE-compresses a memory block.
///
/// A run of five or more equal bytes (two or more for `0xED`) is encoded as
/// `ED ED count byte` with the count capped at 255. The byte following a
/// lone `0xED` is emitted verbatim so that it can never be mistaken for a
/// run marker.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut index = 0;
    while index < data.len() {
        let byte = data[index];
        let run = data[index..].iter()
                               .take_while(|&&b| b == byte)
                               .count()
                               .min(u8::max_value() as usize);
        let min_run = if byte == 0xED { 2 } else { 5 };
        if run >= min_run {
            out.extend_from_slice(&[0xED, 0xED, run as u8, byte]);
            index += run;
        }
        else if byte == 0xED {
            out.push(0xED);
            if let Some(&next) = data.get(index + 1) {
                out.push(next);
                index += 2;
            }
            else {
                index += 1;
            }
        }
        else {
            out.push(byte);
            index += 1;
        }
    }
    out
}

/// Compresses a version 1 memory dump and appends the stream terminator.
pub fn compress_v1(data: &[u8]) -> Vec<u8> {
    let mut out = compress(data);
    out.extend_from_slice(MEMORY_V1_TERM);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_runs_stay_verbatim() {
        assert!(compress(&[]).is_empty());
        assert_eq!(compress(&[42]), &[42]);
        assert_eq!(compress(&[1, 2, 3, 42, 77]), &[1, 2, 3, 42, 77]);
        assert_eq!(compress(&[42, 42, 42, 42]), &[42, 42, 42, 42]);
    }

    #[test]
    fn long_runs_are_encoded() {
        assert_eq!(compress(&[42, 42, 42, 42, 42]), &[0xED, 0xED, 5, 42]);
        assert_eq!(compress(&[7, 42, 42, 42, 42, 42, 7]), &[7, 0xED, 0xED, 5, 42, 7]);
        assert_eq!(compress(&[42; 255]), &[0xED, 0xED, 255, 42]);
        assert_eq!(compress(&[42; 256]), &[0xED, 0xED, 255, 42, 42]);
        assert_eq!(compress(&[42; 1000]),
                   &[0xED, 0xED, 255, 42, 0xED, 0xED, 255, 42,
                     0xED, 0xED, 255, 42, 0xED, 0xED, 235, 42]);
    }

    #[test]
    fn ed_runs_are_encoded_from_two_bytes_up() {
        assert_eq!(compress(&[0xED]), &[0xED]);
        assert_eq!(compress(&[0xED, 0xED]), &[0xED, 0xED, 2, 0xED]);
        assert_eq!(compress(&[69, 0xED, 0xED]), &[69, 0xED, 0xED, 2, 0xED]);
    }

    #[test]
    fn byte_after_a_lone_ed_is_never_a_run_start() {
        assert_eq!(compress(&[0xED, 69, 0xED]), &[0xED, 69, 0xED]);
        assert_eq!(compress(&[0xED, 69, 0xED, 42]), &[0xED, 69, 0xED, 42]);
        // The first 0 is swallowed by the lone ED, leaving a run of four.
        assert_eq!(compress(&[0xED, 0, 0, 0, 0, 0, 1]),
                   &[0xED, 0, 0, 0, 0, 0, 1]);
        assert_eq!(compress(&[0xED, 0, 0, 0, 0, 0, 0, 1]),
                   &[0xED, 0, 0xED, 0xED, 5, 0, 1]);
    }

    #[test]
    fn v1_stream_carries_the_terminator() {
        assert_eq!(compress_v1(&[1, 2]), &[1, 2, 0, 0xED, 0xED, 0]);
    }
}
