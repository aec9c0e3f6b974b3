/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
use memchr::memchr;

/// Expands an RLE-compressed memory block.
///
/// `ED ED count byte` markers expand to `count` repetitions; a lone `0xED`
/// and the byte after it pass through verbatim. A marker truncated by the
/// end of the input terminates the stream.
pub fn decompress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut rest = data;
    loop {
        match memchr(0xED, rest) {
            Some(index) if rest.get(index + 1) == Some(&0xED) => {
                out.extend_from_slice(&rest[..index]);
                match (rest.get(index + 2), rest.get(index + 3)) {
                    (Some(&count), Some(&byte)) => {
                        out.resize(out.len() + count as usize, byte);
                        rest = &rest[index + 4..];
                    }
                    _ => break
                }
            }
            Some(index) => {
                let end = rest.len().min(index + 2);
                out.extend_from_slice(&rest[..end]);
                rest = &rest[end..];
            }
            None => {
                out.extend_from_slice(rest);
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::compress::compress;

    #[test]
    fn markers_expand_to_runs() {
        assert_eq!(decompress(&[0xED, 0xED, 5, 42]), &[42; 5]);
        assert_eq!(decompress(&[7, 0xED, 0xED, 3, 0, 9]), &[7, 0, 0, 0, 9]);
        assert_eq!(decompress(&[0xED, 0xED, 2, 0xED]), &[0xED, 0xED]);
    }

    #[test]
    fn lone_ed_passes_through() {
        assert_eq!(decompress(&[0xED, 69, 1]), &[0xED, 69, 1]);
        assert_eq!(decompress(&[0xED]), &[0xED]);
        // The byte after a lone ED never starts a marker.
        assert_eq!(decompress(&[0xED, 69, 0xED, 0xED, 2, 7]), &[0xED, 69, 7, 7]);
    }

    #[test]
    fn truncated_marker_ends_the_stream() {
        assert_eq!(decompress(&[1, 2, 0xED, 0xED]), &[1, 2]);
        assert_eq!(decompress(&[1, 2, 0xED, 0xED, 3]), &[1, 2]);
        assert_eq!(decompress(&[]), &[] as &[u8]);
    }

    #[test]
    fn expansion_inverts_compression() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..8 {
            let data: Vec<u8> = (0..0x4000)
                .map(|_| if rng.gen_bool(0.5) { rng.gen() } else { 0 })
                .collect();
            assert_eq!(decompress(&compress(&data)), data);
        }
    }
}
