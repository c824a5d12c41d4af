use super::FetchError;
use bytes::Bytes;
use miniz_oxide::inflate::TINFLStatus;

const MAGIC: [u8; 2] = [0x1f, 0x8b];
const DEFLATE: u8 = 8;

// header flags
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;

/// Inflate a single-member gzip body, refusing to produce more than `limit` bytes.
///
/// The trailer's ISIZE is checked against the inflated length. Its CRC32 is not verified.
pub(crate) fn decompress(input: &[u8], limit: u64) -> Result<Bytes, FetchError> {
    let members = strip_header(input)?;
    if members.len() < 8 {
        return Err(truncated());
    }
    let (deflated, trailer) = members.split_at(members.len() - 8);

    let max_size = usize::try_from(limit).unwrap_or(usize::MAX);
    let output = miniz_oxide::inflate::decompress_to_vec_with_limit(deflated, max_size)
        .map_err(|status| match status {
            TINFLStatus::HasMoreOutput => FetchError::TooLarge(limit),
            status => FetchError::Gzip(format!("inflate failed: {:?}", status)),
        })?;

    let isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
    if isize != output.len() as u32 {
        return Err(FetchError::Gzip(format!(
            "length mismatch: trailer says {}, inflated {}",
            isize,
            output.len()
        )));
    }

    log::trace!("inflated {} -> {}", input.len(), output.len());
    Ok(Bytes::from(output))
}

fn truncated() -> FetchError {
    FetchError::Gzip("truncated".to_string())
}

fn strip_header(input: &[u8]) -> Result<&[u8], FetchError> {
    if input.len() < 10 {
        return Err(truncated());
    }
    if input[0..2] != MAGIC {
        return Err(FetchError::Gzip("not gzip data".to_string()));
    }
    if input[2] != DEFLATE {
        return Err(FetchError::Gzip(format!(
            "unsupported compression method {}",
            input[2]
        )));
    }

    let flags = input[3];
    // skip mtime, extra flags, OS
    let mut rest = &input[10..];

    if flags & FEXTRA != 0 {
        if rest.len() < 2 {
            return Err(truncated());
        }
        let len = u16::from_le_bytes([rest[0], rest[1]]) as usize;
        rest = rest.get(2 + len..).ok_or_else(truncated)?;
    }
    for flag in [FNAME, FCOMMENT] {
        if flags & flag != 0 {
            let end = rest.iter().position(|&b| b == 0).ok_or_else(truncated)?;
            rest = &rest[end + 1..];
        }
    }
    if flags & FHCRC != 0 {
        rest = rest.get(2..).ok_or_else(truncated)?;
    }

    Ok(rest)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    static GZIP_HEADER: &[u8] = &[
        0x1f, 0x8b, // gzip magic
        8,    // deflate
        0,    // flags
        0, 0, 0, 0,   // mtime
        0,   // extra flags
        255, // unknown OS
    ];

    /// Wrap `input` in a gzip member with a zeroed CRC.
    pub(crate) fn gzip(input: &[u8]) -> Vec<u8> {
        let mut output = GZIP_HEADER.to_vec();
        output.extend(miniz_oxide::deflate::compress_to_vec(input, 6));
        output.extend_from_slice(&[0, 0, 0, 0]);
        output.extend_from_slice(&(input.len() as u32).to_le_bytes());
        output
    }

    #[test]
    fn round_trip() {
        let text = b"<feed xmlns=\"http://www.w3.org/2005/Atom\"></feed>".repeat(20);
        let inflated = decompress(&gzip(&text), 1 << 20).unwrap();
        assert_eq!(&inflated[..], &text[..]);
    }

    #[test]
    fn named_member() {
        let plain = gzip(b"hello");
        let mut named = plain[..10].to_vec();
        named[3] = FNAME;
        named.extend_from_slice(b"us.atom\0");
        named.extend_from_slice(&plain[10..]);
        assert_eq!(&decompress(&named, 100).unwrap()[..], b"hello");
    }

    #[test]
    fn limit_applies_to_inflated_size() {
        let text = vec![b'a'; 4096];
        let compressed = gzip(&text);
        assert!(compressed.len() < 100);
        assert!(matches!(
            decompress(&compressed, 1000),
            Err(FetchError::TooLarge(1000))
        ));
    }

    #[test]
    fn only_isize_is_checked() {
        let mut member = gzip(b"hello");
        let n = member.len();
        member[n - 8..n - 4].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&decompress(&member, 100).unwrap()[..], b"hello");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decompress(b"<alert/>", 100), Err(FetchError::Gzip(_))));
        assert!(matches!(decompress(&[0x1f, 0x8b, 8], 100), Err(FetchError::Gzip(_))));

        let mut wrong_length = gzip(b"hello");
        let n = wrong_length.len();
        wrong_length[n - 4] = 9;
        assert!(matches!(decompress(&wrong_length, 100), Err(FetchError::Gzip(_))));
    }
}
