//! Domain name encoding and decoding.
//!
//! Names are decoded into dotted strings that always end in `.`, following
//! compression pointers anywhere a label may start. Encoding never emits
//! compression pointers.

use std::collections::HashSet;

use bytes::BufMut;

use crate::errors::DnsCodecError;
use crate::scanner::Scanner;

/// Top two bits of a length byte that mark a compression pointer.
pub const POINTER_FLAG: u8 = 0b1100_0000;
/// Low six bits of the first pointer byte, the high part of the offset.
pub const POINTER_HEAD: u8 = 0b0011_1111;
pub const MAX_LABEL_LENGTH: usize = 63;

/// Decodes the name starting at the scanner's cursor.
///
/// The cursor ends up just past the terminating zero byte, or two bytes past
/// the first compression pointer. Every position a pointer jumps to is
/// remembered, so a pointer loop fails with [`DnsCodecError::RecursiveName`]
/// instead of spinning.
pub fn decode_name(scanner: &mut Scanner<'_>) -> Result<String, DnsCodecError> {
    let start = scanner.position();
    let mut visited = HashSet::from([start]);
    let mut labels: Vec<String> = Vec::new();
    let mut pos = start;
    let mut consumed = None;

    loop {
        let length = scanner
            .peek_at(pos)
            .map_err(|_| DnsCodecError::InvalidDomain(format!("name runs past end at {}", pos)))?;

        if length & POINTER_FLAG == POINTER_FLAG {
            let low = scanner.peek_at(pos + 1).map_err(|_| {
                DnsCodecError::InvalidDomain(format!("pointer at {} is cut short", pos))
            })?;
            let target = (usize::from(length & POINTER_HEAD) << 8) | usize::from(low);
            if target >= scanner.len() {
                return Err(DnsCodecError::InvalidNameIndex {
                    offset: target,
                    length: scanner.len(),
                });
            }
            consumed.get_or_insert(pos + 2 - start);
            if !visited.insert(target) {
                return Err(DnsCodecError::RecursiveName { position: target });
            }
            pos = target;
            continue;
        }

        let length = usize::from(length);
        if length == 0 {
            consumed.get_or_insert(pos + 1 - start);
            break;
        }
        if length > MAX_LABEL_LENGTH {
            return Err(DnsCodecError::InvalidDomain(format!(
                "unknown label type 0x{:02x} at {}",
                length, pos
            )));
        }

        let label = scanner.peek_bytes_at(pos + 1, length).map_err(|err| {
            DnsCodecError::InvalidDomain(format!("label at {}: {}", pos, err))
        })?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += 1 + length;
    }

    scanner.skip(consumed.unwrap_or_default());
    Ok(join_labels(&labels))
}

fn join_labels(labels: &[String]) -> String {
    if labels.is_empty() {
        return ".".to_string();
    }
    let mut name = String::with_capacity(labels.iter().map(|l| l.len() + 1).sum());
    for label in labels {
        name.push_str(label);
        name.push('.');
    }
    name
}

/// Encodes a domain name as length-prefixed labels terminated by a zero byte.
///
/// `""` and `"."` encode to the root name. A single trailing dot is ignored.
/// Nothing is written unless every label is valid.
pub fn encode_name<B: BufMut>(domain: &str, dst: &mut B) -> Result<(), DnsCodecError> {
    if domain.is_empty() || domain == "." {
        dst.put_u8(0);
        return Ok(());
    }

    let labels: Vec<&str> = domain.strip_suffix('.').unwrap_or(domain).split('.').collect();
    for label in &labels {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
            return Err(DnsCodecError::InvalidDomain(format!(
                "invalid label length(label={:?}, length={}) in {:?}",
                label,
                label.len(),
                domain
            )));
        }
    }

    for label in labels {
        dst.put_u8(label.len() as u8);
        dst.put_slice(label.as_bytes());
    }
    dst.put_u8(0);
    Ok(())
}
