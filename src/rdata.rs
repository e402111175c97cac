//! Type-specific RDATA payloads.

use std::fmt;
use std::net::Ipv4Addr;

use bytes::BufMut;

use crate::errors::{DnsCodecError, ResultExt};
use crate::name::{decode_name, encode_name};
use crate::protocol::ResourceType;
use crate::scanner::Scanner;

/// Fields of an SOA record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    pub primary_name: String,
    pub responsible_name: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum_ttl: u32,
}

/// The payload of a resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    /// All character-strings of the record, concatenated. The bytes are
    /// kept as received; they need not be UTF-8.
    Txt(Vec<u8>),
    Soa(Soa),
    /// Payload of a type without a dedicated representation, kept verbatim.
    Raw {
        rtype: ResourceType,
        payload: Vec<u8>,
    },
}

impl RData {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            RData::A(_) => ResourceType::A,
            RData::Txt(_) => ResourceType::TXT,
            RData::Soa(_) => ResourceType::SOA,
            RData::Raw { rtype, .. } => *rtype,
        }
    }

    /// Writes the RDATA payload, without the RDLENGTH prefix.
    pub fn encode<B: BufMut>(&self, dst: &mut B) -> Result<(), DnsCodecError> {
        match self {
            RData::A(address) => dst.put_slice(&address.octets()),
            RData::Txt(text) => {
                // A single character-string; texts over 255 bytes are not split.
                let length = u8::try_from(text.len()).map_err(|_| DnsCodecError::Oversized {
                    what: "TXT string",
                    size: text.len(),
                })?;
                dst.put_u8(length);
                dst.put_slice(text);
            }
            RData::Soa(soa) => {
                encode_name(&soa.primary_name, dst).context("mname")?;
                encode_name(&soa.responsible_name, dst).context("rname")?;
                dst.put_u32(soa.serial);
                dst.put_u32(soa.refresh);
                dst.put_u32(soa.retry);
                dst.put_u32(soa.expire);
                dst.put_u32(soa.minimum_ttl);
            }
            RData::Raw { payload, .. } => dst.put_slice(payload),
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DnsCodecError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(address) => write!(f, "{}", address),
            RData::Txt(text) => f.write_str(&String::from_utf8_lossy(text)),
            RData::Soa(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.primary_name,
                soa.responsible_name,
                soa.serial,
                soa.refresh,
                soa.retry,
                soa.expire,
                soa.minimum_ttl
            ),
            RData::Raw { payload, .. } => {
                let bytes: Vec<String> = payload.iter().map(|b| b.to_string()).collect();
                write!(f, "[{}]", bytes.join(", "))
            }
        }
    }
}

/// Decodes `rdata_length` bytes of RDATA for `rtype` at the scanner's cursor.
///
/// Only A, TXT and SOA are understood; any other type is rejected with
/// [`DnsCodecError::UnsupportedResourceType`] before anything is consumed.
pub fn decode_rdata(
    scanner: &mut Scanner<'_>,
    rtype: ResourceType,
    rdata_length: u16,
) -> Result<RData, DnsCodecError> {
    match rtype {
        ResourceType::A => Ok(RData::A(Ipv4Addr::from(scanner.read_u32()?))),
        ResourceType::TXT => decode_txt(scanner, usize::from(rdata_length)),
        ResourceType::SOA => {
            let primary_name = decode_name(scanner).context("mname")?;
            let responsible_name = decode_name(scanner).context("rname")?;
            Ok(RData::Soa(Soa {
                primary_name,
                responsible_name,
                serial: scanner.read_u32().context("serial")?,
                refresh: scanner.read_u32().context("refresh")?,
                retry: scanner.read_u32().context("retry")?,
                expire: scanner.read_u32().context("expire")?,
                minimum_ttl: scanner.read_u32().context("minimum")?,
            }))
        }
        other => Err(DnsCodecError::UnsupportedResourceType(other)),
    }
}

// TXT RDATA is one or more character-strings filling exactly rdata_length.
fn decode_txt(scanner: &mut Scanner<'_>, rdata_length: usize) -> Result<RData, DnsCodecError> {
    let mut text = Vec::with_capacity(rdata_length);
    let mut consumed = 0;

    while consumed < rdata_length {
        let position = scanner.position();
        let length = usize::from(scanner.read_u8()?);
        if consumed + 1 + length > rdata_length {
            return Err(DnsCodecError::Truncated {
                position,
                needed: 1 + length,
                available: rdata_length - consumed,
            });
        }
        text.extend_from_slice(scanner.read_bytes(length)?);
        consumed += 1 + length;
    }

    Ok(RData::Txt(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(buf: &[u8], rtype: ResourceType) -> Result<(RData, usize), DnsCodecError> {
        let mut sc = Scanner::new(buf);
        let rdata = decode_rdata(&mut sc, rtype, buf.len() as u16)?;
        Ok((rdata, sc.position()))
    }

    #[test]
    fn test_decode_a_record() {
        let (rdata, next) = decode(&[142, 250, 196, 110], ResourceType::A).unwrap();
        assert_eq!(rdata, RData::A(Ipv4Addr::new(142, 250, 196, 110)));
        assert_eq!(next, 4);
        assert_eq!(rdata.to_string(), "142.250.196.110");
    }

    #[test]
    fn test_decode_short_a_record() {
        assert!(matches!(
            decode(&[10, 0, 0], ResourceType::A),
            Err(DnsCodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_txt_multiple_strings() {
        let (rdata, next) = decode(b"\x03abc\x02de", ResourceType::TXT).unwrap();
        assert_eq!(rdata, RData::Txt(b"abcde".to_vec()));
        assert_eq!(next, 7);
    }

    #[test]
    fn test_txt_keeps_non_utf8_bytes() {
        let wire = [2, 0xFF, 0xFE];
        let (rdata, next) = decode(&wire, ResourceType::TXT).unwrap();

        assert_eq!(rdata, RData::Txt(vec![0xFF, 0xFE]));
        assert_eq!(next, 3);
        assert_eq!(rdata.to_bytes().unwrap(), wire.to_vec());
        assert_eq!(rdata.to_string(), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_decode_txt_empty() {
        let mut sc = Scanner::new(&[]);
        let rdata = decode_rdata(&mut sc, ResourceType::TXT, 0).unwrap();
        assert_eq!(rdata, RData::Txt(Vec::new()));
    }

    #[test]
    fn test_decode_txt_string_overruns_rdata() {
        // RDLENGTH says 4 but the second string claims 5 bytes
        let mut sc = Scanner::new(b"\x02ab\x05cdefg");
        let err = decode_rdata(&mut sc, ResourceType::TXT, 4).unwrap_err();
        assert!(matches!(err, DnsCodecError::Truncated { position: 3, .. }));
    }

    #[test]
    fn test_decode_txt_past_buffer_end() {
        let mut sc = Scanner::new(b"\x05ab");
        let err = decode_rdata(&mut sc, ResourceType::TXT, 6).unwrap_err();
        assert!(matches!(err, DnsCodecError::Truncated { .. }));
    }

    #[test]
    fn test_soa_round_trip_keeps_large_values() {
        let soa = RData::Soa(Soa {
            primary_name: "ns1.example.com.".to_string(),
            responsible_name: "hostmaster.example.com.".to_string(),
            serial: 2024_01_01_00,
            refresh: 0x8000_0000,
            retry: 7200,
            expire: u32::MAX,
            minimum_ttl: 0xFFFF_FFFE,
        });

        let bytes = soa.to_bytes().unwrap();
        let (decoded, next) = decode(&bytes, ResourceType::SOA).unwrap();
        assert_eq!(decoded, soa);
        assert_eq!(next, bytes.len());
    }

    #[test]
    fn test_decode_truncated_soa() {
        let soa = RData::Soa(Soa {
            primary_name: "a.".to_string(),
            responsible_name: "b.".to_string(),
            serial: 1,
            refresh: 2,
            retry: 3,
            expire: 4,
            minimum_ttl: 5,
        });
        let bytes = soa.to_bytes().unwrap();

        let err = decode(&bytes[..bytes.len() - 2], ResourceType::SOA).unwrap_err();
        assert!(matches!(err.root_cause(), DnsCodecError::Truncated { .. }));
        assert!(err.to_string().starts_with("minimum: "));
    }

    #[test]
    fn test_decode_unsupported_type() {
        let mut sc = Scanner::new(&[1, 2, 3]);
        let err = decode_rdata(&mut sc, ResourceType(99), 3).unwrap_err();
        assert!(matches!(
            err,
            DnsCodecError::UnsupportedResourceType(ResourceType(99))
        ));
        assert_eq!(sc.position(), 0);
    }

    #[test]
    fn test_encode_payloads() {
        assert_eq!(
            RData::A(Ipv4Addr::new(192, 168, 1, 1)).to_bytes().unwrap(),
            vec![192, 168, 1, 1]
        );
        assert_eq!(
            RData::Txt(b"hello".to_vec()).to_bytes().unwrap(),
            b"\x05hello".to_vec()
        );

        let raw = RData::Raw {
            rtype: ResourceType::AAAA,
            payload: vec![1, 2, 3],
        };
        assert_eq!(raw.resource_type(), ResourceType::AAAA);
        assert_eq!(raw.to_bytes().unwrap(), vec![1, 2, 3]);
        assert_eq!(raw.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_encode_long_txt_is_rejected() {
        let err = RData::Txt(vec![b'x'; 256]).to_bytes().unwrap_err();
        assert!(matches!(
            err,
            DnsCodecError::Oversized {
                what: "TXT string",
                size: 256
            }
        ));
        assert_eq!(RData::Txt(vec![b'x'; 255]).to_bytes().unwrap().len(), 256);
    }

    #[test]
    fn test_encode_soa_with_bad_name() {
        let soa = RData::Soa(Soa {
            primary_name: "bad..name".to_string(),
            responsible_name: "ok.".to_string(),
            serial: 0,
            refresh: 0,
            retry: 0,
            expire: 0,
            minimum_ttl: 0,
        });
        let err = soa.to_bytes().unwrap_err();
        assert!(matches!(err.root_cause(), DnsCodecError::InvalidDomain(_)));
    }
}
