//! DNS message codec
//!
//! Encodes [`Message`] values to wire format, and provides Decoder and
//! Encoder implementations for tokio_util so messages can be framed over
//! UDP sockets.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::errors::{DnsCodecError, ResultExt};
use crate::name::encode_name;
use crate::parsers::parse_dns_packet;
use crate::protocol::{
    Header, Message, Question, ResourceRecord, AA_MASK, AD_MASK, CD_MASK, HEADER_LENGTH,
    OPCODE_MASK, OPCODE_SHIFT, QR_MASK, RA_MASK, RCODE_MASK, RD_MASK, TC_MASK,
};

/// Decodes a complete DNS message from a datagram.
pub fn decode_message(buf: &[u8]) -> Result<Message, DnsCodecError> {
    parse_dns_packet(buf)
}

/// Encodes a message. Section counts always come from the section lengths.
pub fn encode_message(message: &Message) -> Result<BytesMut, DnsCodecError> {
    let mut dst = BytesMut::with_capacity(512);
    encode_into(message, &mut dst).context("encode packet")?;
    Ok(dst)
}

impl Message {
    pub fn decode(buf: &[u8]) -> Result<Message, DnsCodecError> {
        decode_message(buf)
    }

    pub fn encode(&self) -> Result<BytesMut, DnsCodecError> {
        encode_message(self)
    }
}

fn encode_into(message: &Message, dst: &mut BytesMut) -> Result<(), DnsCodecError> {
    encode_header(&message.header, dst);

    for count in [
        message.questions.len(),
        message.answers.len(),
        message.authorities.len(),
        message.additional.len(),
    ] {
        let count = u16::try_from(count).map_err(|_| DnsCodecError::Oversized {
            what: "section count",
            size: count,
        })?;
        dst.put_u16(count);
    }

    for (i, question) in message.questions.iter().enumerate() {
        encode_question(question, dst).with_context(|| format!("questions[{}]", i))?;
    }

    for (section, records) in [
        ("answers", &message.answers),
        ("authorities", &message.authorities),
        ("additional", &message.additional),
    ] {
        for (i, record) in records.iter().enumerate() {
            encode_resource_record(record, dst).with_context(|| format!("{}[{}]", section, i))?;
        }
    }

    Ok(())
}

/// Encode the ID and flag bytes of the header
fn encode_header(header: &Header, dst: &mut BytesMut) {
    dst.reserve(HEADER_LENGTH);
    dst.put_u16(header.id);

    let mut flags1: u8 = 0;
    if header.is_response {
        flags1 |= QR_MASK;
    }
    flags1 |= (u8::from(header.opcode) << OPCODE_SHIFT) & OPCODE_MASK;
    if header.authoritative {
        flags1 |= AA_MASK;
    }
    if header.truncated {
        flags1 |= TC_MASK;
    }
    if header.recursion_desired {
        flags1 |= RD_MASK;
    }

    let mut flags2: u8 = 0;
    if header.recursion_available {
        flags2 |= RA_MASK;
    }
    if header.authentic_data {
        flags2 |= AD_MASK;
    }
    if header.checking_disabled {
        flags2 |= CD_MASK;
    }
    flags2 |= u8::from(header.response_code) & RCODE_MASK;

    dst.put_u8(flags1);
    dst.put_u8(flags2);
}

fn encode_question(question: &Question, dst: &mut BytesMut) -> Result<(), DnsCodecError> {
    encode_name(&question.name, dst).context("name")?;
    dst.put_u16(question.qtype.into());
    dst.put_u16(question.qclass.into());
    Ok(())
}

fn encode_resource_record(
    record: &ResourceRecord,
    dst: &mut BytesMut,
) -> Result<(), DnsCodecError> {
    encode_name(&record.name, dst).context("name")?;

    let mut rdata = Vec::new();
    record.rdata.encode(&mut rdata).context("rdata")?;
    let rdata_length = u16::try_from(rdata.len()).map_err(|_| DnsCodecError::Oversized {
        what: "rdata length",
        size: rdata.len(),
    })?;

    dst.put_u16(record.rtype().into());
    dst.put_u16(record.class.into());
    dst.put_u32(record.ttl);
    dst.put_u16(rdata_length);
    dst.put_slice(&rdata);
    Ok(())
}

/// DNS message codec for use with tokio_util framed streams
#[derive(Debug, Default)]
pub struct DnsCodec;

impl DnsCodec {
    /// Create a new DNS codec instance
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for DnsCodec {
    type Item = Message;
    type Error = DnsCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        // Each datagram is one message. It is consumed whole, even when it
        // fails to decode, so a framed stream moves on to the next one.
        let datagram = src.split();
        debug!("DnsCodec::decode called with {} bytes", datagram.len());

        decode_message(&datagram).map(Some)
    }
}

impl Encoder<Message> for DnsCodec {
    type Error = DnsCodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        debug!("DnsCodec::encode called for packet ID {}", item.header.id);

        let encoded = encode_message(&item)?;
        dst.extend_from_slice(&encoded);
        Ok(())
    }
}
