// Decode DNS messages from a received buffer

use crate::errors::{DnsCodecError, ResultExt};
use crate::name::decode_name;
use crate::protocol::{
    Header, Message, Question, ResourceRecord, ResourceType, AA_MASK, AD_MASK, CD_MASK,
    HEADER_LENGTH, OPCODE_MASK, OPCODE_SHIFT, QR_MASK, RA_MASK, RCODE_MASK, RD_MASK, TC_MASK,
};
use crate::rdata::decode_rdata;
use crate::scanner::Scanner;

/// Section counts as read from the header. They only drive decoding and
/// are not kept in the resulting [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionCounts {
    pub questions: u16,
    pub answers: u16,
    pub authorities: u16,
    pub additional: u16,
}

pub fn parse_header(scanner: &mut Scanner<'_>) -> Result<(Header, SectionCounts), DnsCodecError> {
    let id = scanner.read_u16().context("id")?;
    let flags1 = scanner.read_u8().context("flags")?;
    let flags2 = scanner.read_u8().context("flags")?;

    let header = Header {
        id,
        is_response: (flags1 & QR_MASK) != 0,
        opcode: ((flags1 & OPCODE_MASK) >> OPCODE_SHIFT).into(),
        authoritative: (flags1 & AA_MASK) != 0,
        truncated: (flags1 & TC_MASK) != 0,
        recursion_desired: (flags1 & RD_MASK) != 0,
        recursion_available: (flags2 & RA_MASK) != 0,
        authentic_data: (flags2 & AD_MASK) != 0,
        checking_disabled: (flags2 & CD_MASK) != 0,
        response_code: (flags2 & RCODE_MASK).into(),
    };

    let counts = SectionCounts {
        questions: scanner.read_u16().context("qdcount")?,
        answers: scanner.read_u16().context("ancount")?,
        authorities: scanner.read_u16().context("nscount")?,
        additional: scanner.read_u16().context("arcount")?,
    };

    Ok((header, counts))
}

pub fn parse_question(scanner: &mut Scanner<'_>) -> Result<Question, DnsCodecError> {
    let name = decode_name(scanner).context("name")?;
    let qtype = scanner.read_u16().context("qtype")?;
    let qclass = scanner.read_u16().context("qclass")?;

    Ok(Question {
        name,
        qtype: qtype.into(),
        qclass: qclass.into(),
    })
}

pub fn parse_resource_record(scanner: &mut Scanner<'_>) -> Result<ResourceRecord, DnsCodecError> {
    let name = decode_name(scanner).context("name")?;
    let rtype = ResourceType::from(scanner.read_u16().context("type")?);
    let class = scanner.read_u16().context("class")?;
    let ttl = scanner.read_u32().context("ttl")?;
    let rdata_length = scanner.read_u16().context("rdlength")?;
    let rdata_start = scanner.position();
    let rdata = decode_rdata(scanner, rtype, rdata_length).context("rdata")?;

    // The next record starts where RDLENGTH says, whatever the decoder used.
    let rdata_end = rdata_start + usize::from(rdata_length);
    if scanner.position() < rdata_end {
        if rdata_end > scanner.len() {
            return Err(DnsCodecError::Truncated {
                position: scanner.position(),
                needed: rdata_end - scanner.position(),
                available: scanner.remaining(),
            })
            .context("rdata");
        }
        scanner.skip(rdata_end - scanner.position());
    }

    Ok(ResourceRecord {
        name,
        class: class.into(),
        ttl,
        rdata,
    })
}

fn parse_records(
    scanner: &mut Scanner<'_>,
    section: &str,
    count: u16,
) -> Result<Vec<ResourceRecord>, DnsCodecError> {
    // The count comes off the wire, so it does not get to size the allocation.
    let mut records = Vec::new();
    for i in 0..count {
        let record =
            parse_resource_record(scanner).with_context(|| format!("{}[{}]", section, i))?;
        records.push(record);
    }
    Ok(records)
}

fn parse_sections(scanner: &mut Scanner<'_>) -> Result<Message, DnsCodecError> {
    let (header, counts) = parse_header(scanner).context("header")?;

    let mut questions = Vec::new();
    for i in 0..counts.questions {
        let question = parse_question(scanner).with_context(|| format!("questions[{}]", i))?;
        questions.push(question);
    }

    let answers = parse_records(scanner, "answers", counts.answers)?;
    let authorities = parse_records(scanner, "authorities", counts.authorities)?;
    let additional = parse_records(scanner, "additional", counts.additional)?;

    Ok(Message {
        header,
        questions,
        answers,
        authorities,
        additional,
    })
}

/// Decodes a complete DNS message. Bytes after the last record are ignored.
pub fn parse_dns_packet(input: &[u8]) -> Result<Message, DnsCodecError> {
    if input.len() < HEADER_LENGTH {
        return Err(DnsCodecError::Truncated {
            position: 0,
            needed: HEADER_LENGTH,
            available: input.len(),
        })
        .context("decode packet");
    }

    let mut scanner = Scanner::new(input);
    parse_sections(&mut scanner).context("decode packet")
}
