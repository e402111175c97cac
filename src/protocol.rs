// Define DNS message structure, header bit layout and the small value types

use std::fmt;
use std::str::FromStr;

use crate::rdata::RData;

/// Length of the fixed DNS header in bytes
pub const HEADER_LENGTH: usize = 12;

// flags byte 1: QR(1) OPCODE(4) AA(1) TC(1) RD(1)
pub const QR_MASK: u8 = 0b1000_0000;
pub const OPCODE_MASK: u8 = 0b0111_1000;
pub const OPCODE_SHIFT: u8 = 3;
pub const AA_MASK: u8 = 0b0000_0100;
pub const TC_MASK: u8 = 0b0000_0010;
pub const RD_MASK: u8 = 0b0000_0001;

// flags byte 2: RA(1) Z(1) AD(1) CD(1) RCODE(4)
pub const RA_MASK: u8 = 0b1000_0000;
pub const AD_MASK: u8 = 0b0010_0000;
pub const CD_MASK: u8 = 0b0001_0000;
pub const RCODE_MASK: u8 = 0b0000_1111;

/// A resource type (TYPE/QTYPE) as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceType(pub u16);

impl ResourceType {
    pub const A: ResourceType = ResourceType(1); // IPv4 address
    pub const NS: ResourceType = ResourceType(2); // Name server
    pub const CNAME: ResourceType = ResourceType(5); // Canonical name
    pub const SOA: ResourceType = ResourceType(6); // Start of authority
    pub const TXT: ResourceType = ResourceType(16); // Text record
    pub const AAAA: ResourceType = ResourceType(28); // IPv6 address

    fn name(self) -> Option<&'static str> {
        match self {
            Self::A => Some("A"),
            Self::NS => Some("NS"),
            Self::CNAME => Some("CNAME"),
            Self::SOA => Some("SOA"),
            Self::TXT => Some("TXT"),
            Self::AAAA => Some("AAAA"),
            _ => None,
        }
    }
}

impl From<u16> for ResourceType {
    fn from(value: u16) -> Self {
        ResourceType(value)
    }
}

impl From<ResourceType> for u16 {
    fn from(value: ResourceType) -> Self {
        value.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN({})", self.0),
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "NS" => Ok(Self::NS),
            "CNAME" => Ok(Self::CNAME),
            "SOA" => Ok(Self::SOA),
            "TXT" => Ok(Self::TXT),
            "AAAA" => Ok(Self::AAAA),
            _ => Err(format!("unsupported resource type: {}", s)),
        }
    }
}

/// A record class (CLASS/QCLASS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Class(pub u16);

impl Class {
    pub const IN: Class = Class(1); // Internet
}

impl Default for Class {
    fn default() -> Self {
        Class::IN
    }
}

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        Class(value)
    }
}

impl From<Class> for u16 {
    fn from(value: Class) -> Self {
        value.0
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Class::IN => f.write_str("IN"),
            Class(other) => write!(f, "UNKNOWN({})", other),
        }
    }
}

/// The 4-bit OPCODE of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Opcode {
    #[default]
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Unassigned(u8),
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        match value & 0x0F {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Unassigned(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        match value {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Unassigned(other) => other & 0x0F,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Query => f.write_str("QUERY"),
            Opcode::IQuery => f.write_str("IQUERY"),
            Opcode::Status => f.write_str("STATUS"),
            Opcode::Notify => f.write_str("NOTIFY"),
            Opcode::Update => f.write_str("UPDATE"),
            Opcode::Unassigned(other) => write!(f, "RESERVED({})", other),
        }
    }
}

/// The 4-bit RCODE of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rcode {
    #[default]
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    YxDomain,
    YxRrset,
    NxRrset,
    NotAuth,
    NotZone,
    Unassigned(u8),
}

impl From<u8> for Rcode {
    fn from(value: u8) -> Self {
        match value & RCODE_MASK {
            0 => Rcode::NoError,
            1 => Rcode::FormErr,
            2 => Rcode::ServFail,
            3 => Rcode::NxDomain,
            4 => Rcode::NotImp,
            5 => Rcode::Refused,
            6 => Rcode::YxDomain,
            7 => Rcode::YxRrset,
            8 => Rcode::NxRrset,
            9 => Rcode::NotAuth,
            10 => Rcode::NotZone,
            other => Rcode::Unassigned(other),
        }
    }
}

impl From<Rcode> for u8 {
    fn from(value: Rcode) -> Self {
        match value {
            Rcode::NoError => 0,
            Rcode::FormErr => 1,
            Rcode::ServFail => 2,
            Rcode::NxDomain => 3,
            Rcode::NotImp => 4,
            Rcode::Refused => 5,
            Rcode::YxDomain => 6,
            Rcode::YxRrset => 7,
            Rcode::NxRrset => 8,
            Rcode::NotAuth => 9,
            Rcode::NotZone => 10,
            Rcode::Unassigned(other) => other & RCODE_MASK,
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rcode::NoError => f.write_str("NOERROR"),
            Rcode::FormErr => f.write_str("FORMERR"),
            Rcode::ServFail => f.write_str("SERVFAIL"),
            Rcode::NxDomain => f.write_str("NXDOMAIN"),
            Rcode::NotImp => f.write_str("NOTIMP"),
            Rcode::Refused => f.write_str("REFUSED"),
            Rcode::YxDomain => f.write_str("YXDOMAIN"),
            Rcode::YxRrset => f.write_str("YXRRSET"),
            Rcode::NxRrset => f.write_str("NXRRSET"),
            Rcode::NotAuth => f.write_str("NOTAUTH"),
            Rcode::NotZone => f.write_str("NOTZONE"),
            Rcode::Unassigned(other) => write!(f, "UNKNOWN({})", other),
        }
    }
}

/// Header fields of a message. Section counts are not stored here: they are
/// derived from the section vectors on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub id: u16,                   // Identifier, 16 bits
    pub is_response: bool,         // Query or Response, 1 bit
    pub opcode: Opcode,            // Operation code, 4 bits
    pub authoritative: bool,       // Authoritative answer, 1 bit
    pub truncated: bool,           // Truncated, 1 bit
    pub recursion_desired: bool,   // Recursion desired, 1 bit
    pub recursion_available: bool, // Recursion available, 1 bit
    pub authentic_data: bool,      // Authentic data, 1 bit
    pub checking_disabled: bool,   // Checking disabled, 1 bit
    pub response_code: Rcode,      // Response code, 4 bits
}

// Define the DNS question section structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String, // Domain name, represented as a sequence of "labels"
    pub qtype: ResourceType, // https://www.rfc-editor.org/rfc/rfc1035#section-3.2.2
    pub qclass: Class, // https://www.rfc-editor.org/rfc/rfc1035#section-3.2.4
}

impl Question {
    pub fn new(name: impl Into<String>, qtype: ResourceType) -> Self {
        Question {
            name: name.into(),
            qtype,
            qclass: Class::IN,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.qclass, self.qtype)
    }
}

/// A resource record. The record type comes from its data and the RDATA
/// length is recomputed on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String, // The domain name encoded as a sequence of labels
    pub class: Class,
    pub ttl: u32, // Time to live in seconds
    pub rdata: RData,
}

impl ResourceRecord {
    pub fn new(name: impl Into<String>, ttl: u32, rdata: RData) -> Self {
        ResourceRecord {
            name: name.into(),
            class: Class::IN,
            ttl,
            rdata,
        }
    }

    pub fn rtype(&self) -> ResourceType {
        self.rdata.resource_type()
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t\t{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.class,
            self.rtype(),
            self.rdata
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// Builds a recursion-desired query with a single question.
    pub fn query(id: u16, name: impl Into<String>, qtype: ResourceType) -> Self {
        Message {
            header: Header {
                id,
                recursion_desired: true,
                ..Header::default()
            },
            questions: vec![Question::new(name, qtype)],
            ..Message::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_display_and_parse() {
        assert_eq!(ResourceType::A.to_string(), "A");
        assert_eq!(ResourceType::TXT.to_string(), "TXT");
        assert_eq!(ResourceType(99).to_string(), "UNKNOWN(99)");

        assert_eq!("txt".parse::<ResourceType>(), Ok(ResourceType::TXT));
        assert_eq!("Soa".parse::<ResourceType>(), Ok(ResourceType::SOA));
        assert!("MX".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_class_defaults_to_internet() {
        assert_eq!(Class::default(), Class::IN);
        assert_eq!(Class::IN.to_string(), "IN");
        assert_eq!(Class(3).to_string(), "UNKNOWN(3)");
    }

    #[test]
    fn test_opcode_and_rcode_wire_values() {
        for raw in 0..16u8 {
            assert_eq!(u8::from(Opcode::from(raw)), raw);
            assert_eq!(u8::from(Rcode::from(raw)), raw);
        }
        assert_eq!(Opcode::from(4), Opcode::Notify);
        assert_eq!(Opcode::from(3), Opcode::Unassigned(3));
        assert_eq!(Rcode::from(3), Rcode::NxDomain);
        assert_eq!(Rcode::from(15), Rcode::Unassigned(15));
    }

    #[test]
    fn test_query_sets_recursion_desired() {
        let query = Message::query(7, "example.com.", ResourceType::TXT);

        assert_eq!(query.header.id, 7);
        assert!(!query.header.is_response);
        assert!(query.header.recursion_desired);
        assert_eq!(query.header.opcode, Opcode::Query);
        assert_eq!(
            query.questions,
            vec![Question {
                name: "example.com.".to_string(),
                qtype: ResourceType::TXT,
                qclass: Class::IN,
            }]
        );
    }

    #[test]
    fn test_resource_record_display() {
        let record = ResourceRecord::new(
            "google.com.",
            135,
            RData::A(std::net::Ipv4Addr::new(142, 250, 196, 110)),
        );
        assert_eq!(
            record.to_string(),
            "google.com.\t\t135\tIN\tA\t142.250.196.110"
        );
    }
}
