//! Bounds-checked cursor over a received packet.
//!
//! Every byte the decoders look at is read through a [`Scanner`]. Reads
//! that would run past the end of the buffer fail with
//! [`DnsCodecError::Truncated`], lookups at an invalid position fail with
//! [`DnsCodecError::OutOfRange`]; nothing here can panic on hostile input.

use nom::{
    bytes::complete::take,
    number::complete::{be_u16, be_u32, be_u8},
    IResult,
};

use crate::errors::DnsCodecError;

#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Scanner { buf, pos: 0 }
    }

    /// Length of the whole underlying buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Advances the cursor. Skipping past the end is allowed; the next read
    /// reports the truncation.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    pub fn read_u8(&mut self) -> Result<u8, DnsCodecError> {
        self.run(1, be_u8)
    }

    pub fn read_u16(&mut self) -> Result<u16, DnsCodecError> {
        self.run(2, be_u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, DnsCodecError> {
        self.run(4, be_u32)
    }

    /// Returns the next `n` bytes without copying them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DnsCodecError> {
        self.run(n, |input| take(n)(input))
    }

    /// Reads the byte at `pos` without moving the cursor.
    pub fn peek_at(&self, pos: usize) -> Result<u8, DnsCodecError> {
        self.buf
            .get(pos)
            .copied()
            .ok_or(DnsCodecError::OutOfRange {
                position: pos,
                length: self.buf.len(),
            })
    }

    /// Reads `n` bytes starting at `pos` without moving the cursor.
    pub fn peek_bytes_at(&self, pos: usize, n: usize) -> Result<&'a [u8], DnsCodecError> {
        if pos >= self.buf.len() {
            return Err(DnsCodecError::OutOfRange {
                position: pos,
                length: self.buf.len(),
            });
        }
        let end = pos.checked_add(n).unwrap_or(usize::MAX);
        self.buf.get(pos..end).ok_or(DnsCodecError::Truncated {
            position: pos,
            needed: n,
            available: self.buf.len() - pos,
        })
    }

    // Runs a nom parser over the unread input and moves the cursor past
    // whatever it consumed.
    fn run<O, P>(&mut self, needed: usize, mut parser: P) -> Result<O, DnsCodecError>
    where
        P: FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
    {
        let input = self.buf.get(self.pos..).unwrap_or_default();
        match parser(input) {
            Ok((rest, value)) => {
                self.pos = self.pos.saturating_add(input.len() - rest.len());
                Ok(value)
            }
            Err(_) => Err(DnsCodecError::Truncated {
                position: self.pos,
                needed,
                available: input.len(),
            }),
        }
    }
}
