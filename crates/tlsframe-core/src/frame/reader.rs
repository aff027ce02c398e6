use crate::error::ParseError;

/// Forward-only cursor over a bounded byte window.
///
/// All reads are big-endian and borrow from the underlying buffer. The window
/// is assumed to be fully present (its bounds came from an enclosing length
/// field), so running off the end is reported as [`ParseError::Overrun`].
/// Callers that can legitimately see a truncated window check
/// [`remaining`](Self::remaining) before reading.
#[derive(Debug, Clone)]
pub struct SpanReader<'a> {
    rest: &'a [u8],
}

impl<'a> SpanReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { rest: buf }
    }

    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// The unread part of the window.
    pub fn rest(&self) -> &'a [u8] {
        self.rest
    }

    pub fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], ParseError> {
        if n > self.rest.len() {
            return Err(ParseError::Overrun { field });
        }
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        Ok(head)
    }

    pub fn skip(&mut self, n: usize, field: &'static str) -> Result<(), ParseError> {
        self.take(n, field).map(|_| ())
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, ParseError> {
        let (&b, tail) = self.rest.split_first().ok_or(ParseError::Overrun { field })?;
        self.rest = tail;
        Ok(b)
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, ParseError> {
        let b = self.take(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u24(&mut self, field: &'static str) -> Result<u32, ParseError> {
        let b = self.take(3, field)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Read an opaque region with a 1-byte length prefix (`opaque x<0..2^8-1>`).
    pub fn read_opaque8(&mut self, field: &'static str) -> Result<&'a [u8], ParseError> {
        let len = usize::from(self.read_u8(field)?);
        self.take(len, field)
    }

    /// Read an opaque region with a 2-byte length prefix (`opaque x<0..2^16-1>`).
    pub fn read_opaque16(&mut self, field: &'static str) -> Result<&'a [u8], ParseError> {
        let len = usize::from(self.read_u16(field)?);
        self.take(len, field)
    }

    pub fn skip_opaque8(&mut self, field: &'static str) -> Result<(), ParseError> {
        self.read_opaque8(field).map(|_| ())
    }

    pub fn skip_opaque16(&mut self, field: &'static str) -> Result<(), ParseError> {
        self.read_opaque16(field).map(|_| ())
    }
}

/// Split off a 1-byte length prefix that must cover exactly the rest of `data`.
pub fn exact_opaque8<'a>(data: &'a [u8], field: &'static str) -> Result<&'a [u8], ParseError> {
    let mut reader = SpanReader::new(data);
    let declared = usize::from(reader.read_u8(field)?);
    check_exact(field, declared, reader.rest())
}

/// Split off a 2-byte length prefix that must cover exactly the rest of `data`.
pub fn exact_opaque16<'a>(data: &'a [u8], field: &'static str) -> Result<&'a [u8], ParseError> {
    let mut reader = SpanReader::new(data);
    let declared = usize::from(reader.read_u16(field)?);
    check_exact(field, declared, reader.rest())
}

fn check_exact<'a>(
    field: &'static str,
    declared: usize,
    rest: &'a [u8],
) -> Result<&'a [u8], ParseError> {
    if declared != rest.len() {
        return Err(ParseError::LengthMismatch {
            field,
            declared,
            actual: rest.len(),
        });
    }
    Ok(rest)
}

/// Iterate a list of big-endian 2-byte entries, rejecting odd lengths.
pub fn u16_entries<'a>(
    list: &'a [u8],
    field: &'static str,
) -> Result<impl Iterator<Item = u16> + 'a, ParseError> {
    if list.len() % 2 != 0 {
        return Err(ParseError::OddLength {
            field,
            len: list.len(),
        });
    }
    Ok(list
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]])))
}
