use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $typ:ty) => {
        pub fn $fn_name(&mut self) -> Result<$typ, CursorError> {
            const SIZE: usize = size_of::<$typ>();
            Ok(<$typ>::from_be_bytes(self.read_array::<SIZE>()?))
        }
    };
}

/// Represents the possible errors that can occur when using `FontCursor`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    /// A read or seek needed more bytes than the buffer holds past the
    /// cursor position.
    #[error("Insufficient data at position {position}: needed {needed} bytes, {remaining} remaining")]
    InsufficientData {
        position: usize,
        needed: usize,
        remaining: usize,
    },
}

/// A bounds-checked, big-endian reader over an immutable byte buffer.
///
/// The cursor is `Copy`: handing it to a nested parse gives that parse its
/// own position, and the caller's cursor is left exactly where it was.
#[derive(Debug, Clone, Copy)]
pub struct FontCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> FontCursor<'a> {
    /// Returns a new cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Returns a new cursor positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self, CursorError> {
        let mut cursor = Self::new(data);
        cursor.seek_to(offset)?;
        Ok(cursor)
    }

    /// The whole buffer this cursor reads from.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Fails unless at least `n` more bytes can be read.
    ///
    /// Used to validate declared counts before allocating anything
    /// proportional to them.
    pub fn ensure(&self, n: usize) -> Result<(), CursorError> {
        if n > self.remaining() {
            return Err(self.insufficient(n));
        }
        Ok(())
    }

    /// Seeks to a specific place in the buffer
    /// from the start of the buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use vero_outline::buffer::FontCursor;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut cursor = FontCursor::new(&data);
    ///
    /// cursor.seek_to(4).unwrap();
    /// assert_eq!(cursor.read_u32().unwrap(), 20);
    /// assert!(cursor.seek_to(9).is_err());
    /// ```
    pub fn seek_to(&mut self, offset: usize) -> Result<(), CursorError> {
        if offset > self.data.len() {
            return Err(self.insufficient(offset.saturating_sub(self.position)));
        }
        self.position = offset;
        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor position
    pub fn skip(&mut self, n: usize) -> Result<(), CursorError> {
        self.ensure(n)?;
        self.position += n;
        Ok(())
    }

    /// Reads `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        self.ensure(n)?;
        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    impl_read!(read_u8, u8);
    impl_read!(read_i8, i8);
    impl_read!(read_u16, u16);
    impl_read!(read_i16, i16);
    impl_read!(read_u32, u32);
    impl_read!(read_i32, i32);

    /// Reads a 16.16 signed fixed-point number.
    pub fn read_fixed(&mut self) -> Result<f64, CursorError> {
        Ok(f64::from(self.read_i32()?) / 65536.0)
    }

    /// Reads a 2.14 fixed-point number: the top two bits are a signed
    /// integer, the low fourteen bits the fraction.
    pub fn read_f2dot14(&mut self) -> Result<f64, CursorError> {
        let raw = self.read_i16()?;
        let integer = raw >> 14;
        let fraction = raw & 0x3FFF;
        Ok(f64::from(integer) + f64::from(fraction) / 16384.0)
    }

    /// Reads an `FWord`, a signed quantity in font design units.
    pub fn read_fword(&mut self) -> Result<i16, CursorError> {
        self.read_i16()
    }

    /// Reads a `LONGDATETIME`: seconds since 1904-01-01 00:00, stored as
    /// two 32-bit halves.
    pub fn read_long_date_time(&mut self) -> Result<i64, CursorError> {
        let high = u64::from(self.read_u32()?);
        let low = u64::from(self.read_u32()?);
        Ok(((high << 32) | low) as i64)
    }

    /// Reads a string prefixed by a single length byte.
    pub fn read_pascal_string(&mut self) -> Result<&'a [u8], CursorError> {
        let len = self.read_u8()?;
        self.read_bytes(usize::from(len))
    }

    fn insufficient(&self, needed: usize) -> CursorError {
        CursorError::InsufficientData {
            position: self.position,
            needed,
            remaining: self.remaining(),
        }
    }
}
