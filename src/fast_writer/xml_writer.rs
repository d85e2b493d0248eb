//! Buffered XML writer with minimal allocations

use std::io::{self, Write};

const FLUSH_THRESHOLD: usize = 4096;

/// XML writer that batches small writes before handing them to the output
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(8192), // 8KB buffer
        }
    }

    /// Write raw bytes directly
    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    /// Write string data
    #[inline]
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_raw(s.as_bytes())
    }

    /// Write an unsigned integer without allocating
    #[inline]
    pub fn write_u32(&mut self, n: u32) -> io::Result<()> {
        let mut buf = itoa::Buffer::new();
        self.write_raw(buf.format(n).as_bytes())
    }

    /// Write XML element start tag
    #[inline]
    pub fn start_element(&mut self, name: &str) -> io::Result<()> {
        self.write_raw(b"<")?;
        self.write_str(name)
    }

    /// Write XML element end tag
    #[inline]
    pub fn end_element(&mut self, name: &str) -> io::Result<()> {
        self.write_raw(b"</")?;
        self.write_str(name)?;
        self.write_raw(b">")
    }

    /// Write attribute
    #[inline]
    pub fn attribute(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.write_raw(b" ")?;
        self.write_str(name)?;
        self.write_raw(b"=\"")?;
        self.write_escaped(value)?;
        self.write_raw(b"\"")
    }

    /// Write attribute with integer value
    #[inline]
    pub fn attribute_u32(&mut self, name: &str, value: u32) -> io::Result<()> {
        self.write_raw(b" ")?;
        self.write_str(name)?;
        self.write_raw(b"=\"")?;
        self.write_u32(value)?;
        self.write_raw(b"\"")
    }

    /// Close start tag
    #[inline]
    pub fn close_start_tag(&mut self) -> io::Result<()> {
        self.write_raw(b">")
    }

    /// Close start tag as an empty element
    #[inline]
    pub fn close_empty(&mut self) -> io::Result<()> {
        self.write_raw(b"/>")
    }

    /// Write text content with XML escaping
    ///
    /// Control characters that XML 1.0 cannot carry are written in the
    /// spreadsheet `_xHHHH_` form. Text that already reads as such a sequence
    /// has its leading underscore written as `_x005F_` so it survives decoding.
    pub fn write_escaped(&mut self, text: &str) -> io::Result<()> {
        for (i, ch) in text.char_indices() {
            match ch {
                '_' if is_escape_sequence(&text.as_bytes()[i..]) => {
                    self.buffer.extend_from_slice(b"_x005F_")
                }
                '&' => self.buffer.extend_from_slice(b"&amp;"),
                '<' => self.buffer.extend_from_slice(b"&lt;"),
                '>' => self.buffer.extend_from_slice(b"&gt;"),
                '"' => self.buffer.extend_from_slice(b"&quot;"),
                '\'' => self.buffer.extend_from_slice(b"&apos;"),
                '\t' | '\n' | '\r' => self.buffer.push(ch as u8),
                c if (c as u32) < 0x20 => {
                    write!(self.buffer, "_x{:04X}_", c as u32)?;
                }
                c => {
                    let mut utf8 = [0u8; 4];
                    self.buffer
                        .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
        if self.buffer.len() > FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush buffer to underlying writer
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.writer.flush()
    }

    /// Flush and access the underlying writer
    pub fn get_mut(&mut self) -> io::Result<&mut W> {
        self.flush()?;
        Ok(&mut self.writer)
    }
}

/// `_xHHHH_` at the start of `bytes`
fn is_escape_sequence(bytes: &[u8]) -> bool {
    bytes.len() >= 7
        && bytes[0] == b'_'
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}
