use std::io::{self, Write};

/// What the top of the nesting stack means for the next write (4.12).
///
/// `ObjectOpen`/`ArrayOpen` mark a container that hasn't accepted its first
/// entry yet; `FieldWritten`/`EntryWritten` mark that a separator is needed
/// before the next field or array entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    ObjectOpen,
    ArrayOpen,
    FieldWritten,
    EntryWritten,
}

/// Incremental JSON emitter, writing each token directly to `W` rather than
/// building a `serde_json::Value` tree in memory first.
///
/// Ported from `json::Stream` (`stream.cpp`); `W: io::Write` stands in for
/// the original's `Writer` interface, and backpressure is `W`'s problem, not
/// this type's.
pub struct JsonStream<W> {
    writer: W,
    stack: Vec<Mark>,
}

impl<W: Write> JsonStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, stack: Vec::new() }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn open_object(&mut self) -> io::Result<()> {
        self.begin_entry_if_needed()?;
        self.writer.write_all(b"{")?;
        self.stack.push(Mark::ObjectOpen);
        Ok(())
    }

    pub fn close_object(&mut self) -> io::Result<()> {
        if self.stack.last() == Some(&Mark::FieldWritten) {
            self.stack.pop();
        }
        self.stack.pop();
        self.writer.write_all(b"}")
    }

    pub fn open_array(&mut self) -> io::Result<()> {
        self.writer.write_all(b"[")?;
        self.stack.push(Mark::ArrayOpen);
        Ok(())
    }

    pub fn close_array(&mut self) -> io::Result<()> {
        if matches!(self.stack.last(), Some(Mark::EntryWritten) | Some(Mark::FieldWritten)) {
            self.stack.pop();
        }
        self.stack.pop();
        self.writer.write_all(b"]")
    }

    /// Writes `value` as a standalone array entry (not preceded by
    /// `write_field`).
    pub fn write_json(&mut self, value: &serde_json::Value) -> io::Result<()> {
        self.begin_entry_if_needed()?;
        self.writer.write_all(value.to_string().as_bytes())
    }

    /// Writes `"name":`, leaving the value for a following `write_json`,
    /// `open_object`, or `open_array` call.
    pub fn write_field(&mut self, name: &str) -> io::Result<()> {
        self.ensure_field_separator()?;
        self.write_string(name)?;
        self.writer.write_all(b":")
    }

    pub fn write_field_value(&mut self, name: &str, value: &serde_json::Value) -> io::Result<()> {
        self.ensure_field_separator()?;
        self.write_string(name)?;
        self.writer.write_all(b":")?;
        self.writer.write_all(value.to_string().as_bytes())
    }

    pub fn write_string(&mut self, s: &str) -> io::Result<()> {
        let encoded = serde_json::to_string(s).expect("string serialization is infallible");
        self.writer.write_all(encoded.as_bytes())
    }

    /// Shared by `open_object` and `write_json`: both start a new array
    /// entry or object value, so both need the same comma-insertion check.
    fn begin_entry_if_needed(&mut self) -> io::Result<()> {
        let is_entry = matches!(self.stack.last(), Some(Mark::ArrayOpen) | Some(Mark::EntryWritten));
        if is_entry {
            if self.stack.last() != Some(&Mark::EntryWritten) {
                self.stack.push(Mark::EntryWritten);
            } else {
                self.writer.write_all(b",")?;
            }
        }
        Ok(())
    }

    fn ensure_field_separator(&mut self) -> io::Result<()> {
        if !self.stack.is_empty() {
            if self.stack.last() != Some(&Mark::FieldWritten) {
                self.stack.push(Mark::FieldWritten);
            } else {
                self.writer.write_all(b",")?;
            }
        }
        Ok(())
    }
}
