use super::decode::*;
use super::encode::float_head;
use super::value::{Sign, Simple, Value};
use alloc::{string::String, vec::Vec};
use tracing::{debug, trace};

const BREAK: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Bytes,
    Text,
}

impl StringKind {
    fn major(self) -> u8 {
        match self {
            Self::Bytes => 2,
            Self::Text => 3,
        }
    }

    fn finish(self, data: Vec<u8>) -> Result<Value, Error> {
        match self {
            Self::Bytes => Ok(Value::ByteString(data)),
            Self::Text => String::from_utf8(data)
                .map(Value::TextString)
                .map_err(|_| Error::InvalidUtf8),
        }
    }
}

/// An aggregate under construction.
///
/// `remaining` is `None` for indefinite-length aggregates, otherwise the
/// number of items (or pairs) still to be read, which is never zero while
/// the frame is on the stack.
enum Frame {
    Array {
        items: Vec<Value>,
        remaining: Option<u64>,
    },
    Map {
        entries: Vec<(Value, Value)>,
        key: Option<Value>,
        remaining: Option<u64>,
    },
    /// An uninterpreted tag, dropped once its value completes.
    Tag,
}

enum State {
    /// The next byte must start a data item.
    ExpectHeader,
    /// Inside an indefinite-length aggregate: a break or the next item.
    ExpectBreakOrNext,
    /// Inside an indefinite-length string: a break or the next chunk.
    ExpectChunk(StringKind, Vec<u8>),
}

/// What a single header produced.
enum Step {
    Value(Value),
    Opened,
    Chunked(StringKind),
}

pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
    max_depth: usize,
    stack: Vec<Frame>,
    indefinite: bool,
    canonical: bool,
    exact: bool,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            data,
            offset: 0,
            max_depth,
            stack: Vec::new(),
            indefinite: false,
            canonical: true,
            exact: true,
        }
    }

    /// Read one complete data item from the start of the buffer.
    pub(crate) fn read_item(mut self) -> Result<Decoded, Error> {
        let mut state = State::ExpectHeader;
        loop {
            let step = match state {
                State::ExpectChunk(kind, mut data) => {
                    if self.peek()? == BREAK {
                        self.offset += 1;
                        Step::Value(kind.finish(data)?)
                    } else {
                        self.read_chunk(kind, &mut data)?;
                        state = State::ExpectChunk(kind, data);
                        continue;
                    }
                }
                State::ExpectBreakOrNext if self.peek()? == BREAK => {
                    self.offset += 1;
                    Step::Value(self.close()?)
                }
                State::ExpectBreakOrNext | State::ExpectHeader => self.read_header_item()?,
            };

            state = match step {
                Step::Opened => self.next_state(),
                Step::Chunked(kind) => State::ExpectChunk(kind, Vec::new()),
                Step::Value(value) => match self.complete(value) {
                    Some(value) => {
                        return Ok(Decoded {
                            value,
                            len: self.offset,
                            indefinite: self.indefinite,
                            canonical: self.canonical,
                            exact: self.exact,
                        });
                    }
                    None => self.next_state(),
                },
            };
        }
    }

    fn peek(&self) -> Result<u8, Error> {
        self.data.get(self.offset).copied().ok_or(Error::UnexpectedEof)
    }

    fn take(&mut self, len: u64) -> Result<&'a [u8], Error> {
        let end = usize::try_from(len)
            .ok()
            .and_then(|len| self.offset.checked_add(len))
            .ok_or(Error::UnexpectedEof)?;
        let data = self
            .data
            .get(self.offset..end)
            .ok_or(Error::UnexpectedEof)?;
        self.offset = end;
        Ok(data)
    }

    fn header(&mut self) -> Result<(u8, u8, Argument), Error> {
        let initial = self.peek()?;
        let (major, minor) = (initial >> 5, initial & 0x1F);
        let (arg, len) = parse_argument(minor, &self.data[self.offset + 1..])?;
        self.offset += len + 1;

        // Major type 7 arguments are float bits or simple values, not lengths
        if major != 7 && !is_shortest(minor, arg) {
            self.canonical = false;
            self.exact = false;
        }
        Ok((major, minor, arg))
    }

    fn mark_indefinite(&mut self, what: &str) {
        trace!("Indefinite-length {what} at offset {}", self.offset - 1);
        self.indefinite = true;
        self.canonical = false;
        self.exact = false;
    }

    fn next_state(&self) -> State {
        match self.stack.last() {
            Some(Frame::Array {
                remaining: None, ..
            })
            | Some(Frame::Map {
                remaining: None, ..
            }) => State::ExpectBreakOrNext,
            _ => State::ExpectHeader,
        }
    }

    fn enter(&self) -> Result<(), Error> {
        if self.stack.len() >= self.max_depth {
            debug!(
                "Nesting depth limit {} reached at offset {}",
                self.max_depth, self.offset
            );
            return Err(Error::DepthExceeded);
        }
        Ok(())
    }

    /// Items cannot be shorter than one byte, so never reserve more slots
    /// than there are bytes left.
    fn capacity_hint(&self, count: u64, per_item: usize) -> usize {
        let available = (self.data.len() - self.offset) / per_item;
        usize::try_from(count).map_or(available, |c| c.min(available))
    }

    fn read_header_item(&mut self) -> Result<Step, Error> {
        let (major, minor, arg) = self.header()?;
        match (major, arg) {
            (0, Argument::Definite(v)) => Ok(Step::Value(Value::UnsignedInt(v))),
            (1, Argument::Definite(v)) => Ok(Step::Value(Value::negative(v))),
            (0 | 1 | 6, Argument::Indefinite) => Err(Error::InvalidIndefiniteLength),
            (2, Argument::Definite(len)) => {
                Ok(Step::Value(Value::ByteString(self.take(len)?.to_vec())))
            }
            (3, Argument::Definite(len)) => core::str::from_utf8(self.take(len)?)
                .map(|s| Step::Value(Value::TextString(s.into())))
                .map_err(|_| Error::InvalidUtf8),
            (2, Argument::Indefinite) => {
                self.mark_indefinite("byte string");
                Ok(Step::Chunked(StringKind::Bytes))
            }
            (3, Argument::Indefinite) => {
                self.mark_indefinite("text string");
                Ok(Step::Chunked(StringKind::Text))
            }
            (4, arg) => {
                self.enter()?;
                let remaining = match arg {
                    Argument::Definite(0) => return Ok(Step::Value(Value::Array(Vec::new()))),
                    Argument::Definite(count) => Some(count),
                    Argument::Indefinite => {
                        self.mark_indefinite("array");
                        None
                    }
                };
                let items = Vec::with_capacity(self.capacity_hint(remaining.unwrap_or(0), 1));
                self.stack.push(Frame::Array { items, remaining });
                Ok(Step::Opened)
            }
            (5, arg) => {
                self.enter()?;
                let remaining = match arg {
                    Argument::Definite(0) => return Ok(Step::Value(Value::Map(Vec::new()))),
                    Argument::Definite(count) => Some(count),
                    Argument::Indefinite => {
                        self.mark_indefinite("map");
                        None
                    }
                };
                let entries = Vec::with_capacity(self.capacity_hint(remaining.unwrap_or(0), 2));
                self.stack.push(Frame::Map {
                    entries,
                    key: None,
                    remaining,
                });
                Ok(Step::Opened)
            }
            (6, Argument::Definite(tag)) => self.read_tag(tag),
            (7, arg) => self.read_simple(minor, arg).map(Step::Value),
            _ => unreachable!(),
        }
    }

    fn read_tag(&mut self, tag: u64) -> Result<Step, Error> {
        self.enter()?;
        let sign = match tag {
            TAG_POSITIVE_BIGNUM => Sign::Positive,
            TAG_NEGATIVE_BIGNUM => Sign::Negative,
            _ => {
                trace!("Dropping tag {tag} at offset {}", self.offset);
                self.exact = false;
                self.stack.push(Frame::Tag);
                return Ok(Step::Opened);
            }
        };

        if self.peek()? == BREAK {
            return Err(Error::UnexpectedBreak);
        }
        let magnitude = match self.header()? {
            (2, _, Argument::Definite(len)) => self.take(len)?,
            _ => return Err(Error::InvalidTaggedValue),
        };

        // Only magnitudes beyond 64 bits, without leading zeros, re-encode as bignums
        if magnitude.len() <= 8 || magnitude[0] == 0 {
            self.exact = false;
        }
        Ok(Step::Value(Value::from_bignum(sign, magnitude)))
    }

    fn read_simple(&mut self, minor: u8, arg: Argument) -> Result<Value, Error> {
        let value = match (minor, arg) {
            (20, _) => Value::Bool(false),
            (21, _) => Value::Bool(true),
            (22, _) => Value::Null,
            (23, _) => Value::Undefined,
            (24, Argument::Definite(v)) => {
                let v = v as u8;
                match Simple::new(v) {
                    Some(s) if v >= 32 => Value::Simple(s),
                    _ => return Err(Error::InvalidSimpleValue(v)),
                }
            }
            (25, Argument::Definite(bits)) => {
                Value::Float(half::f16::from_bits(bits as u16).into())
            }
            (26, Argument::Definite(bits)) => Value::Float(f32::from_bits(bits as u32).into()),
            (27, Argument::Definite(bits)) => Value::Float(f64::from_bits(bits)),
            (_, Argument::Indefinite) => return Err(Error::UnexpectedBreak),
            (v, _) => match Simple::new(v) {
                Some(s) => Value::Simple(s),
                None => unreachable!(),
            },
        };

        // Wider than needed, or a NaN payload that does not survive narrowing
        match (&value, arg) {
            (Value::Float(f), Argument::Definite(bits)) if float_head(*f) != (minor, bits) => {
                self.exact = false
            }
            _ => {}
        }
        Ok(value)
    }

    fn read_chunk(&mut self, kind: StringKind, data: &mut Vec<u8>) -> Result<(), Error> {
        match self.header()? {
            (major, _, Argument::Definite(len)) if major == kind.major() => {
                data.extend_from_slice(self.take(len)?);
                Ok(())
            }
            _ => Err(Error::MalformedChunking),
        }
    }

    /// Close the indefinite-length aggregate on top of the stack at a break.
    fn close(&mut self) -> Result<Value, Error> {
        match self.stack.pop() {
            Some(Frame::Array { items, .. }) => Ok(Value::Array(items)),
            Some(Frame::Map { key: Some(_), .. }) => Err(Error::TruncatedMap),
            Some(Frame::Map { entries, .. }) => Ok(Value::Map(entries)),
            _ => Err(Error::UnexpectedBreak),
        }
    }

    /// Hand a finished value to the enclosing frame, closing every definite
    /// aggregate it completes. Returns the top-level value once the stack
    /// empties.
    fn complete(&mut self, mut value: Value) -> Option<Value> {
        while let Some(frame) = self.stack.last_mut() {
            match frame {
                Frame::Tag => {
                    self.stack.pop();
                    continue;
                }
                Frame::Array { items, remaining } => {
                    items.push(value);
                    if !count_down(remaining) {
                        return None;
                    }
                }
                Frame::Map {
                    entries,
                    key,
                    remaining,
                } => match key.take() {
                    None => {
                        *key = Some(value);
                        return None;
                    }
                    Some(k) => {
                        entries.push((k, value));
                        if !count_down(remaining) {
                            return None;
                        }
                    }
                },
            }

            value = match self.stack.pop() {
                Some(Frame::Array { items, .. }) => Value::Array(items),
                Some(Frame::Map { entries, .. }) => Value::Map(entries),
                _ => unreachable!(),
            };
        }
        Some(value)
    }
}

/// Count one item off a definite length, returning true when it is exhausted.
fn count_down(remaining: &mut Option<u64>) -> bool {
    match remaining {
        Some(r) => {
            *r -= 1;
            *r == 0
        }
        None => false,
    }
}
