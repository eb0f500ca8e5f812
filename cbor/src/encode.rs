use super::decode::{TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM};
use super::value::*;
use alloc::{string::String, vec::Vec};

pub trait ToCbor {
    fn to_cbor(&self, encoder: &mut Encoder);
}

/// Builds the canonical, definite-length encoding of a sequence of items.
pub struct Encoder {
    data: Vec<u8>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    pub fn offset(&self) -> usize {
        self.data.len()
    }

    fn emit_uint_minor(&mut self, major: u8, val: u64) {
        if val < 24 {
            self.data.push((major << 5) | (val as u8))
        } else if val <= u8::MAX as u64 {
            self.data.push((major << 5) | 24u8);
            self.data.push(val as u8)
        } else if val <= u16::MAX as u64 {
            self.data.push((major << 5) | 25u8);
            self.data.extend((val as u16).to_be_bytes())
        } else if val <= u32::MAX as u64 {
            self.data.push((major << 5) | 26u8);
            self.data.extend((val as u32).to_be_bytes())
        } else {
            self.data.push((major << 5) | 27u8);
            self.data.extend(val.to_be_bytes())
        }
    }

    fn emit_tags<I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = u64>,
    {
        for tag in tags {
            self.emit_uint_minor(6, tag);
        }
    }

    fn emit_bytes(&mut self, major: u8, b: &[u8]) {
        self.emit_uint_minor(major, b.len() as u64);
        self.data.extend_from_slice(b);
    }

    pub fn emit<T>(&mut self, value: &T)
    where
        T: ToCbor + ?Sized,
    {
        value.to_cbor(self)
    }

    pub fn emit_tagged<T, I>(&mut self, value: &T, tags: I)
    where
        T: ToCbor + ?Sized,
        I: IntoIterator<Item = u64>,
    {
        self.emit_tags(tags);
        self.emit(value)
    }

    pub fn emit_array<F>(&mut self, count: usize, f: F)
    where
        F: FnOnce(&mut Array),
    {
        let mut a = Array::new(self, count);
        f(&mut a);
        a.end()
    }

    pub fn emit_slice<T>(&mut self, values: &[T])
    where
        T: ToCbor,
    {
        self.emit_array(values.len(), |a| {
            for value in values {
                a.emit(value);
            }
        })
    }

    pub fn emit_map<F>(&mut self, count: usize, f: F)
    where
        F: FnOnce(&mut Map),
    {
        let mut m = Map::new(self, count);
        f(&mut m);
        m.end()
    }
}

/// A definite-length array (`D == 1`) or map (`D == 2`) being emitted.
///
/// Emitting more or fewer items than declared is a programming error and panics.
pub struct Sequence<'a, const D: usize> {
    encoder: &'a mut Encoder,
    count: usize,
    idx: usize,
}

pub type Array<'a> = Sequence<'a, 1>;
pub type Map<'a> = Sequence<'a, 2>;

impl<'a, const D: usize> Sequence<'a, D> {
    fn new(encoder: &'a mut Encoder, count: usize) -> Self {
        encoder.emit_uint_minor(if D == 1 { 4 } else { 5 }, count as u64);
        Self {
            encoder,
            count: count * D,
            idx: 0,
        }
    }

    fn next_field(&mut self) -> &mut Encoder {
        self.idx += 1;
        if self.idx > self.count {
            panic!("Too many items added to definite length sequence")
        }
        self.encoder
    }

    fn end(self) {
        if self.idx != self.count {
            panic!(
                "Definite length sequence is short of items: {}, expected {}",
                self.idx, self.count
            );
        }
    }

    pub fn emit<T>(&mut self, value: &T)
    where
        T: ToCbor + ?Sized,
    {
        self.next_field().emit(value)
    }

    pub fn emit_tagged<T, I>(&mut self, value: &T, tags: I)
    where
        T: ToCbor + ?Sized,
        I: IntoIterator<Item = u64>,
    {
        self.next_field().emit_tagged(value, tags)
    }

    pub fn emit_array<F>(&mut self, count: usize, f: F)
    where
        F: FnOnce(&mut Array),
    {
        self.next_field().emit_array(count, f)
    }

    pub fn emit_map<F>(&mut self, count: usize, f: F)
    where
        F: FnOnce(&mut Map),
    {
        self.next_field().emit_map(count, f)
    }
}

macro_rules! impl_uint_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) {
                    encoder.emit_uint_minor(0, *self as u64);
                }
            }
        )*
    };
}

impl_uint_to_cbor!(u8, u16, u32, u64, usize);

fn emit_i64(encoder: &mut Encoder, val: i64) {
    if val >= 0 {
        encoder.emit_uint_minor(0, val as u64);
    } else {
        encoder.emit_uint_minor(1, (-1 - val) as u64);
    }
}

macro_rules! impl_int_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) {
                    emit_i64(encoder, *self as i64)
                }
            }
        )*
    };
}

impl_int_to_cbor!(i8, i16, i32, i64, isize);

impl ToCbor for i128 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        BigInt::from_i128(*self).to_cbor(encoder)
    }
}

impl ToCbor for u128 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        BigInt::new(Sign::Positive, self.to_be_bytes()).to_cbor(encoder)
    }
}

/// Integers within 64 bits use major types 0 and 1, anything larger
/// becomes a tag 2 or tag 3 bignum.
impl ToCbor for BigInt {
    fn to_cbor(&self, encoder: &mut Encoder) {
        match self.sign() {
            Sign::Positive => match magnitude_to_u64(self.magnitude()) {
                Some(v) => encoder.emit_uint_minor(0, v),
                None => {
                    encoder.emit_uint_minor(6, TAG_POSITIVE_BIGNUM);
                    encoder.emit_bytes(2, self.magnitude());
                }
            },
            Sign::Negative => {
                // A negative BigInt is never zero, so the subtraction cannot underflow
                let m = magnitude_sub_one(self.magnitude());
                match magnitude_to_u64(&m) {
                    Some(v) => encoder.emit_uint_minor(1, v),
                    None => {
                        encoder.emit_uint_minor(6, TAG_NEGATIVE_BIGNUM);
                        encoder.emit_bytes(2, &m);
                    }
                }
            }
        }
    }
}

fn lossless_float_coerce<T>(value: f64) -> Option<T>
where
    T: num_traits::FromPrimitive + Into<f64> + Copy,
{
    // Bitwise, so a NaN narrows whenever its payload survives
    match <T as num_traits::FromPrimitive>::from_f64(value) {
        Some(f) if <T as Into<f64>>::into(f).to_bits() == value.to_bits() => Some(f),
        _ => None,
    }
}

/// The additional information (25, 26 or 27) and raw bits of the narrowest
/// float encoding that preserves `value` exactly.
pub(crate) fn float_head(value: f64) -> (u8, u64) {
    if let Some(f) = lossless_float_coerce::<half::f16>(value) {
        (25, f.to_bits() as u64)
    } else if let Some(f) = lossless_float_coerce::<f32>(value) {
        (26, f.to_bits() as u64)
    } else {
        (27, value.to_bits())
    }
}

impl ToCbor for f64 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        let (minor, bits) = float_head(*self);
        encoder.data.push((7 << 5) | minor);
        let width = match minor {
            25 => 2,
            26 => 4,
            _ => 8,
        };
        encoder.data.extend(&bits.to_be_bytes()[8 - width..])
    }
}

impl ToCbor for f32 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        (*self as f64).to_cbor(encoder)
    }
}

impl ToCbor for half::f16 {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.data.push((7 << 5) | 25);
        encoder.data.extend(self.to_be_bytes())
    }
}

impl ToCbor for bool {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.data.push((7 << 5) | if *self { 21 } else { 20 })
    }
}

impl ToCbor for Simple {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_uint_minor(7, self.get() as u64)
    }
}

impl ToCbor for str {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_bytes(3, self.as_bytes())
    }
}

impl ToCbor for String {
    fn to_cbor(&self, encoder: &mut Encoder) {
        self.as_str().to_cbor(encoder)
    }
}

impl ToCbor for [u8] {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_bytes(2, self)
    }
}

impl ToCbor for Vec<u8> {
    fn to_cbor(&self, encoder: &mut Encoder) {
        self.as_slice().to_cbor(encoder)
    }
}

impl<const N: usize> ToCbor for [u8; N] {
    fn to_cbor(&self, encoder: &mut Encoder) {
        self.as_slice().to_cbor(encoder)
    }
}

impl<T> ToCbor for Option<T>
where
    T: ToCbor,
{
    fn to_cbor(&self, encoder: &mut Encoder) {
        match self {
            Some(value) => encoder.emit(value),
            None => encoder.data.push((7 << 5) | 22),
        }
    }
}

impl ToCbor for Value {
    fn to_cbor(&self, encoder: &mut Encoder) {
        match self {
            Value::UnsignedInt(v) => encoder.emit_uint_minor(0, *v),
            Value::SignedInt(v) => emit_i64(encoder, *v),
            Value::BigInt(b) => b.to_cbor(encoder),
            Value::Bool(b) => b.to_cbor(encoder),
            Value::Null => encoder.data.push((7 << 5) | 22),
            Value::Undefined => encoder.data.push((7 << 5) | 23),
            Value::Simple(s) => s.to_cbor(encoder),
            Value::Float(f) => f.to_cbor(encoder),
            Value::ByteString(b) => b.to_cbor(encoder),
            Value::TextString(s) => s.to_cbor(encoder),
            Value::Array(items) => encoder.emit_slice(items),
            Value::Map(entries) => encoder.emit_map(entries.len(), |m| {
                for (k, v) in entries {
                    m.emit(k);
                    m.emit(v);
                }
            }),
        }
    }
}

pub fn emit<T>(value: &T) -> Vec<u8>
where
    T: ToCbor + ?Sized,
{
    let mut e = Encoder::new();
    e.emit(value);
    e.build()
}

pub fn emit_tagged<T, I>(value: &T, tags: I) -> Vec<u8>
where
    T: ToCbor + ?Sized,
    I: IntoIterator<Item = u64>,
{
    let mut e = Encoder::new();
    e.emit_tagged(value, tags);
    e.build()
}

pub fn emit_array<F>(count: usize, f: F) -> Vec<u8>
where
    F: FnOnce(&mut Array),
{
    let mut e = Encoder::new();
    e.emit_array(count, f);
    e.build()
}

pub fn emit_map<F>(count: usize, f: F) -> Vec<u8>
where
    F: FnOnce(&mut Map),
{
    let mut e = Encoder::new();
    e.emit_map(count, f);
    e.build()
}

/// The canonical encoding of `value`.
pub fn encode(value: &Value) -> Vec<u8> {
    emit(value)
}
