use super::decode::*;
use super::value::*;
use alloc::{string::String, vec, vec::Vec};
use hex_literal::hex;

fn uint(v: u64) -> Value {
    Value::UnsignedInt(v)
}

fn text(s: &str) -> Value {
    Value::TextString(String::from(s))
}

fn array(items: Vec<Value>) -> Value {
    Value::Array(items)
}

fn bignum(sign: Sign, magnitude: &[u8]) -> Value {
    Value::BigInt(BigInt::new(sign, magnitude))
}

#[test]
fn rfc_tests() {
    // RFC 8949, Appendix A:
    // https://www.rfc-editor.org/rfc/rfc8949.html#section-appendix.a

    assert_eq!(uint(0), decode(&hex!("00")).unwrap());
    assert_eq!(uint(1), decode(&hex!("01")).unwrap());
    assert_eq!(uint(10), decode(&hex!("0a")).unwrap());
    assert_eq!(uint(23), decode(&hex!("17")).unwrap());
    assert_eq!(uint(24), decode(&hex!("1818")).unwrap());
    assert_eq!(uint(25), decode(&hex!("1819")).unwrap());
    assert_eq!(uint(100), decode(&hex!("1864")).unwrap());
    assert_eq!(uint(1000), decode(&hex!("1903e8")).unwrap());
    assert_eq!(uint(1000000), decode(&hex!("1a000f4240")).unwrap());
    assert_eq!(
        uint(1000000000000),
        decode(&hex!("1b000000e8d4a51000")).unwrap()
    );
    assert_eq!(
        uint(18446744073709551615),
        decode(&hex!("1bffffffffffffffff")).unwrap()
    );
    assert_eq!(
        bignum(Sign::Positive, &hex!("010000000000000000")),
        decode(&hex!("c249010000000000000000")).unwrap()
    );
    assert_eq!(
        bignum(Sign::Negative, &hex!("010000000000000000")),
        decode(&hex!("3bffffffffffffffff")).unwrap()
    );
    assert_eq!(
        bignum(Sign::Negative, &hex!("010000000000000001")),
        decode(&hex!("c349010000000000000000")).unwrap()
    );
    assert_eq!(Value::SignedInt(-1), decode(&hex!("20")).unwrap());
    assert_eq!(Value::SignedInt(-10), decode(&hex!("29")).unwrap());
    assert_eq!(Value::SignedInt(-100), decode(&hex!("3863")).unwrap());
    assert_eq!(Value::SignedInt(-1000), decode(&hex!("3903e7")).unwrap());

    let floats: &[(f64, &[u8])] = &[
        (0.0, &hex!("f90000")),
        (-0.0, &hex!("f98000")),
        (1.0, &hex!("f93c00")),
        (1.1, &hex!("fb3ff199999999999a")),
        (1.5, &hex!("f93e00")),
        (65504.0, &hex!("f97bff")),
        (100000.0, &hex!("fa47c35000")),
        (3.4028234663852886e+38, &hex!("fa7f7fffff")),
        (1.0e+300, &hex!("fb7e37e43c8800759c")),
        (5.960464477539063e-8, &hex!("f90001")),
        (0.00006103515625, &hex!("f90400")),
        (-4.0, &hex!("f9c400")),
        (-4.1, &hex!("fbc010666666666666")),
        (f64::INFINITY, &hex!("f97c00")),
        (f64::NEG_INFINITY, &hex!("f9fc00")),
        (f64::INFINITY, &hex!("fa7f800000")),
        (f64::NEG_INFINITY, &hex!("faff800000")),
        (f64::INFINITY, &hex!("fb7ff0000000000000")),
        (f64::NEG_INFINITY, &hex!("fbfff0000000000000")),
    ];
    for &(expected, data) in floats {
        assert_eq!(Value::Float(expected), decode(data).unwrap());
    }
    assert!(decode(&hex!("f98000")).unwrap().as_f64().unwrap().is_sign_negative());
    for data in [
        &hex!("f97e00")[..],
        &hex!("fa7fc00000"),
        &hex!("fb7ff8000000000000"),
    ] {
        assert!(decode(data).unwrap().as_f64().unwrap().is_nan());
    }

    assert_eq!(Value::Bool(false), decode(&hex!("f4")).unwrap());
    assert_eq!(Value::Bool(true), decode(&hex!("f5")).unwrap());
    assert_eq!(Value::Null, decode(&hex!("f6")).unwrap());
    assert_eq!(Value::Undefined, decode(&hex!("f7")).unwrap());
    assert_eq!(
        Value::Simple(Simple::new(16).unwrap()),
        decode(&hex!("f0")).unwrap()
    );
    assert_eq!(
        Value::Simple(Simple::new(255).unwrap()),
        decode(&hex!("f8ff")).unwrap()
    );

    // Tags other than bignums are dropped
    assert_eq!(
        text("2013-03-21T20:04:00Z"),
        decode(&hex!("c074323031332d30332d32315432303a30343a30305a")).unwrap()
    );
    assert_eq!(uint(1363896240), decode(&hex!("c11a514b67b0")).unwrap());
    assert_eq!(
        Value::Float(1363896240.5),
        decode(&hex!("c1fb41d452d9ec200000")).unwrap()
    );
    assert_eq!(
        Value::ByteString(hex!("01020304").to_vec()),
        decode(&hex!("d74401020304")).unwrap()
    );
    assert_eq!(
        Value::ByteString(hex!("6449455446").to_vec()),
        decode(&hex!("d818456449455446")).unwrap()
    );
    assert_eq!(
        text("http://www.example.com"),
        decode(&hex!("d82076687474703a2f2f7777772e6578616d706c652e636f6d")).unwrap()
    );

    assert_eq!(Value::ByteString(Vec::new()), decode(&hex!("40")).unwrap());
    assert_eq!(
        Value::ByteString(hex!("01020304").to_vec()),
        decode(&hex!("4401020304")).unwrap()
    );
    assert_eq!(text(""), decode(&hex!("60")).unwrap());
    assert_eq!(text("a"), decode(&hex!("6161")).unwrap());
    assert_eq!(text("IETF"), decode(&hex!("6449455446")).unwrap());
    assert_eq!(text("\"\\"), decode(&hex!("62225c")).unwrap());
    assert_eq!(text("\u{00fc}"), decode(&hex!("62c3bc")).unwrap());
    assert_eq!(text("\u{6c34}"), decode(&hex!("63e6b0b4")).unwrap());
    assert_eq!(
        text("\u{10151}"), /* surrogate pair: \u{d800}\u{dd51} */
        decode(&hex!("64f0908591")).unwrap()
    );

    let nested = array(vec![
        uint(1),
        array(vec![uint(2), uint(3)]),
        array(vec![uint(4), uint(5)]),
    ]);
    let counted = array((1..=25).map(uint).collect());
    let map_ab = Value::Map(vec![
        (text("a"), uint(1)),
        (text("b"), array(vec![uint(2), uint(3)])),
    ]);
    let a_then_map = array(vec![text("a"), Value::Map(vec![(text("b"), text("c"))])]);

    assert_eq!(array(Vec::new()), decode(&hex!("80")).unwrap());
    assert_eq!(
        array(vec![uint(1), uint(2), uint(3)]),
        decode(&hex!("83010203")).unwrap()
    );
    assert_eq!(nested, decode(&hex!("8301820203820405")).unwrap());
    assert_eq!(
        counted,
        decode(&hex!(
            "98190102030405060708090a0b0c0d0e0f101112131415161718181819"
        ))
        .unwrap()
    );
    assert_eq!(Value::Map(Vec::new()), decode(&hex!("a0")).unwrap());
    assert_eq!(
        Value::Map(vec![(uint(1), uint(2)), (uint(3), uint(4))]),
        decode(&hex!("a201020304")).unwrap()
    );
    assert_eq!(map_ab, decode(&hex!("a26161016162820203")).unwrap());
    assert_eq!(a_then_map, decode(&hex!("826161a161626163")).unwrap());
    assert_eq!(
        Value::Map(
            ["a", "b", "c", "d", "e"]
                .iter()
                .map(|k| (text(k), text(&k.to_uppercase())))
                .collect()
        ),
        decode(&hex!("a56161614161626142616361436164614461656145")).unwrap()
    );

    // Indefinite length items
    assert_eq!(
        Value::ByteString(hex!("0102030405").to_vec()),
        decode(&hex!("5f42010243030405ff")).unwrap()
    );
    assert_eq!(
        text("streaming"),
        decode(&hex!("7f657374726561646d696e67ff")).unwrap()
    );
    assert_eq!(array(Vec::new()), decode(&hex!("9fff")).unwrap());
    assert_eq!(nested, decode(&hex!("9f018202039f0405ffff")).unwrap());
    assert_eq!(nested, decode(&hex!("9f01820203820405ff")).unwrap());
    assert_eq!(nested, decode(&hex!("83018202039f0405ff")).unwrap());
    assert_eq!(nested, decode(&hex!("83019f0203ff820405")).unwrap());
    assert_eq!(
        counted,
        decode(&hex!(
            "9f0102030405060708090a0b0c0d0e0f101112131415161718181819ff"
        ))
        .unwrap()
    );
    assert_eq!(map_ab, decode(&hex!("bf61610161629f0203ffff")).unwrap());
    assert_eq!(a_then_map, decode(&hex!("826161bf61626163ff")).unwrap());
    assert_eq!(
        Value::Map(vec![
            (text("Fun"), Value::Bool(true)),
            (text("Amt"), Value::SignedInt(-2)),
        ]),
        decode(&hex!("bf6346756ef563416d7421ff")).unwrap()
    );
}

#[test]
fn integer_boundaries() {
    assert_eq!(
        Value::SignedInt(i64::MIN),
        decode(&hex!("3b7fffffffffffffff")).unwrap()
    );
    assert_eq!(
        bignum(Sign::Negative, &hex!("8000000000000001")),
        decode(&hex!("3b8000000000000000")).unwrap()
    );

    // Bignums that fit 64 bits narrow to native integers
    assert_eq!(uint(1), decode(&hex!("c24101")).unwrap());
    assert_eq!(uint(0), decode(&hex!("c240")).unwrap());
    assert_eq!(Value::SignedInt(-1), decode(&hex!("c340")).unwrap());
    assert_eq!(
        uint(u64::MAX),
        decode(&hex!("c24900ffffffffffffffff")).unwrap()
    );
    assert_eq!(
        bignum(Sign::Negative, &hex!("010000000000000000")),
        decode(&hex!("c348ffffffffffffffff")).unwrap()
    );

    // Leading zero bytes in a magnitude are accepted
    assert_eq!(
        bignum(Sign::Positive, &hex!("010000000000000000")),
        decode(&hex!("c24b0000010000000000000000")).unwrap()
    );
}

#[test]
fn chunked_text_validates_as_a_whole() {
    // U+00FC split across two chunks
    assert_eq!(text("\u{00fc}"), decode(&hex!("7f61c361bcff")).unwrap());
    // U+10151 split three ways
    assert_eq!(
        text("\u{10151}"),
        decode(&hex!("7f62f09061856191ff")).unwrap()
    );
    assert_eq!(text(""), decode(&hex!("7fff")).unwrap());
    assert_eq!(Err(Error::InvalidUtf8), decode(&hex!("7f61c3ff")));
}

#[test]
fn malformed() {
    // Truncated input
    for data in [
        &[0u8; 0][..],
        &hex!("18"),
        &hex!("19ff"),
        &hex!("1a000000"),
        &hex!("1b00000000000000"),
        &hex!("4201"),
        &hex!("62c3"),
        &hex!("8301"),
        &hex!("a16161"),
        &hex!("9f01"),
        &hex!("5f41"),
        &hex!("5f4101"),
        &hex!("c2"),
        &hex!("c249010000"),
        &hex!("f9"),
        &hex!("fa0000"),
        &hex!("fb000000000000"),
        &hex!("f8"),
        &hex!("5bffffffffffffffff01"),
        &hex!("9bffffffffffffffff"),
    ] {
        assert_eq!(Err(Error::UnexpectedEof), decode(data), "{data:02x?}");
    }

    for data in [
        &hex!("1c")[..],
        &hex!("1d"),
        &hex!("1e"),
        &hex!("3c"),
        &hex!("5d"),
        &hex!("7e"),
        &hex!("9c"),
        &hex!("bd"),
        &hex!("de"),
        &hex!("fc"),
        &hex!("fd"),
        &hex!("fe"),
        &hex!("5f5cff"),
    ] {
        assert_eq!(Err(Error::ReservedEncoding), decode(data), "{data:02x?}");
    }

    for data in [&hex!("1f")[..], &hex!("3f"), &hex!("df00")] {
        assert_eq!(Err(Error::InvalidIndefiniteLength), decode(data));
    }

    for data in [
        &hex!("5f5f4101ffff")[..],
        &hex!("5f6161ff"),
        &hex!("7f4161ff"),
        &hex!("7f7f6161ffff"),
        &hex!("5f01ff"),
        &hex!("5fc24101ff"),
    ] {
        assert_eq!(Err(Error::MalformedChunking), decode(data), "{data:02x?}");
    }

    assert_eq!(Err(Error::TruncatedMap), decode(&hex!("bf6161ff")));
    assert_eq!(Err(Error::TruncatedMap), decode(&hex!("bf6161016162ff")));

    for data in [
        &hex!("ff")[..],
        &hex!("81ff"),
        &hex!("a1ff"),
        &hex!("a101ff"),
        &hex!("c1ff"),
        &hex!("9fc1ffff"),
        &hex!("c2ff"),
    ] {
        assert_eq!(Err(Error::UnexpectedBreak), decode(data), "{data:02x?}");
    }

    assert_eq!(Err(Error::InvalidUtf8), decode(&hex!("62c328")));
    assert_eq!(Err(Error::InvalidUtf8), decode(&hex!("61ff")));

    for data in [
        &hex!("c201")[..],
        &hex!("c36161"),
        &hex!("c25f4101ff"),
        &hex!("c280"),
        &hex!("c3c24101"),
    ] {
        assert_eq!(Err(Error::InvalidTaggedValue), decode(data), "{data:02x?}");
    }

    assert_eq!(Err(Error::InvalidSimpleValue(0)), decode(&hex!("f800")));
    assert_eq!(Err(Error::InvalidSimpleValue(31)), decode(&hex!("f81f")));
}

#[test]
fn trailing_data() {
    assert_eq!(Err(Error::TrailingData), decode(&hex!("0001")));
    assert_eq!(Err(Error::TrailingData), decode(&hex!("9fff00")));

    let (value, rest) = decode_prefix(&hex!("820102ff0a")).unwrap();
    assert_eq!(array(vec![uint(1), uint(2)]), value);
    assert_eq!(&hex!("ff0a"), rest);

    let (value, rest) = decode_prefix(&hex!("60")).unwrap();
    assert_eq!(text(""), value);
    assert!(rest.is_empty());

    assert_eq!(Err(Error::UnexpectedEof), decode_prefix(&[]));
}

#[test]
fn depth_limit() {
    let decoder = Decoder::new().with_max_depth(2);
    assert!(decoder.decode(&hex!("818100")).is_ok());
    assert_eq!(
        Err(Error::DepthExceeded),
        decoder.decode(&hex!("81818100"))
    );
    assert_eq!(Err(Error::DepthExceeded), decoder.decode(&hex!("81c1c100")));
    assert_eq!(Err(Error::DepthExceeded), decoder.decode(&hex!("a1008180")));
    assert_eq!(Err(Error::DepthExceeded), decoder.decode(&hex!("9f9f9fffffff")));

    let decoder = Decoder::with_options(DecodeOptions { max_depth: 0 });
    assert_eq!(uint(1), decoder.decode(&hex!("01")).unwrap());
    assert_eq!(Err(Error::DepthExceeded), decoder.decode(&hex!("80")));

    let mut deep = vec![0x81u8; 1000];
    deep.push(0x00);
    assert_eq!(Err(Error::DepthExceeded), decode(&deep));
    let value = Decoder::new().with_max_depth(1000).decode(&deep).unwrap();
    let mut depth = 0;
    let mut v = &value;
    while let Value::Array(items) = v {
        depth += 1;
        v = &items[0];
    }
    assert_eq!(1000, depth);
    assert_eq!(&uint(0), v);
}

#[test]
fn oversized_counts() {
    // Counts larger than the input are rejected without huge allocations
    assert_eq!(
        Err(Error::UnexpectedEof),
        decode(&hex!("9bffffffffffffffff01"))
    );
    assert_eq!(
        Err(Error::UnexpectedEof),
        decode(&hex!("bbffffffffffffffff0102"))
    );
}

#[test]
fn duplicate_keys_preserved() {
    assert_eq!(
        Value::Map(vec![
            (uint(1), uint(2)),
            (uint(1), uint(3)),
            (uint(1), uint(2)),
        ]),
        decode(&hex!("a3010201030102")).unwrap()
    );
}

#[test]
fn detail_flags() {
    let d = decode_detail(&hex!("83018202039f0405ff")).unwrap();
    assert!(d.indefinite);
    assert!(!d.canonical);
    assert!(!d.exact);
    assert_eq!(9, d.len);

    let d = decode_detail(&hex!("8301820203820405")).unwrap();
    assert!(!d.indefinite);
    assert!(d.canonical);
    assert!(d.exact);

    // Definite but not shortest
    for data in [
        &hex!("1817")[..],
        &hex!("190017"),
        &hex!("1a000000ff"),
        &hex!("1b00000000ffffffff"),
        &hex!("380a"),
        &hex!("590001ff"),
        &hex!("9800"),
        &hex!("b800"),
    ] {
        let d = decode_detail(data).unwrap();
        assert!(!d.indefinite, "{data:02x?}");
        assert!(!d.canonical, "{data:02x?}");
        assert!(!d.exact, "{data:02x?}");
    }

    // Shortest heads, but the encoder would write something else
    for data in [
        &hex!("fa3fc00000")[..],
        &hex!("fb3ff8000000000000"),
        &hex!("fb7ff8000000000000"),
        &hex!("c600"),
        &hex!("c11a514b67b0"),
        &hex!("c24101"),
        &hex!("c248ffffffffffffffff"),
        &hex!("c24a00010000000000000000"),
    ] {
        let d = decode_detail(data).unwrap();
        assert!(d.canonical, "{data:02x?}");
        assert!(!d.exact, "{data:02x?}");
    }

    for data in [
        &hex!("1818")[..],
        &hex!("f93e00"),
        &hex!("f97e00"),
        &hex!("fa47c35000"),
        &hex!("c249010000000000000000"),
        &hex!("f8ff"),
        &hex!("f0"),
    ] {
        let d = decode_detail(data).unwrap();
        assert!(d.canonical, "{data:02x?}");
        assert!(d.exact, "{data:02x?}");
    }
}
