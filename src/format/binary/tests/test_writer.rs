#[cfg(test)]
mod writer_tests {
    use crate::{
        error::plist::PlistError,
        format::binary::{decode, encode},
        util::stream::PlistWriteStream,
        value::{Dictionary, Real, RealWidth, Value},
    };

    fn render(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        encode(value, &mut stream);
        stream.finish().unwrap();
        out
    }

    fn round_trip(value: &Value) {
        assert_eq!(&decode(&render(value)).unwrap(), value);
    }

    #[test]
    fn can_write_golden_dictionary() {
        let mut dict = Dictionary::new();
        dict.insert("a", 1i64);

        let mut expected = b"bplist00".to_vec();
        expected.extend_from_slice(&[0x51, 0x61]); // "a", object id 1
        expected.extend_from_slice(&[0x10, 0x01]); // 1, object id 2
        expected.extend_from_slice(&[0xD1, 0x01, 0x02]); // the dict, object id 0
        expected.extend_from_slice(&[0x0C, 0x08, 0x0A]); // offset table
        expected.extend_from_slice(&[0; 6]);
        expected.push(1); // offset width
        expected.push(1); // reference width
        expected.extend_from_slice(&3u64.to_be_bytes());
        expected.extend_from_slice(&0u64.to_be_bytes());
        expected.extend_from_slice(&15u64.to_be_bytes());
        assert_eq!(expected.len(), 50);

        assert_eq!(render(&Value::Dictionary(dict)), expected);
    }

    #[test]
    fn can_write_booleans() {
        assert_eq!(render(&Value::Boolean(true))[8], 0x09);
        assert_eq!(render(&Value::Boolean(false))[8], 0x08);
    }

    #[test]
    fn can_round_trip_integer_widths() {
        for value in [0i64, -1, 127, -128, 128, 32767, -32768, 1 << 20, i64::MAX, i64::MIN] {
            round_trip(&Value::from(value));
        }
    }

    #[test]
    fn can_round_trip_reals() {
        round_trip(&Value::from(0.5f64));
        round_trip(&Value::from(-1234.25f64));
        round_trip(&Value::Real(Real {
            value: 1.5,
            width: RealWidth::Four,
        }));
    }

    #[test]
    fn can_round_trip_dates() {
        round_trip(&Value::Date(0.0));
        round_trip(&Value::Date(700_000_000.25));
        round_trip(&Value::Date(-978_307_200.0));
    }

    #[test]
    fn can_round_trip_strings() {
        round_trip(&Value::from(""));
        round_trip(&Value::from("plain ascii"));
        round_trip(&Value::from("héllo wörld"));
        round_trip(&Value::from("数据"));
    }

    #[test]
    fn can_round_trip_containers() {
        let mut inner = Dictionary::new();
        inner.insert("blob", Value::Data(vec![0xDE, 0xAD]));
        inner.insert("flag", false);
        let mut dict = Dictionary::new();
        dict.insert("list", Value::Array(vec![Value::from(1i64), Value::from("two")]));
        dict.insert("inner", Value::Dictionary(inner));
        dict.insert("tags", Value::Set(vec![Value::from("a"), Value::from("b")]));
        round_trip(&Value::Dictionary(dict));

        round_trip(&Value::Array(vec![]));
        round_trip(&Value::Dictionary(Dictionary::new()));
    }

    #[test]
    fn can_widen_references_for_many_objects() {
        let items: Vec<Value> = (0..300i64).map(Value::from).collect();
        let value = Value::Array(items);
        let data = render(&value);
        // The reference width byte sits 25 bytes from the end
        assert_eq!(data[data.len() - 25], 2);
        round_trip(&value);
    }

    #[test]
    fn can_widen_offsets_for_large_output() {
        let value = Value::Data(vec![0x5A; 300]);
        let data = render(&value);
        assert_eq!(data[data.len() - 26], 2);
        round_trip(&value);
    }

    #[test]
    fn can_spill_extended_lengths() {
        let value = Value::Data(vec![0x7E; 100]);
        let data = render(&value);
        assert_eq!(&data[8..11], &[0x4F, 0x10, 0x64]);
        round_trip(&value);
    }

    #[test]
    fn can_reject_graphs_with_too_many_objects() {
        // 70000 elements plus the root is more than two reference bytes
        // can address, so the writer refuses instead of wrapping ids
        let items: Vec<Value> = (0..70_000i64).map(Value::from).collect();
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        encode(&Value::Array(items), &mut stream);
        assert!(matches!(
            stream.finish(),
            Err(PlistError::TooManyObjects(70_001))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn can_reject_runaway_nesting() {
        let mut value = Value::from(1i64);
        for _ in 0..600 {
            value = Value::Array(vec![value]);
        }
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        encode(&value, &mut stream);
        assert!(matches!(
            stream.finish(),
            Err(PlistError::NestingTooDeep(_))
        ));
    }
}
