use std::collections::BTreeMap;

use serde_json::json;
use serix::{
    Api, ConfigError, Context, ContextAware, DataError, Decode, Encode, Error, LengthError,
    LengthPrefix, ObjectType, Options, TypeSettings,
};

#[derive(Debug, PartialEq, Encode, Decode)]
struct Named {
    #[serix(position = 0, min_len = 5, max_len = 10, length_prefix = u8)]
    name: String,
}

#[test]
fn prefixed_string_with_object_code() {
    let api = Api::new();
    api.register_type_settings::<Named>(TypeSettings::new().with_object_type(ObjectType::uint8(0)))
        .unwrap();
    let ctx = Context::new();
    let opts = Options::new().with_validation();

    let value = Named {
        name: "abcde".into(),
    };
    let bytes = api.encode(&ctx, &value, &opts).unwrap();
    assert_eq!(bytes, vec![0, 5, b'a', b'b', b'c', b'd', b'e']);
    assert_eq!(api.decode_value::<Named>(&ctx, &bytes, &opts).unwrap(), (value, 7));

    let short = Named { name: "abc".into() };
    let err = api.encode(&ctx, &short, &opts).unwrap_err();
    assert!(matches!(
        err.root(),
        Error::Length(LengthError::TooShort { min: 5, actual: 3 })
    ));
    assert_eq!(err.path(), "name");
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Limits {
    #[serix(position = 0, length_prefix = u8, min_len = 2, max_len = 4)]
    limits: BTreeMap<String, u32>,
}

#[test]
fn map_field_element_bounds() {
    let api = Api::new();
    api.register_type_settings::<String>(TypeSettings::new().with_length_prefix(LengthPrefix::Uint8))
        .unwrap();
    let ctx = Context::new();
    let opts = Options::new().with_validation();
    let limits = |n: u32| Limits {
        limits: (0..n).map(|i| (format!("k{i}"), i)).collect(),
    };

    let err = api.encode(&ctx, &limits(1), &opts).unwrap_err();
    assert!(err.to_string().contains("minimum elements not reached"));
    let err = api.encode(&ctx, &limits(5), &opts).unwrap_err();
    assert!(err.to_string().contains("maximum elements exceeded"));
    let err = api.map_encode(&ctx, &limits(1), &opts).unwrap_err();
    assert!(err.to_string().contains("minimum elements not reached"));

    let ok = limits(3);
    let bytes = api.encode(&ctx, &ok, &opts).unwrap();
    assert_eq!(bytes[0], 3);
    assert_eq!(api.decode_value::<Limits>(&ctx, &bytes, &opts).unwrap().0, ok);

    // bounds are only enforced under validation
    assert!(api.encode(&ctx, &limits(5), &Options::new()).is_ok());
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Blob {
    #[serix(position = 0, omit_empty, length_prefix = u16)]
    data: Vec<u8>,
    #[serix(position = 1)]
    id: u32,
}

#[test]
fn empty_bytes_are_omitted() {
    let api = Api::new();
    let ctx = Context::new();
    let opts = Options::new();

    let blob = Blob { data: vec![], id: 1 };
    let text = api.json_encode(&ctx, &blob, &opts).unwrap();
    assert_eq!(text, r#"{"id":1}"#);

    let mut back = Blob {
        data: vec![9],
        id: 0,
    };
    api.json_decode(&ctx, &text, &mut back, &opts).unwrap();
    assert_eq!(back.data.len(), 0);
    api.json_decode(&ctx, r#"{"data":null,"id":1}"#, &mut back, &opts)
        .unwrap();
    assert_eq!(back, blob);

    let full = Blob {
        data: vec![0xca, 0xfe],
        id: 2,
    };
    assert_eq!(
        api.map_encode(&ctx, &full, &opts).unwrap(),
        json!({"data": "0xcafe", "id": 2})
    );
    assert_eq!(
        api.encode(&ctx, &full, &opts).unwrap(),
        vec![2, 0, 0xca, 0xfe, 2, 0, 0, 0]
    );
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Note {
    #[serix(position = 0, optional, length_prefix = u16)]
    text: Option<String>,
    #[serix(position = 1)]
    flag: bool,
}

#[test]
fn optional_field_zero_marker() {
    let api = Api::new();
    let ctx = Context::new();
    let opts = Options::new();

    let empty = Note {
        text: None,
        flag: true,
    };
    let bytes = api.encode(&ctx, &empty, &opts).unwrap();
    assert_eq!(bytes, vec![0, 0, 1]);
    assert_eq!(api.decode_value::<Note>(&ctx, &bytes, &opts).unwrap(), (empty, 3));

    let some = Note {
        text: Some("hi".into()),
        flag: false,
    };
    let bytes = api.encode(&ctx, &some, &opts).unwrap();
    assert_eq!(bytes, vec![4, 0, 2, 0, b'h', b'i', 0]);
    assert_eq!(api.decode_value::<Note>(&ctx, &bytes, &opts).unwrap().0, some);
    assert_eq!(
        api.map_encode(&ctx, &some, &opts).unwrap(),
        json!({"text": "hi", "flag": false})
    );

    // the declared payload length must match what the value consumed
    let err = api
        .decode_value::<Note>(&ctx, &[5, 0, 2, 0, b'h', b'i', 0, 0], &opts)
        .unwrap_err();
    assert!(matches!(
        err.root(),
        Error::Data(DataError::PayloadLengthMismatch {
            expected: 5,
            actual: 4
        })
    ));
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Marker {
    #[serix(position = 0, optional)]
    tag: Option<[u8; 0]>,
    #[serix(position = 1)]
    level: u8,
}

#[test]
fn present_optional_must_not_encode_empty() {
    let api = Api::new();
    let ctx = Context::new();
    let opts = Options::new();

    let absent = Marker {
        tag: None,
        level: 5,
    };
    let bytes = api.encode(&ctx, &absent, &opts).unwrap();
    assert_eq!(bytes, vec![0, 0, 0, 0, 5]);
    assert_eq!(api.decode_value::<Marker>(&ctx, &bytes, &opts).unwrap(), (absent, 5));

    let present = Marker {
        tag: Some([]),
        level: 5,
    };
    let err = api.encode(&ctx, &present, &opts).unwrap_err();
    assert_eq!(err.path(), "tag");
    assert!(matches!(
        err.root(),
        Error::Data(DataError::EmptyOptionalPayload { .. })
    ));
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Header {
    #[serix(position = 0)]
    version: u8,
}

#[allow(non_snake_case)]
#[derive(Debug, PartialEq, Encode, Decode)]
struct Packet {
    #[serix(position = 1)]
    seq_ID: u16,
    #[serix(position = 0, inlined)]
    header: Header,
    cached: Option<u64>,
}

#[test]
fn positions_and_inlined_fields() {
    let api = Api::new();
    api.register_type_settings::<Header>(TypeSettings::new().with_object_type(ObjectType::uint8(9)))
        .unwrap();
    let ctx = Context::new();
    let opts = Options::new();
    let packet = Packet {
        seq_ID: 2,
        header: Header { version: 1 },
        cached: Some(5),
    };

    let bytes = api.encode(&ctx, &packet, &opts).unwrap();
    assert_eq!(bytes, vec![1, 2, 0]);
    let (back, _) = api.decode_value::<Packet>(&ctx, &bytes, &opts).unwrap();
    assert_eq!(back.cached, None);
    assert_eq!(back.header, packet.header);

    let map = api.map_encode(&ctx, &packet, &opts).unwrap();
    assert_eq!(map, json!({"version": 1, "seqId": 2}));
    let mut back = Packet {
        seq_ID: 0,
        header: Header { version: 0 },
        cached: None,
    };
    api.map_decode(&ctx, &map, &mut back, &opts).unwrap();
    assert_eq!((back.seq_ID, back.header.version), (2, 1));

    let err = api
        .map_decode(&ctx, &json!({"version": 1}), &mut back, &opts)
        .unwrap_err();
    assert!(matches!(err.root(), Error::Data(DataError::MissingKey { key }) if key == "seqId"));
}

#[derive(Encode, Decode)]
struct Clash {
    #[serix(position = 1)]
    a: u8,
    #[serix(position = 1)]
    b: u8,
}

#[derive(Encode, Decode)]
struct NotNullable {
    #[serix(position = 0, optional)]
    a: u8,
}

#[test]
fn annotation_errors() {
    let api = Api::new();
    let ctx = Context::new();
    let opts = Options::new();
    assert!(matches!(
        api.encode(&ctx, &Clash { a: 1, b: 2 }, &opts),
        Err(Error::Config(ConfigError::DuplicatePosition { position: 1, .. }))
    ));
    assert!(matches!(
        api.encode(&ctx, &NotNullable { a: 1 }, &opts),
        Err(Error::Config(ConfigError::InvalidOptional { .. }))
    ));
}

struct Network(&'static str);

#[derive(Debug, Default, PartialEq, Encode, Decode)]
#[serix(context)]
struct Account {
    #[serix(position = 0, map_key = "n")]
    nonce: u32,
    network: String,
}

impl ContextAware for Account {
    fn set_context(&mut self, ctx: &Context) {
        if let Some(Network(name)) = ctx.value::<Network>() {
            self.network = (*name).to_owned();
        }
    }
}

#[test]
fn context_reaches_decoded_values() {
    let api = Api::new();
    let ctx = Context::new().with_value(Network("testnet"));
    let opts = Options::new();
    let mut account = Account::default();
    api.decode(&ctx, &[7, 0, 0, 0], &mut account, &opts).unwrap();
    assert_eq!(
        account,
        Account {
            nonce: 7,
            network: "testnet".into()
        }
    );
    assert_eq!(api.map_encode(&ctx, &account, &opts).unwrap(), json!({"n": 7}));
}

#[test]
fn decode_errors_do_not_touch_target() {
    let api = Api::new();
    let ctx = Context::new();
    let mut account = Account {
        nonce: 3,
        network: "main".into(),
    };
    let err = api
        .decode(&ctx, &[7, 0], &mut account, &Options::new())
        .unwrap_err();
    assert!(matches!(err.root(), Error::Parse(_)));
    assert_eq!(account.nonce, 3);
}
