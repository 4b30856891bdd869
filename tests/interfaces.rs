use serde_json::json;
use serix::{
    Api, Context, DataError, Decode, Encode, Error, Implementation, Object, ObjectType, Options,
    TypeSettings,
};

pub trait Shape: Object {
    fn area(&self) -> u64;
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Circle {
    #[serix(position = 0)]
    radius: u32,
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Square {
    #[serix(position = 0)]
    side: u32,
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Triangle {
    #[serix(position = 0)]
    base: u32,
}

impl Shape for Circle {
    fn area(&self) -> u64 {
        3 * u64::from(self.radius).pow(2)
    }
}

impl Shape for Square {
    fn area(&self) -> u64 {
        u64::from(self.side).pow(2)
    }
}

impl Shape for Triangle {
    fn area(&self) -> u64 {
        u64::from(self.base)
    }
}

serix::interface!(dyn Shape);

#[derive(Encode, Decode)]
struct Drawing {
    #[serix(position = 0, length_prefix = u8)]
    shapes: Vec<Box<dyn Shape>>,
    #[serix(position = 1, optional)]
    focus: Option<Box<dyn Shape>>,
}

#[derive(Encode, Decode)]
struct Envelope {
    #[serix(position = 0)]
    id: u8,
    #[serix(position = 1, inlined)]
    body: Box<dyn Shape>,
}

#[derive(Encode, Decode)]
struct Palette {
    #[serix(position = 0, length_prefix = u8, must_occur(1), unique_types)]
    shapes: Vec<Box<dyn Shape>>,
}

fn api() -> Api {
    let api = Api::new();
    api.register_type_settings::<Circle>(TypeSettings::new().with_object_type(ObjectType::uint8(1)))
        .unwrap();
    api.register_type_settings::<Square>(TypeSettings::new().with_object_type(ObjectType::uint8(2)))
        .unwrap();
    api.register_type_settings::<Triangle>(TypeSettings::new().with_object_type(ObjectType::uint8(3)))
        .unwrap();
    api.register_interface::<dyn Shape>(vec![
        Implementation::new::<Circle>(|c| Box::new(c)),
        Implementation::new::<Square>(|s| Box::new(s)),
    ])
    .unwrap();
    api
}

fn areas(shapes: &[Box<dyn Shape>]) -> Vec<u64> {
    shapes.iter().map(|s| s.area()).collect()
}

#[test]
fn binary_round_trip() {
    let api = api();
    let ctx = Context::new();
    let opts = Options::new();
    let drawing = Drawing {
        shapes: vec![Box::new(Circle { radius: 3 }), Box::new(Square { side: 4 })],
        focus: None,
    };
    let bytes = api.encode(&ctx, &drawing, &opts).unwrap();
    assert_eq!(bytes, vec![2, 1, 3, 0, 0, 0, 2, 4, 0, 0, 0, 0, 0, 0, 0]);

    let (back, used) = api.decode_value::<Drawing>(&ctx, &bytes, &opts).unwrap();
    assert_eq!(used, bytes.len());
    assert_eq!(areas(&back.shapes), vec![27, 16]);
    assert!(back.focus.is_none());

    let focused = Drawing {
        shapes: vec![],
        focus: Some(Box::new(Square { side: 2 })),
    };
    let bytes = api.encode(&ctx, &focused, &opts).unwrap();
    assert_eq!(bytes, vec![0, 5, 0, 0, 0, 2, 2, 0, 0, 0]);
    let (back, _) = api.decode_value::<Drawing>(&ctx, &bytes, &opts).unwrap();
    assert_eq!(back.focus.map(|s| s.area()), Some(4));
}

#[test]
fn map_round_trip() {
    let api = api();
    let ctx = Context::new();
    let opts = Options::new();
    let drawing = Drawing {
        shapes: vec![Box::new(Square { side: 1 }), Box::new(Circle { radius: 2 })],
        focus: None,
    };
    let map = api.map_encode(&ctx, &drawing, &opts).unwrap();
    assert_eq!(
        map,
        json!({"shapes": [{"type": 2, "side": 1}, {"type": 1, "radius": 2}]})
    );
    let text = api.json_encode(&ctx, &drawing, &opts).unwrap();
    let mut back = Drawing {
        shapes: vec![],
        focus: None,
    };
    api.json_decode(&ctx, &text, &mut back, &opts).unwrap();
    assert_eq!(areas(&back.shapes), vec![1, 12]);
}

#[test]
fn inlined_interface_splices_concrete_object() {
    let api = api();
    let ctx = Context::new();
    let opts = Options::new();
    let envelope = Envelope {
        id: 7,
        body: Box::new(Circle { radius: 1 }),
    };
    assert_eq!(api.encode(&ctx, &envelope, &opts).unwrap(), vec![7, 1, 1, 0, 0, 0]);
    let map = api.map_encode(&ctx, &envelope, &opts).unwrap();
    assert_eq!(map, json!({"id": 7, "type": 1, "radius": 1}));
    let mut back = Envelope {
        id: 0,
        body: Box::new(Square { side: 0 }),
    };
    api.map_decode(&ctx, &map, &mut back, &opts).unwrap();
    assert_eq!((back.id, back.body.area()), (7, 3));
}

#[test]
fn unregistered_and_unknown_types() {
    let api = api();
    let ctx = Context::new();
    let opts = Options::new();
    let drawing = Drawing {
        shapes: vec![Box::new(Triangle { base: 1 })],
        focus: None,
    };
    let err = api.encode(&ctx, &drawing, &opts).unwrap_err();
    assert!(matches!(
        err.root(),
        Error::Data(DataError::UnregisteredInterfaceType { .. })
    ));
    assert_eq!(err.path(), "shapes[0]");

    let err = api
        .decode_value::<Drawing>(&ctx, &[1, 3, 1, 0, 0, 0, 0, 0, 0, 0], &opts)
        .err().unwrap();
    assert!(matches!(
        err.root(),
        Error::Data(DataError::UnknownObjectCode { code: 3, .. })
    ));

    let mut back = Drawing {
        shapes: vec![],
        focus: None,
    };
    let err = api
        .map_decode(&ctx, &json!({"shapes": [{"type": 3, "base": 1}]}), &mut back, &opts)
        .unwrap_err();
    assert!(matches!(
        err.root(),
        Error::Data(DataError::UnknownObjectCode { code: 3, .. })
    ));
}

#[test]
fn element_type_rules() {
    let api = api();
    let ctx = Context::new();
    let opts = Options::new().with_validation();

    let missing = Palette {
        shapes: vec![Box::new(Square { side: 1 })],
    };
    let err = api.encode(&ctx, &missing, &opts).unwrap_err();
    assert!(matches!(err.root(), Error::Data(DataError::MustOccur { code: 1 })));

    let twice = Palette {
        shapes: vec![Box::new(Circle { radius: 1 }), Box::new(Circle { radius: 2 })],
    };
    let err = api.encode(&ctx, &twice, &opts).unwrap_err();
    assert!(matches!(err.root(), Error::Data(DataError::DuplicateType { code: 1 })));
    let err = api.map_encode(&ctx, &twice, &opts).unwrap_err();
    assert!(matches!(err.root(), Error::Data(DataError::DuplicateType { code: 1 })));

    let fine = Palette {
        shapes: vec![Box::new(Circle { radius: 1 }), Box::new(Square { side: 2 })],
    };
    let bytes = api.encode(&ctx, &fine, &opts).unwrap();
    let (back, _) = api.decode_value::<Palette>(&ctx, &bytes, &opts).unwrap();
    assert_eq!(areas(&back.shapes), vec![3, 4]);
}
