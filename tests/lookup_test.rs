//! A hand-built table shaped like the generated C one, driven through the
//! public runtime API.

use propmap::*;

type Handler = fn() -> u32;

fn parse_color() -> u32 {
    encode_opv(0x000, 0, 0)
}
fn parse_margin() -> u32 {
    encode_opv(SENTINEL_OPCODE as u32, 0, 0)
}
fn parse_width() -> u32 {
    encode_opv(0x001, 0x02, 7)
}
fn parse_z_index() -> u32 {
    encode_opv(0x002, 0, fixed_bits(1.5))
}

static G: [u16; 9] = [0, 3, 0, 0, 1, 0, 0, 2, 0];
static S1: [u8; 2] = [3, 3];
static S2: [u8; 2] = [2, 17];
static TABLE: [Option<SlotEntry<'static, Handler>>; 9] = [
    Some(SlotEntry::new("color", parse_color as Handler)),
    Some(SlotEntry::new("margin", parse_margin as Handler)),
    Some(SlotEntry::new("width", parse_width as Handler)),
    Some(SlotEntry::new("z-index", parse_z_index as Handler)),
    None,
    None,
    None,
    None,
    None,
];

fn table() -> PropertyLookup<'static, SlotEntry<'static, Handler>> {
    PropertyLookup::new(&G, &S1, &S2, &TABLE, 63).unwrap()
}

#[test]
fn every_key_sits_at_its_string_index() {
    let t = table();
    for (i, name) in ["color", "margin", "width", "z-index"].iter().enumerate() {
        assert_eq!(t.slot(name.as_bytes()), Some(i));
        assert_eq!(t.lookup_str(name).map(|e| e.name), Some(*name));
    }
    assert_eq!(t.len(), 4);
    assert_eq!(t.table_size(), 9);
}

#[test]
fn handlers_produce_bytecode() {
    let t = table();
    let width = (t.lookup_str("WIDTH").unwrap().handler)();
    assert_eq!(opcode_of(width), 1);
    assert_eq!(flags_of(width), 2);
    assert_eq!(value_of(width), 7);

    let margin = (t.lookup_str("Margin").unwrap().handler)();
    assert!(is_sentinel(opcode_of(margin)));

    let z = (t.lookup_str("z-index").unwrap().handler)();
    assert_eq!(from_fixed(value_of(z) as i32), 1.5);
}

#[test]
fn outsiders_are_rejected_after_colliding() {
    let t = table();
    // Each of these hashes onto an occupied slot.
    assert_eq!(t.slot(b"colour"), Some(0));
    assert_eq!(t.slot(b"top"), Some(1));
    assert_eq!(t.slot(b"marg"), Some(1));
    for outsider in ["colour", "top", "marg", "z_index", ""] {
        assert!(t.lookup_str(outsider).is_none(), "{}", outsider);
    }
}

#[test]
fn overlong_queries_miss() {
    let t = PropertyLookup::new(&G, &S1, &S2, &TABLE, 5).unwrap();
    assert!(t.lookup_str("color").is_some());
    assert!(t.lookup_str("margin").is_none());
}
