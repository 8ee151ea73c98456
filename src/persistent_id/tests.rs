use super::*;

#[test]
fn test_encode_positive() {
    assert_eq!(PersistentId::new(123, 456, 789, 12).encode(), "123-456-789-12");
}

#[test]
fn test_encode_negative_produces_double_dash() {
    assert_eq!(
        PersistentId::new(123, 456, 789, -12).encode(),
        "123-456-789--12"
    );
}

#[test]
fn test_decode_vehicle_id() {
    let id = PersistentId::decode("10-20-30--5").unwrap();
    assert_eq!(id.parts(), [10, 20, 30, -5]);
    assert_eq!(PersistentId::new(10, 20, 30, -5).encode(), "10-20-30--5");
}

#[test]
fn test_round_trip_every_sign_combination() {
    let magnitudes = [7, 1_234_567, 42, 998_877];
    for mask in 0u8..16 {
        let mut parts = magnitudes;
        for (bit, part) in parts.iter_mut().enumerate() {
            if mask & (1 << bit) != 0 {
                *part = -*part;
            }
        }
        let id = PersistentId::new(parts[0], parts[1], parts[2], parts[3]);
        let encoded = id.encode();
        let decoded = PersistentId::decode(&encoded)
            .unwrap_or_else(|e| panic!("failed to decode {}: {}", encoded, e));
        assert_eq!(decoded, id, "round trip of {}", encoded);
    }
}

#[test]
fn test_round_trip_extremes() {
    let id = PersistentId::new(i32::MIN, i32::MAX, 0, -1);
    assert_eq!(PersistentId::decode(&id.encode()).unwrap(), id);
}

#[test]
fn test_leading_sign() {
    let id = PersistentId::decode("-1-2-3-4").unwrap();
    assert_eq!(id.parts(), [-1, 2, 3, 4]);
}

#[test]
fn test_all_negative() {
    let id = PersistentId::decode("-11--22--33--44").unwrap();
    assert_eq!(id.parts(), [-11, -22, -33, -44]);
}

#[test]
fn test_wrong_field_count() {
    assert_eq!(
        PersistentId::decode("1-2-3"),
        Err(ParseIdError::WrongFieldCount(3))
    );
    assert_eq!(
        PersistentId::decode("1-2-3-4-5"),
        Err(ParseIdError::WrongFieldCount(5))
    );
    assert_eq!(PersistentId::decode(""), Err(ParseIdError::WrongFieldCount(0)));
}

#[test]
fn test_invalid_fields_fail() {
    assert!(matches!(
        PersistentId::decode("1-2-3-x"),
        Err(ParseIdError::InvalidField(_))
    ));
    // Trailing dash is a sign with no digits after it
    assert!(matches!(
        PersistentId::decode("1-2-3-4-"),
        Err(ParseIdError::InvalidField(_))
    ));
    // Triple dash leaves "--2" which is not an integer
    assert!(matches!(
        PersistentId::decode("1---2-3-4"),
        Err(ParseIdError::InvalidField(_))
    ));
    // Out of i32 range
    assert!(matches!(
        PersistentId::decode("1-2-3-99999999999"),
        Err(ParseIdError::InvalidField(_))
    ));
}

#[test]
fn test_serde_uses_string_form() {
    let id = PersistentId::new(5, -6, 7, -8);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"5--6-7--8\"");

    let back: PersistentId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);

    let bad: Result<PersistentId, _> = serde_json::from_str("\"nope\"");
    assert!(bad.is_err());
}

#[test]
fn test_from_str() {
    let id: PersistentId = "1-2-3-4".parse().unwrap();
    assert_eq!(id, PersistentId::new(1, 2, 3, 4));
}
