#![forbid(unsafe_code)]

use islandis_core::DerError;

/// Decode OBJECT IDENTIFIER content octets into dotted-decimal text.
///
/// The first subidentifier packs the first two arcs as `40 * a + b`, where
/// `a` is at most 2; arcs below 2 have a second arc below 40.
pub fn decode_oid(content: &[u8]) -> Result<String, DerError> {
    match content.last() {
        None => return Err(DerError::InvalidOid),
        Some(last) if last & 0x80 != 0 => return Err(DerError::InvalidOid),
        _ => {}
    }

    let mut subidentifiers: Vec<u64> = Vec::new();
    let mut value: u64 = 0;
    let mut at_start = true;
    for &octet in content {
        if at_start && octet == 0x80 {
            return Err(DerError::InvalidOid);
        }
        if value > u64::MAX >> 7 {
            return Err(DerError::InvalidOid);
        }
        value = (value << 7) | u64::from(octet & 0x7F);
        at_start = octet & 0x80 == 0;
        if at_start {
            subidentifiers.push(value);
            value = 0;
        }
    }

    let first = subidentifiers[0];
    let (a, b) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };

    let mut text = format!("{a}.{b}");
    for arc in &subidentifiers[1..] {
        text.push('.');
        text.push_str(&arc.to_string());
    }
    Ok(text)
}
