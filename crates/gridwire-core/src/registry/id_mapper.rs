//! Name-to-id hashing shared with JVM peers.

/// Lower-cases `name` and hashes its UTF-16 code units the way a JVM string
/// hash does (`h = 31 * h + unit`, wrapping).
///
/// Lower-casing is the full Unicode mapping of the whole string, so a
/// character that lower-cases to several (`'İ'` to `"i\u{307}"`) contributes
/// all of them, and a final sigma becomes `'ς'`.
///
/// Type ids and field ids of the default mapper are produced this way so that
/// every node derives the same id from the same name.
#[must_use]
pub fn lower_case_hash(name: &str) -> i32 {
    if name.is_ascii() {
        return hash_units(name.bytes().map(|b| u16::from(b.to_ascii_lowercase())));
    }
    hash_units(name.to_lowercase().encode_utf16())
}

fn hash_units(units: impl Iterator<Item = u16>) -> i32 {
    units.fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
