/// Check if a 16-bit code is a GREASE value (RFC 8701).
///
/// GREASE values follow the pattern 0x?A?A with both bytes identical:
/// 0x0A0A, 0x1A1A, 0x2A2A, ..., 0xFAFA. The same set is reserved in the
/// cipher suite, extension type, named group and version registries.
pub fn is_grease(code: u16) -> bool {
    let [hi, lo] = code.to_be_bytes();
    hi == lo && (hi & 0x0F) == 0x0A
}
