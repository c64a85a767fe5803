//! Address normalization and bulk address input parsing

use alloy_primitives::{hex, Address};
use std::collections::HashMap;
use std::str::FromStr;

use crate::model::AddressEntry;

/// Characters stripped from both ends of a label
const LABEL_SEPARATORS: &[char] = &[',', ';', ':', '|', '-', '\t', '"', '\'', ' '];

/// Parse a hex address into its lowercase `0x` form
///
/// Returns `None` for anything that is not exactly 20 bytes of hex.
pub fn normalize_address(value: &str) -> Option<String> {
    parse_address(value).map(|address| format_address(&address))
}

/// Parse a `0x`-prefixed 20-byte hex address
pub fn parse_address(value: &str) -> Option<Address> {
    let lower = value.trim().to_ascii_lowercase();
    if lower.len() != 42 || !lower.starts_with("0x") {
        return None;
    }
    Address::from_str(&lower).ok()
}

/// Lowercase `0x`-prefixed hex form used as the collection key
pub fn format_address(address: &Address) -> String {
    hex::encode_prefixed(address.as_slice())
}

/// Locate the first `0x` + 40 hex character run in a line
///
/// Hex digits past the 40th are left in place and end up in the label.
fn find_address(line: &str) -> Option<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut start = 0;
    while start + 42 <= bytes.len() {
        if bytes[start] == b'0' && (bytes[start + 1] == b'x' || bytes[start + 1] == b'X') {
            let digits = &bytes[start + 2..start + 42];
            if digits.iter().all(|b| b.is_ascii_hexdigit()) {
                return Some((start, start + 42));
            }
        }
        start += 1;
    }
    None
}

/// Parse free-text bulk input, one address per line with an optional label
///
/// The label is whatever remains on the line once the address is removed,
/// trimmed of separator punctuation. Lines without an address are skipped.
/// Repeated addresses keep a single entry carrying the last label seen.
pub fn parse_bulk_input(text: &str) -> Vec<AddressEntry> {
    let mut entries: Vec<AddressEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for line in text.lines() {
        let Some((start, end)) = find_address(line) else {
            continue;
        };
        let Some(address) = normalize_address(&line[start..end]) else {
            continue;
        };

        let remainder = format!("{} {}", &line[..start], &line[end..]);
        let label = remainder
            .trim_matches(|c: char| c.is_whitespace() || LABEL_SEPARATORS.contains(&c))
            .to_string();

        match positions.get(&address) {
            Some(&index) => entries[index].label = label,
            None => {
                positions.insert(address.clone(), entries.len());
                entries.push(AddressEntry { address, label });
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const AAA: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BBB: &str = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(
            normalize_address(BBB).as_deref(),
            Some("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb")
        );
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert!(normalize_address("0x1234").is_none());
        assert!(normalize_address("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").is_none());
        assert!(normalize_address("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_none());
    }

    #[test]
    fn test_parse_bulk_labels() {
        let text = format!(
            "Alice, {AAA}\n{BBB} - Bob's cold wallet\nnot an address\n\n{AAA}"
        );
        let entries = parse_bulk_input(&text);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].address, AAA);
        // repeated address keeps its slot, last label wins
        assert_eq!(entries[0].label, "");
        assert_eq!(entries[1].address, BBB.to_ascii_lowercase());
        assert_eq!(entries[1].label, "Bob's cold wallet");
    }

    #[test]
    fn test_parse_bulk_label_before_address() {
        let entries = parse_bulk_input(&format!("Treasury: {AAA}"));
        assert_eq!(entries[0].label, "Treasury");
    }

    #[test]
    fn test_parse_bulk_takes_first_forty_hex_digits() {
        let text = format!("{AAA}ff");
        let entries = parse_bulk_input(&text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, AAA);
        assert_eq!(entries[0].label, "ff");
    }
}
