//! Specific Character Set (0008,0005) support.

use encoding_rs::{
    EUC_KR, Encoding, GB18030, GBK, ISO_2022_JP, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5,
    ISO_8859_6, ISO_8859_7, ISO_8859_8, ISO_8859_15, SHIFT_JIS, UTF_8, WINDOWS_874, WINDOWS_1252,
    WINDOWS_1254,
};

/// Designation escape for KS X 1001 in ISO 2022 IR 149 values.
const KS_X_1001_DESIGNATION: &[u8] = b"\x1b$)C";

/// Text encoding named by a Specific Character Set value.
///
/// Multi-valued sets use their first non-default term. `None` stands for the
/// default repertoire and for terms without a mapping.
pub(crate) fn encoding_for(terms: &str) -> Option<&'static Encoding> {
    terms.split('\\').map(str::trim).find_map(encoding_for_term)
}

fn encoding_for_term(term: &str) -> Option<&'static Encoding> {
    // "ISO_IR 100" and "ISO 2022 IR 100" name the same repertoire.
    let term = term
        .strip_prefix("ISO 2022 ")
        .or_else(|| term.strip_prefix("ISO_"))
        .unwrap_or(term);

    let encoding = match term {
        "IR 100" => WINDOWS_1252,
        "IR 101" => ISO_8859_2,
        "IR 109" => ISO_8859_3,
        "IR 110" => ISO_8859_4,
        "IR 144" => ISO_8859_5,
        "IR 127" => ISO_8859_6,
        "IR 126" => ISO_8859_7,
        "IR 138" => ISO_8859_8,
        "IR 148" => WINDOWS_1254,
        "IR 203" => ISO_8859_15,
        "IR 166" => WINDOWS_874,
        "IR 13" => SHIFT_JIS,
        "IR 87" | "IR 159" => ISO_2022_JP,
        "IR 149" => EUC_KR,
        "IR 192" => UTF_8,
        "GB18030" => GB18030,
        "GBK" => GBK,
        _ => return None,
    };
    Some(encoding)
}

/// Decode a text value and strip its padding.
///
/// Multiple values stay joined with `\`.
pub(crate) fn decode_text(bytes: &[u8], encoding: Option<&'static Encoding>) -> String {
    let text = match encoding {
        Some(encoding) if encoding == EUC_KR => {
            let stripped = strip_designation(bytes, KS_X_1001_DESIGNATION);
            encoding.decode_without_bom_handling(&stripped).0.into_owned()
        }
        Some(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    };
    text.trim_matches(|c| c == '\0' || c == ' ').to_string()
}

fn strip_designation(bytes: &[u8], designation: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut rest = bytes;
    while !rest.is_empty() {
        if rest.starts_with(designation) {
            rest = &rest[designation.len()..];
        } else {
            out.push(rest[0]);
            rest = &rest[1..];
        }
    }
    out
}
