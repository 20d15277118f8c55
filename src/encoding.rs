use std::borrow::Cow;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
    Latin1,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Latin1 => "iso-8859-1",
        }
    }

    /// Decodes the buffer under this encoding, or `None` on a decoding fault.
    /// Only UTF-8 can fault; the two 8-bit encodings map every byte, so the
    /// candidate loop always terminates with a decoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let stripped = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
                encoding_rs::UTF_8
                    .decode_without_bom_handling_and_without_replacement(stripped)
                    .map(Cow::into_owned)
            }
            TextEncoding::Windows1252 => {
                let (text, _had_errors) =
                    encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
                Some(text.into_owned())
            }
            TextEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes).into_owned()),
        }
    }
}

/// Orders candidate encodings for a raw report buffer, most likely first.
/// The best guess is followed by the three standard fallbacks so the list
/// always covers utf-8, windows-1252 and iso-8859-1 regardless of the guess.
pub fn candidate_encodings(bytes: &[u8]) -> Vec<TextEncoding> {
    let guess = if bytes.starts_with(&UTF8_BOM) || std::str::from_utf8(bytes).is_ok() {
        TextEncoding::Utf8
    } else {
        TextEncoding::Windows1252
    };

    let mut candidates = vec![guess];
    for fallback in [
        TextEncoding::Utf8,
        TextEncoding::Windows1252,
        TextEncoding::Latin1,
    ] {
        if !candidates.contains(&fallback) {
            candidates.push(fallback);
        }
    }
    candidates
}
