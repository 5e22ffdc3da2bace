//! Registry path parsing.
//!
//! Accepts strings of the form `[\\Machine\]{HKLM|HKCU|HKCR|HKU|HKCC}[\Subkey]`
//! and splits them into machine, root and subkey. The scan is a single
//! forward pass over the input; the grammar is simple enough that a hand
//! scanner is strictly more predictable than a pattern engine.

use std::fmt;

use thiserror::Error;

/// The five well-known top-level hives, identified by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKey {
    LocalMachine,
    CurrentUser,
    ClassesRoot,
    Users,
    CurrentConfig,
}

const ROOT_KEYWORDS: [(&str, RootKey); 5] = [
    ("HKLM", RootKey::LocalMachine),
    ("HKCU", RootKey::CurrentUser),
    ("HKCR", RootKey::ClassesRoot),
    ("HKU", RootKey::Users),
    ("HKCC", RootKey::CurrentConfig),
];

impl RootKey {
    /// The canonical (uppercase) keyword for this root.
    pub fn keyword(self) -> &'static str {
        match self {
            RootKey::LocalMachine => "HKLM",
            RootKey::CurrentUser => "HKCU",
            RootKey::ClassesRoot => "HKCR",
            RootKey::Users => "HKU",
            RootKey::CurrentConfig => "HKCC",
        }
    }

    /// Ordinal, case-insensitive keyword lookup. All keywords are ASCII,
    /// so per-character ASCII case folding is exactly the ordinal
    /// comparison we want; a token containing non-ASCII matches nothing.
    pub fn from_keyword(token: &str) -> Option<RootKey> {
        ROOT_KEYWORDS
            .iter()
            .find(|(kw, _)| kw.eq_ignore_ascii_case(token))
            .map(|(_, root)| *root)
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A fully parsed registry path. `machine` and `subkey` are independently
/// optional; `root` is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Remote computer name, without any backslashes. Absent = local.
    pub machine: Option<String>,
    pub root: RootKey,
    /// Path under the root, passed verbatim to the open call. A trailing
    /// backslash in the input yields `Some("")`, which is distinct from
    /// `None` and preserved deliberately.
    pub subkey: Option<String>,
}

impl fmt::Display for ParsedPath {
    /// Canonical string form; `parse` of the rendering yields back an
    /// equal `ParsedPath`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(machine) = &self.machine {
            write!(f, "\\\\{}\\", machine)?;
        }
        write!(f, "{}", self.root.keyword())?;
        if let Some(subkey) = &self.subkey {
            write!(f, "\\{}", subkey)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("input too short to name a root key")]
    TooShort,
    #[error("empty or unterminated machine name")]
    InvalidMachine,
    #[error("unknown root key {0:?} (expected HKLM, HKCU, HKCR, HKU or HKCC)")]
    UnknownRoot(String),
}

/// Parse a full registry path.
///
/// The shortest valid input is a bare `HKU`, hence the length-3 floor.
/// Backslash is ASCII, so scanning on byte indices is UTF-8 safe.
pub fn parse(input: &str) -> Result<ParsedPath, ParseError> {
    if input.len() < 3 {
        return Err(ParseError::TooShort);
    }

    let bytes = input.as_bytes();
    let mut machine = None;
    let mut cursor = 0;

    if bytes[0] == b'\\' && bytes[1] == b'\\' {
        match input[2..].find('\\') {
            None | Some(0) => return Err(ParseError::InvalidMachine),
            Some(rel) => {
                machine = Some(input[2..2 + rel].to_owned());
                cursor = 2 + rel + 1;
            }
        }
    }

    let (token, subkey) = match input[cursor..].find('\\') {
        Some(rel) => {
            let sep = cursor + rel;
            (&input[cursor..sep], Some(input[sep + 1..].to_owned()))
        }
        None => (&input[cursor..], None),
    };

    let root = RootKey::from_keyword(token)
        .ok_or_else(|| ParseError::UnknownRoot(token.to_owned()))?;

    Ok(ParsedPath {
        machine,
        root,
        subkey,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_keywords_any_casing() {
        for (canonical, expected) in ROOT_KEYWORDS {
            let lower = canonical.to_ascii_lowercase();
            let mixed: String = canonical
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    if i % 2 == 0 {
                        c.to_ascii_lowercase()
                    } else {
                        c
                    }
                })
                .collect();
            for form in [canonical.to_owned(), lower, mixed] {
                assert_eq!(parse(&form).unwrap().root, expected, "form {form:?}");
            }
        }
    }

    #[test]
    fn machine_root_subkey() {
        let parsed = parse(r"\\Srv\HKLM\Software\X").unwrap();
        assert_eq!(parsed.machine.as_deref(), Some("Srv"));
        assert_eq!(parsed.root, RootKey::LocalMachine);
        assert_eq!(parsed.subkey.as_deref(), Some(r"Software\X"));
    }

    #[test]
    fn bare_root() {
        let parsed = parse("HKCU").unwrap();
        assert_eq!(parsed.machine, None);
        assert_eq!(parsed.root, RootKey::CurrentUser);
        assert_eq!(parsed.subkey, None);
    }

    #[test]
    fn trailing_backslash_keeps_empty_subkey() {
        // Distinct from the no-subkey case; passed through verbatim.
        let parsed = parse("HKCU\\").unwrap();
        assert_eq!(parsed.subkey.as_deref(), Some(""));
    }

    #[test]
    fn empty_machine_segment() {
        assert_eq!(parse(r"\\\HKLM"), Err(ParseError::InvalidMachine));
    }

    #[test]
    fn unterminated_machine_segment() {
        assert_eq!(parse(r"\\Srv"), Err(ParseError::InvalidMachine));
    }

    #[test]
    fn unknown_root() {
        assert!(matches!(
            parse("NOTAKEY"),
            Err(ParseError::UnknownRoot(token)) if token == "NOTAKEY"
        ));
    }

    #[test]
    fn machine_with_unknown_root() {
        assert!(matches!(
            parse(r"\\Srv\SOFTWARE"),
            Err(ParseError::UnknownRoot(_))
        ));
    }

    #[test]
    fn machine_with_nothing_after_it() {
        // "\\m\" consumes the machine and leaves an empty root token.
        assert!(matches!(parse("\\\\m\\"), Err(ParseError::UnknownRoot(_))));
    }

    #[test]
    fn too_short() {
        assert_eq!(parse(""), Err(ParseError::TooShort));
        assert_eq!(parse("H"), Err(ParseError::TooShort));
        assert_eq!(parse("HK"), Err(ParseError::TooShort));
    }

    #[test]
    fn shortest_valid_input() {
        assert_eq!(parse("HKU").unwrap().root, RootKey::Users);
    }

    #[test]
    fn display_round_trip() {
        let cases = [
            ParsedPath {
                machine: None,
                root: RootKey::CurrentUser,
                subkey: None,
            },
            ParsedPath {
                machine: None,
                root: RootKey::CurrentUser,
                subkey: Some(String::new()),
            },
            ParsedPath {
                machine: Some("Srv".into()),
                root: RootKey::LocalMachine,
                subkey: Some(r"Software\Microsoft".into()),
            },
            ParsedPath {
                machine: Some("box01".into()),
                root: RootKey::CurrentConfig,
                subkey: None,
            },
        ];
        for original in cases {
            let rendered = original.to_string();
            assert_eq!(parse(&rendered).unwrap(), original, "rendered {rendered:?}");
        }
    }
}
