//! Output sink for enumeration records.

use std::io::{self, Write};

use chrono::NaiveDateTime;

/// One child key. `last_written` is local time; `None` when the
/// UTC-to-local conversion failed for this entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildKey {
    pub name: String,
    pub last_written: Option<NaiveDateTime>,
}

/// Where enumeration records go. Injected so the walker can be tested
/// without a console.
pub trait RecordSink {
    fn child_key(&mut self, rec: &ChildKey) -> io::Result<()>;
    fn value_name(&mut self, name: &str) -> io::Result<()>;
}

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Tab-separated text output: `YYYY.MM.DD HH:MM:SS<TAB>Name` per child
/// key (timestamp column left empty when the conversion was omitted),
/// bare `Name` per value.
pub struct TabSeparated<W: Write> {
    out: W,
}

impl<W: Write> TabSeparated<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RecordSink for TabSeparated<W> {
    fn child_key(&mut self, rec: &ChildKey) -> io::Result<()> {
        match rec.last_written {
            Some(ts) => writeln!(self.out, "{}\t{}", ts.format(TIMESTAMP_FORMAT), rec.name),
            None => writeln!(self.out, "\t{}", rec.name),
        }
    }

    fn value_name(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn render(rec: &ChildKey) -> String {
        let mut sink = TabSeparated::new(Vec::new());
        sink.child_key(rec).unwrap();
        String::from_utf8(sink.out).unwrap()
    }

    #[test]
    fn child_key_line() {
        let rec = ChildKey {
            name: "CurrentVersion".into(),
            last_written: NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_opt(9, 5, 2),
        };
        assert_eq!(render(&rec), "2024.03.07 09:05:02\tCurrentVersion\n");
    }

    #[test]
    fn child_key_line_without_timestamp() {
        let rec = ChildKey {
            name: "Broken".into(),
            last_written: None,
        };
        assert_eq!(render(&rec), "\tBroken\n");
    }

    #[test]
    fn value_line() {
        let mut sink = TabSeparated::new(Vec::new());
        sink.value_name("ProgramFilesDir").unwrap();
        assert_eq!(String::from_utf8(sink.out).unwrap(), "ProgramFilesDir\n");
    }
}
