//! Field Name Mapper: internal record keys to print-facing field ids.
//!
//! Most print fields copy one internal value. A few are composites that
//! describe a person ("Ayesha d/o Khan, 24 years, Kurla"); those are driven
//! by [`COMPOSITES`] rather than per-field string checks.

use crate::error::{PrintError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// The record as entered on the form, keyed by database column.
pub type Record = BTreeMap<String, String>;

/// Ready-to-print strings keyed by print field id.
pub type PrintRecord = BTreeMap<String, String>;

/// Print field id -> internal key for fields copied by value.
pub const SCALAR_FIELDS: &[(&str, &str)] = &[
    ("SrNo", "serial_no"),
    ("RegNo", "reg_no"),
    ("MasjidName", "masjid_name"),
    ("HijriDate", "hijri_date"),
    ("EnglishDate", "eng_date"),
    ("Time", "nikah_time"),
    ("PlaceOfNikah", "place_of_nikah"),
    ("GroomAge", "groom_age"),
    ("GroomAddress", "groom_address"),
    ("BrideAge", "bride_age"),
    ("BrideAddress", "bride_address"),
    ("WaliFather", "wali_father"),
    ("WaliAge", "wali_age"),
    ("WaliAddress", "wali_address"),
    ("Witness1Age", "witness1_age"),
    ("Witness1Address", "witness1_address"),
    ("Witness2Age", "witness2_age"),
    ("Witness2Address", "witness2_address"),
    ("Mahr", "mahr_words"),
    ("mahr_in_figures", "mahr_figure"),
    ("mahr_in_words", "mahr_words"),
    ("QaziNameSeal", "qazi_name"),
    ("CertificateIssuePerson", "certificate_issue_person"),
];

/// A person named on the certificate. Internal keys are `<prefix>_name`,
/// `<prefix>_father`, `<prefix>_age` and `<prefix>_address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Groom,
    Bride,
    Wali,
    Witness1,
    Witness2,
}

impl Role {
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Groom => "groom",
            Role::Bride => "bride",
            Role::Wali => "wali",
            Role::Witness1 => "witness1",
            Role::Witness2 => "witness2",
        }
    }

    /// "daughter of" for the bride, "son of" for everyone else.
    pub fn relation(&self) -> &'static str {
        match self {
            Role::Bride => "d/o",
            _ => "s/o",
        }
    }

    fn key(&self, part: &str) -> String {
        format!("{}_{}", self.prefix(), part)
    }
}

/// Optional pieces appended after the person's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    /// Joined to the name with the role's relation marker.
    Father,
    /// Rendered as "N years".
    Age,
    Address,
}

#[derive(Debug, Clone, Copy)]
pub struct Composite {
    pub field: &'static str,
    pub role: Role,
    pub parts: &'static [Part],
}

const PERSON: &[Part] = &[Part::Father, Part::Age, Part::Address];
const NAME_ONLY: &[Part] = &[Part::Father];

pub const COMPOSITES: &[Composite] = &[
    Composite { field: "Bridegroom", role: Role::Groom, parts: PERSON },
    Composite { field: "Bride", role: Role::Bride, parts: PERSON },
    Composite { field: "Wali", role: Role::Wali, parts: PERSON },
    Composite { field: "Witness1", role: Role::Witness1, parts: PERSON },
    Composite { field: "Witness2", role: Role::Witness2, parts: PERSON },
    Composite { field: "bride_name_only", role: Role::Bride, parts: NAME_ONLY },
    Composite { field: "groom_name_only", role: Role::Groom, parts: NAME_ONLY },
];

fn value<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).map(|v| v.trim()).unwrap_or("")
}

impl Composite {
    /// Build the printable string, or `None` when the person has no name.
    pub fn build(&self, record: &Record) -> Option<String> {
        let name = value(record, &self.role.key("name"));
        if name.is_empty() {
            return None;
        }

        let mut head = name.to_string();
        let mut tail = Vec::new();
        for part in self.parts {
            match part {
                Part::Father => {
                    let father = value(record, &self.role.key("father"));
                    if !father.is_empty() {
                        head = format!("{} {} {}", head, self.role.relation(), father);
                    }
                }
                Part::Age => {
                    let age = value(record, &self.role.key("age"));
                    if !age.is_empty() {
                        tail.push(format!("{} years", age));
                    }
                }
                Part::Address => {
                    let address = value(record, &self.role.key("address"));
                    if !address.is_empty() {
                        tail.push(address.to_string());
                    }
                }
            }
        }

        let mut pieces = vec![head];
        pieces.extend(tail);
        Some(pieces.join(", "))
    }
}

/// Build the print record for one certificate. Empty values are left out.
pub fn map_form_to_print(record: &Record) -> PrintRecord {
    let mut print = PrintRecord::new();
    for (field, key) in SCALAR_FIELDS {
        let v = value(record, key);
        if !v.is_empty() {
            print.insert(field.to_string(), v.to_string());
        }
    }
    for composite in COMPOSITES {
        if let Some(text) = composite.build(record) {
            print.insert(composite.field.to_string(), text);
        }
    }
    print
}

/// Best-effort inverse of [`map_form_to_print`] for scalar fields.
///
/// Composite fields are skipped: a joined "name s/o father, age" string
/// cannot be split back reliably.
pub fn map_print_to_form(print: &PrintRecord) -> Record {
    let mut record = Record::new();
    for (field, key) in SCALAR_FIELDS {
        if let Some(v) = print.get(*field) {
            record.insert(key.to_string(), v.clone());
        }
    }
    record
}

/// Read a record from a JSON object. Numbers and booleans are stringified;
/// nulls become empty values.
pub fn load_record(path: &Path) -> Result<Record> {
    if !path.exists() {
        return Err(PrintError::NotFound(format!("record file {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    parse_record(&content).map_err(|e| PrintError::Malformed(format!("{}: {}", path.display(), e)))
}

pub fn parse_record(json: &str) -> std::result::Result<Record, String> {
    let value: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let Value::Object(map) = value else {
        return Err("record must be a JSON object".to_string());
    };
    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}
