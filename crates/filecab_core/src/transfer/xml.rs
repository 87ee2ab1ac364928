//! XML format.
//!
//! ```xml
//! <records>
//!   <record id="1">
//!     <name first="Petro" last="Semenov"/>
//!     <dateOfBirth>01/01/1990</dateOfBirth>
//!     <workingHoursPerWeek>21</workingHoursPerWeek>
//!     <annualIncome>1100.30</annualIncome>
//!     <driverLicenseCategory>A</driverLicenseCategory>
//!   </record>
//! </records>
//! ```

use super::{format_date, RawRecord};
use crate::error::{StoreError, StoreResult};
use crate::record::{ParametersContainer, Record};
use crate::snapshot::{ImportReport, Snapshot};
use crate::validation::Validator;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};

const RECORDS: &str = "records";
const RECORD: &str = "record";
const NAME: &str = "name";
const DATE_OF_BIRTH: &str = "dateOfBirth";
const WORKING_HOURS: &str = "workingHoursPerWeek";
const ANNUAL_INCOME: &str = "annualIncome";
const CATEGORY: &str = "driverLicenseCategory";

impl Snapshot {
    /// Writes a `<records>` document with one `<record>` per record.
    ///
    /// # Errors
    ///
    /// Returns an `Xml` error if writing fails.
    pub fn write_xml<W: Write>(&self, writer: W) -> StoreResult<()> {
        let mut out = Writer::new_with_indent(writer, b' ', 2);

        write(&mut out, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        write(&mut out, Event::Start(BytesStart::new(RECORDS)))?;
        for record in self {
            write_record(&mut out, record)?;
        }
        write(&mut out, Event::End(BytesEnd::new(RECORDS)))?;
        out.into_inner().flush()?;
        Ok(())
    }

    /// Reads a `<records>` document, keeping records `validator` accepts.
    ///
    /// # Errors
    ///
    /// Returns an `Xml` error if the document is not well formed.
    pub fn load_xml<R: BufRead>(reader: R, validator: &Validator) -> StoreResult<(Self, ImportReport)> {
        let rows = read_rows(reader)?;
        Ok(Self::from_parameters(rows, validator))
    }
}

fn write<W: Write>(out: &mut Writer<W>, event: Event<'_>) -> StoreResult<()> {
    out.write_event(event).map_err(StoreError::xml)
}

fn write_text<W: Write>(out: &mut Writer<W>, element: &str, text: &str) -> StoreResult<()> {
    write(out, Event::Start(BytesStart::new(element)))?;
    write(out, Event::Text(BytesText::new(text)))?;
    write(out, Event::End(BytesEnd::new(element)))
}

fn write_record<W: Write>(out: &mut Writer<W>, record: &Record) -> StoreResult<()> {
    let id = record.id().to_string();
    let mut start = BytesStart::new(RECORD);
    start.push_attribute(("id", id.as_str()));
    write(out, Event::Start(start))?;

    let mut name = BytesStart::new(NAME);
    name.push_attribute(("first", record.first_name()));
    name.push_attribute(("last", record.last_name()));
    write(out, Event::Empty(name))?;

    write_text(out, DATE_OF_BIRTH, &format_date(record.date_of_birth()))?;
    write_text(out, WORKING_HOURS, &record.working_hours_per_week().to_string())?;
    write_text(out, ANNUAL_INCOME, &record.annual_income().to_string())?;
    write_text(out, CATEGORY, &record.driver_license_category().to_string())?;

    write(out, Event::End(BytesEnd::new(RECORD)))
}

/// The text element a `Text` event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    DateOfBirth,
    WorkingHours,
    AnnualIncome,
    Category,
}

impl TextField {
    fn from_element(name: &[u8]) -> Option<Self> {
        match name {
            b"dateOfBirth" => Some(Self::DateOfBirth),
            b"workingHoursPerWeek" => Some(Self::WorkingHours),
            b"annualIncome" => Some(Self::AnnualIncome),
            b"driverLicenseCategory" => Some(Self::Category),
            _ => None,
        }
    }

    fn assign(self, raw: &mut RawRecord, text: String) {
        let slot = match self {
            Self::DateOfBirth => &mut raw.date_of_birth,
            Self::WorkingHours => &mut raw.working_hours,
            Self::AnnualIncome => &mut raw.annual_income,
            Self::Category => &mut raw.driver_license_category,
        };
        *slot = Some(text);
    }
}

fn read_rows<R: BufRead>(reader: R) -> StoreResult<Rows> {
    let mut input = Reader::from_reader(reader);
    input.config_mut().trim_text(true);

    let mut rows = Vec::new();
    let mut current: Option<RawRecord> = None;
    let mut field: Option<TextField> = None;
    let mut buf = Vec::new();

    loop {
        match input.read_event_into(&mut buf).map_err(StoreError::xml)? {
            Event::Start(element) => {
                open_element(&element, false, &mut current, &mut field, &mut rows)?;
            }
            Event::Empty(element) => {
                open_element(&element, true, &mut current, &mut field, &mut rows)?;
            }
            Event::Text(text) => {
                if let (Some(target), Some(raw)) = (field, current.as_mut()) {
                    let text = text.unescape().map_err(StoreError::xml)?;
                    target.assign(raw, text.into_owned());
                }
            }
            Event::End(element) => {
                if element.name().as_ref() == RECORD.as_bytes() {
                    if let Some(raw) = current.take() {
                        rows.push(raw.into_parameters());
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

type Rows = Vec<StoreResult<ParametersContainer>>;

fn open_element(
    element: &BytesStart<'_>,
    empty: bool,
    current: &mut Option<RawRecord>,
    field: &mut Option<TextField>,
    rows: &mut Rows,
) -> StoreResult<()> {
    match element.name().as_ref() {
        b"record" => {
            if let Some(open) = current.take() {
                rows.push(open.into_parameters());
            }
            let raw = RawRecord {
                id: attribute(element, b"id")?,
                ..RawRecord::default()
            };
            // A self-closing record never sees its end tag.
            if empty {
                rows.push(raw.into_parameters());
            } else {
                *current = Some(raw);
            }
        }
        b"name" => {
            if let Some(raw) = current.as_mut() {
                raw.first_name = attribute(element, b"first")?;
                raw.last_name = attribute(element, b"last")?;
            }
        }
        _ if empty => *field = None,
        other => *field = TextField::from_element(other),
    }
    Ok(())
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> StoreResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(StoreError::xml)?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(StoreError::xml)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RuleSet;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![Record::from_parameters(
            1,
            &ParametersContainer::new(
                "Petro",
                "Sem<en>ov",
                NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                21,
                Decimal::new(110030, 2),
                'A',
            ),
        )])
    }

    #[test]
    fn write_xml_layout() {
        let mut out = Vec::new();
        snapshot().write_xml(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains("<record id=\"1\">"));
        assert!(text.contains("<name first=\"Petro\" last=\"Sem&lt;en&gt;ov\"/>"));
        assert!(text.contains("<dateOfBirth>01/01/1990</dateOfBirth>"));
        assert!(text.contains("<workingHoursPerWeek>21</workingHoursPerWeek>"));
        assert!(text.contains("<annualIncome>1100.30</annualIncome>"));
        assert!(text.contains("<driverLicenseCategory>A</driverLicenseCategory>"));
        assert!(text.trim_end().ends_with("</records>"));
    }

    #[test]
    fn xml_round_trip_keeps_fields() {
        let original = snapshot();
        let mut out = Vec::new();
        original.write_xml(&mut out).unwrap();

        let (loaded, report) =
            Snapshot::load_xml(out.as_slice(), &Validator::for_set(RuleSet::Default)).unwrap();

        assert_eq!(report, ImportReport { imported: 1, skipped: 0 });
        assert_eq!(loaded.records(), original.records());
    }

    #[test]
    fn load_xml_skips_incomplete_records() {
        let text = r#"<records>
  <record id="1">
    <name first="Petro" last="Semenov"/>
    <dateOfBirth>01/01/1990</dateOfBirth>
    <workingHoursPerWeek>21</workingHoursPerWeek>
    <annualIncome>1100.30</annualIncome>
    <driverLicenseCategory>A</driverLicenseCategory>
  </record>
  <record id="2">
    <name first="Ivanko" last="Frankov"/>
    <workingHoursPerWeek>21</workingHoursPerWeek>
  </record>
  <record>
    <name first="Marko" last="Vovchok"/>
    <dateOfBirth>12/22/1983</dateOfBirth>
    <workingHoursPerWeek>22</workingHoursPerWeek>
    <annualIncome>700</annualIncome>
    <driverLicenseCategory>B</driverLicenseCategory>
  </record>
</records>"#;

        let (loaded, report) =
            Snapshot::load_xml(text.as_bytes(), &Validator::for_set(RuleSet::Custom)).unwrap();

        assert_eq!(report, ImportReport { imported: 1, skipped: 2 });
        assert_eq!(loaded.records()[0].last_name(), "Semenov");
    }

    #[test]
    fn self_closing_record_is_counted_as_skipped() {
        let text = r#"<records>
  <record id="1"/>
  <record id="2">
    <name first="Petro" last="Semenov"/>
    <dateOfBirth>01/01/1990</dateOfBirth>
    <workingHoursPerWeek>21</workingHoursPerWeek>
    <annualIncome>1100.30</annualIncome>
    <driverLicenseCategory/>
    <driverLicenseCategory>A</driverLicenseCategory>
  </record>
</records>"#;

        let (loaded, report) =
            Snapshot::load_xml(text.as_bytes(), &Validator::for_set(RuleSet::Custom)).unwrap();

        assert_eq!(report, ImportReport { imported: 1, skipped: 1 });
        assert_eq!(loaded.records()[0].id(), 2);
    }

    #[test]
    fn load_xml_rejects_malformed_document() {
        let text = "<records><record id=\"1\"></records>";
        assert!(matches!(
            Snapshot::load_xml(text.as_bytes(), &Validator::default()),
            Err(StoreError::Xml { .. })
        ));
    }
}
