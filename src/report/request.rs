//! Report request documents.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ReportError, Result};

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const ARRAYS_NS: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";

/// Which report to generate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportKind {
    /// Account performance, one row per day.
    Account,
    /// Campaign performance, one row per campaign over the whole range.
    Campaign,
}

/// Time granularity of report rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Aggregation {
    Daily,
    Summary,
}

impl ReportKind {
    pub fn aggregation(self) -> Aggregation {
        match self {
            Self::Account => Aggregation::Daily,
            Self::Campaign => Aggregation::Summary,
        }
    }

    /// Columns later stages rely on; always included.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Account => &["TimePeriod"],
            Self::Campaign => &["CampaignName"],
        }
    }

    fn request_type(self) -> &'static str {
        match self {
            Self::Account => "AccountPerformanceReportRequest",
            Self::Campaign => "CampaignPerformanceReportRequest",
        }
    }

    fn column_element(self) -> &'static str {
        match self {
            Self::Account => "AccountPerformanceReportColumn",
            Self::Campaign => "CampaignPerformanceReportColumn",
        }
    }

    fn report_name(self) -> &'static str {
        match self {
            Self::Account => "AccountPerformance",
            Self::Campaign => "CampaignPerformance",
        }
    }
}

/// Calendar date decomposed into the day/month/year triple the API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ReportDate {
    /// Parse an ISO `YYYY-MM-DD` date.
    pub fn parse(value: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
            ReportError::InvalidArgument(format!("date '{value}' is not YYYY-MM-DD: {e}"))
        })?;
        Ok(Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        })
    }
}

impl fmt::Display for ReportDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// An immutable report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    kind: ReportKind,
    start: ReportDate,
    end: ReportDate,
    columns: Vec<String>,
}

impl ReportRequest {
    /// Build a request. Dates must be `YYYY-MM-DD`.
    ///
    /// The kind's required columns are prepended when absent and duplicate
    /// columns are dropped, keeping the first occurrence.
    pub fn new<S: AsRef<str>>(
        kind: ReportKind,
        start: &str,
        end: &str,
        columns: &[S],
    ) -> Result<Self> {
        let start = ReportDate::parse(start)?;
        let end = ReportDate::parse(end)?;
        if end < start {
            return Err(ReportError::InvalidArgument(format!(
                "end date {end} is before start date {start}"
            )));
        }

        let mut merged: Vec<String> = Vec::with_capacity(columns.len() + 1);
        let candidates = kind
            .required_columns()
            .iter()
            .copied()
            .filter(|required| !columns.iter().any(|c| c.as_ref().trim() == *required))
            .chain(columns.iter().map(|c| c.as_ref().trim()));
        for column in candidates {
            if !column.is_empty() && !merged.iter().any(|c| c == column) {
                merged.push(column.to_string());
            }
        }

        Ok(Self {
            kind,
            start,
            end,
            columns: merged,
        })
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn start(&self) -> ReportDate {
        self.start
    }

    pub fn end(&self) -> ReportDate {
        self.end
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Render the `<ReportRequest>` document scoped to `account_id`.
    pub fn to_xml(&self, account_id: &str) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        self.write_xml(&mut writer, account_id)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    pub(crate) fn write_xml(&self, w: &mut Writer<Vec<u8>>, account_id: &str) -> Result<()> {
        let kind = self.kind;
        w.write_event(Event::Start(BytesStart::new("ReportRequest").with_attributes([
            ("xmlns:i", XSI_NS),
            ("i:type", kind.request_type()),
        ])))?;

        text_element(w, "ExcludeColumnHeaders", "false")?;
        text_element(w, "ExcludeReportFooter", "true")?;
        text_element(w, "ExcludeReportHeader", "true")?;
        text_element(w, "Format", "Csv")?;
        text_element(w, "ReportName", kind.report_name())?;
        text_element(w, "ReturnOnlyCompleteData", "false")?;
        text_element(w, "Aggregation", &kind.aggregation().to_string())?;

        w.write_event(Event::Start(BytesStart::new("Columns")))?;
        for column in &self.columns {
            text_element(w, kind.column_element(), column)?;
        }
        w.write_event(Event::End(BytesEnd::new("Columns")))?;

        w.write_event(Event::Start(BytesStart::new("Scope")))?;
        w.write_event(Event::Start(
            BytesStart::new("AccountIds").with_attributes([("xmlns:a", ARRAYS_NS)]),
        ))?;
        text_element(w, "a:long", account_id)?;
        w.write_event(Event::End(BytesEnd::new("AccountIds")))?;
        w.write_event(Event::End(BytesEnd::new("Scope")))?;

        w.write_event(Event::Start(BytesStart::new("Time")))?;
        date_element(w, "CustomDateRangeEnd", self.end)?;
        date_element(w, "CustomDateRangeStart", self.start)?;
        w.write_event(Event::End(BytesEnd::new("Time")))?;

        w.write_event(Event::End(BytesEnd::new("ReportRequest")))?;
        Ok(())
    }
}

pub(crate) fn text_element(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn date_element(w: &mut Writer<Vec<u8>>, name: &str, date: ReportDate) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    text_element(w, "Day", &date.day.to_string())?;
    text_element(w, "Month", &date.month.to_string())?;
    text_element(w, "Year", &date.year.to_string())?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_iso_dates_into_components() {
        let date = ReportDate::parse("2024-03-07").unwrap();
        assert_eq!(
            date,
            ReportDate {
                year: 2024,
                month: 3,
                day: 7
            }
        );
        assert_eq!(date.to_string(), "2024-03-07");
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["2024-13-01", "03/07/2024", "", "2024-02-30"] {
            assert!(
                matches!(ReportDate::parse(bad), Err(ReportError::InvalidArgument(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_inverted_range() {
        let err = ReportRequest::new(ReportKind::Account, "2024-03-08", "2024-03-01", &["Spend"])
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidArgument(_)));
    }

    #[test]
    fn prepends_required_column_and_dedupes() {
        let request = ReportRequest::new(
            ReportKind::Campaign,
            "2024-01-01",
            "2024-01-31",
            &["Spend", "Clicks", "Spend", " "],
        )
        .unwrap();
        assert_eq!(request.columns(), ["CampaignName", "Spend", "Clicks"]);
    }

    #[test]
    fn keeps_caller_position_of_required_column() {
        let request = ReportRequest::new(
            ReportKind::Account,
            "2024-01-01",
            "2024-01-31",
            &["Spend", "TimePeriod"],
        )
        .unwrap();
        assert_eq!(request.columns(), ["Spend", "TimePeriod"]);
    }

    #[test]
    fn aggregation_follows_kind() {
        assert_eq!(ReportKind::Account.aggregation(), Aggregation::Daily);
        assert_eq!(ReportKind::Campaign.aggregation(), Aggregation::Summary);

        let account = ReportRequest::new(ReportKind::Account, "2024-01-01", "2024-01-02", &["Spend"])
            .unwrap()
            .to_xml("42")
            .unwrap();
        assert!(account.contains("<Aggregation>Daily</Aggregation>"));
        assert!(account.contains("i:type=\"AccountPerformanceReportRequest\""));

        let campaign =
            ReportRequest::new(ReportKind::Campaign, "2024-01-01", "2024-01-02", &["Spend"])
                .unwrap()
                .to_xml("42")
                .unwrap();
        assert!(campaign.contains("<Aggregation>Summary</Aggregation>"));
        assert!(campaign.contains("<CampaignPerformanceReportColumn>CampaignName</CampaignPerformanceReportColumn>"));
    }

    #[test]
    fn document_is_deterministic() {
        let build = || {
            ReportRequest::new(
                ReportKind::Account,
                "2024-02-01",
                "2024-02-29",
                &["Spend", "Clicks"],
            )
            .unwrap()
            .to_xml("12345")
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn document_carries_fixed_fields_scope_and_dates() {
        let xml = ReportRequest::new(ReportKind::Account, "2024-02-01", "2024-02-29", &["Spend"])
            .unwrap()
            .to_xml("12345")
            .unwrap();
        assert!(xml.contains("<Format>Csv</Format>"));
        assert!(xml.contains("<ExcludeReportHeader>true</ExcludeReportHeader>"));
        assert!(xml.contains("<ExcludeReportFooter>true</ExcludeReportFooter>"));
        assert!(xml.contains("<ExcludeColumnHeaders>false</ExcludeColumnHeaders>"));
        assert!(xml.contains("<a:long>12345</a:long>"));

        let end = xml.find("<CustomDateRangeEnd>").unwrap();
        let start = xml.find("<CustomDateRangeStart>").unwrap();
        assert!(end < start);
        assert!(xml[end..start].contains("<Day>29</Day>"));
        assert!(xml[start..].contains("<Day>1</Day>"));
        assert!(xml[start..].contains("<Month>2</Month>"));
        assert!(xml[start..].contains("<Year>2024</Year>"));
    }

    #[test]
    fn column_names_are_escaped() {
        let xml = ReportRequest::new(ReportKind::Account, "2024-02-01", "2024-02-02", &["A<B"])
            .unwrap()
            .to_xml("1")
            .unwrap();
        assert!(xml.contains("A&lt;B"));
    }

    #[test]
    fn kind_round_trips_through_strings() {
        assert_eq!("campaign".parse::<ReportKind>().unwrap(), ReportKind::Campaign);
        assert_eq!(ReportKind::Account.to_string(), "account");
    }
}
