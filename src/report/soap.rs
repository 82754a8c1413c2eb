//! SOAP envelopes for the reporting service and a typed reader for its replies.
//!
//! Replies are read with a streaming XML parser and matched on local element
//! names, so namespace prefixes, attribute order and whitespace do not matter.

use std::collections::HashMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::job::ReportStatus;
use super::request::{text_element, ReportRequest};
use crate::error::{ReportError, Result};

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const REPORTING_NS: &str = "https://bingads.microsoft.com/Reporting/v13";

pub const SUBMIT_ACTION: &str = "SubmitGenerateReport";
pub const POLL_ACTION: &str = "PollGenerateReport";

/// Credentials carried in every envelope header.
#[derive(Clone, Copy)]
pub struct SoapHeader<'a> {
    pub authentication_token: &'a str,
    pub developer_token: &'a str,
    pub customer_id: &'a str,
    pub customer_account_id: &'a str,
}

/// Envelope for `SubmitGenerateReport`.
pub fn submit_envelope(header: &SoapHeader<'_>, request: &ReportRequest) -> Result<String> {
    envelope(header, "SubmitGenerateReportRequest", |w| {
        request.write_xml(w, header.customer_account_id)
    })
}

/// Envelope for `PollGenerateReport`.
pub fn poll_envelope(header: &SoapHeader<'_>, request_id: &str) -> Result<String> {
    envelope(header, "PollGenerateReportRequest", |w| {
        text_element(w, "ReportRequestId", request_id)
    })
}

fn envelope<F>(header: &SoapHeader<'_>, operation: &str, body: F) -> Result<String>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> Result<()>,
{
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    w.write_event(Event::Start(
        BytesStart::new("s:Envelope").with_attributes([("xmlns:s", SOAP_ENV_NS)]),
    ))?;

    w.write_event(Event::Start(BytesStart::new("s:Header")))?;
    header_element(&mut w, "h:AuthenticationToken", header.authentication_token)?;
    header_element(&mut w, "h:CustomerAccountId", header.customer_account_id)?;
    header_element(&mut w, "h:CustomerId", header.customer_id)?;
    header_element(&mut w, "h:DeveloperToken", header.developer_token)?;
    w.write_event(Event::End(BytesEnd::new("s:Header")))?;

    w.write_event(Event::Start(BytesStart::new("s:Body")))?;
    w.write_event(Event::Start(
        BytesStart::new(operation).with_attributes([("xmlns", REPORTING_NS)]),
    ))?;
    body(&mut w)?;
    w.write_event(Event::End(BytesEnd::new(operation)))?;
    w.write_event(Event::End(BytesEnd::new("s:Body")))?;

    w.write_event(Event::End(BytesEnd::new("s:Envelope")))?;
    Ok(String::from_utf8_lossy(&w.into_inner()).into_owned())
}

fn header_element(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    w.write_event(Event::Start(
        BytesStart::new(name).with_attributes([("xmlns:h", REPORTING_NS)]),
    ))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Parsed SOAP reply: the first text value of every element, keyed by local
/// name, plus whether a `Fault` element was present.
#[derive(Debug, Clone, Default)]
pub struct SoapDocument {
    texts: HashMap<String, String>,
    fault: bool,
}

impl SoapDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut doc = Self::default();
        let mut open: Vec<(String, String)> = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    doc.fault |= name == "Fault";
                    open.push((name, String::new()));
                }
                Event::Empty(e) => {
                    doc.fault |= e.local_name().as_ref() == b"Fault";
                }
                Event::Text(t) => {
                    if let Some((_, text)) = open.last_mut() {
                        text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some((_, text)) = open.last_mut() {
                        text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::End(_) => {
                    if let Some((name, text)) = open.pop() {
                        if !text.is_empty() {
                            doc.texts.entry(name).or_insert(text);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(doc)
    }

    /// Text of the first element with this local name.
    pub fn text(&self, local_name: &str) -> Option<&str> {
        self.texts.get(local_name).map(String::as_str)
    }

    pub fn is_fault(&self) -> bool {
        self.fault
    }

    /// Most specific fault message available: an API error `Message` from
    /// the fault detail, else the generic `faultstring`.
    pub fn fault_message(&self) -> Option<String> {
        if !self.fault {
            return None;
        }
        let message = self.text("Message").or_else(|| self.text("faultstring"))?;
        Some(match self.text("Code") {
            Some(code) => format!("{message} (code {code})"),
            None => message.to_string(),
        })
    }
}

/// Reply to `SubmitGenerateReport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub request_id: String,
}

impl SubmitResponse {
    /// Extract the request id, failing with [`ReportError::Submit`] when it is absent.
    pub fn from_document(doc: &SoapDocument) -> Result<Self> {
        if let Some(request_id) = doc.text("ReportRequestId") {
            return Ok(Self {
                request_id: request_id.to_string(),
            });
        }
        Err(ReportError::Submit(doc.fault_message().unwrap_or_else(|| {
            "response did not contain a report request id".to_string()
        })))
    }
}

/// Reply to `PollGenerateReport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse {
    pub status: ReportStatus,
    pub download_url: Option<String>,
}

impl PollResponse {
    pub fn from_document(doc: &SoapDocument) -> Self {
        Self {
            status: doc
                .text("Status")
                .map(ReportStatus::from_wire)
                .unwrap_or(ReportStatus::Pending),
            download_url: doc.text("ReportDownloadUrl").map(str::to_string),
        }
    }
}
