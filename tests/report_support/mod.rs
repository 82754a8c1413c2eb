#![allow(dead_code)]

use std::io::{Cursor, Write};

use adreport::config::{Credentials, Endpoints, PollSettings, ReportingConfig};
use adreport::report::ReportFetcher;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TOKEN_PATH: &str = "/common/oauth2/v2.0/token";
pub const REPORTING_PATH: &str = "/Reporting/v13/ReportingService.svc";

pub fn credentials() -> Credentials {
    Credentials::builder()
        .client_id("client-id")
        .client_secret("client-secret")
        .refresh_token("refresh-token")
        .developer_token("developer-token")
        .customer_id("1111")
        .account_id("2222")
        .build()
}

pub fn config(server: &MockServer) -> ReportingConfig {
    ReportingConfig {
        credentials: credentials(),
        endpoints: Endpoints {
            token_url: format!("{}{TOKEN_PATH}", server.uri()),
            reporting_url: format!("{}{REPORTING_PATH}", server.uri()),
            ..Endpoints::default()
        },
        poll: PollSettings {
            interval_ms: 5,
            max_attempts: 30,
        },
    }
}

pub fn fetcher(server: &MockServer) -> ReportFetcher {
    ReportFetcher::new(config(server))
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "access-token-1",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

pub fn soap_ok(body: &str) -> ResponseTemplate {
    let xml = format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Header><h:TrackingId xmlns:h="https://bingads.microsoft.com/Reporting/v13">t-1</h:TrackingId></s:Header><s:Body>{body}</s:Body></s:Envelope>"#
    );
    ResponseTemplate::new(200).set_body_raw(xml, "text/xml; charset=utf-8")
}

pub fn submit_response(request_id: &str) -> ResponseTemplate {
    soap_ok(&format!(
        r#"<SubmitGenerateReportResponse xmlns="https://bingads.microsoft.com/Reporting/v13"><ReportRequestId>{request_id}</ReportRequestId></SubmitGenerateReportResponse>"#
    ))
}

/// Poll reply; `url` must already be XML-escaped.
pub fn poll_response(status: &str, url: Option<&str>) -> ResponseTemplate {
    let url = match url {
        Some(url) => format!("<ReportDownloadUrl>{url}</ReportDownloadUrl>"),
        None => r#"<ReportDownloadUrl i:nil="true"/>"#.to_string(),
    };
    soap_ok(&format!(
        r#"<PollGenerateReportResponse xmlns="https://bingads.microsoft.com/Reporting/v13"><ReportRequestStatus xmlns:i="http://www.w3.org/2001/XMLSchema-instance">{url}<Status>{status}</Status></ReportRequestStatus></PollGenerateReportResponse>"#
    ))
}

pub fn fault_response(code: &str, message: &str) -> ResponseTemplate {
    let xml = format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Server</faultcode><faultstring>Invalid client data. Check the SOAP fault details for more information.</faultstring><detail><AdApiFaultDetail xmlns="https://adapi.microsoft.com"><Errors><AdApiError><Code>{code}</Code><Message>{message}</Message></AdApiError></Errors></AdApiFaultDetail></detail></s:Fault></s:Body></s:Envelope>"#
    );
    ResponseTemplate::new(500).set_body_raw(xml, "text/xml; charset=utf-8")
}

pub fn soap_action(action: &'static str) -> wiremock::matchers::HeaderExactMatcher {
    header("SOAPAction", action)
}

pub async fn count_action(server: &MockServer, action: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| is_action(r, action))
        .count()
}

fn is_action(request: &Request, action: &str) -> bool {
    request
        .headers
        .get("SOAPAction")
        .and_then(|v| v.to_str().ok())
        == Some(action)
}

pub fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .expect("start zip entry");
        writer.write_all(body.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

pub const ACCOUNT_CSV: &str = "\u{feff}\"TimePeriod\",\"Spend\",\"Impressions\",\"Clicks\",\"Ctr\",\"AverageCpc\",\"Conversions\",\"Revenue\"\r\n\
\"2024-01-01\",\"10.50\",\"1,000\",\"20\",\"2.00%\",\"0.53\",\"2\",\"40.00\"\r\n\
\"2024-01-02\",\"4.50\",\"500\",\"5\",\"1.00%\",\"0.90\",\"1\",\"15.00\"\r\n";
