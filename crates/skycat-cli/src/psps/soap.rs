//! SOAP client for the PSPS services
//!
//! Two endpoints: authentication (login -> session token) and job
//! management (execute/submit query, job status, extract job). The service
//! returns flat scalar values, so envelopes are built by string formatting
//! and the reply is scraped for the `<return>` element; no schema machinery.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use tracing::debug;

use skycat_common::types::JobStatus;

use crate::error::{CliError, Result};

/// Default timeout for SOAP calls and datastore downloads in seconds.
/// Can be overridden via SKYCAT_HTTP_TIMEOUT_SECS.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Timeout applied to every HTTP client in the PSPS backend, with the
/// SKYCAT_HTTP_TIMEOUT_SECS override honored.
pub(crate) fn http_timeout() -> Duration {
    let secs = std::env::var("SKYCAT_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// SOAP client for the PSPS auth and jobs services
#[derive(Debug, Clone)]
pub struct SoapClient {
    client: Client,
    auth_url: String,
    jobs_url: String,
}

impl SoapClient {
    /// Create a client for the given service endpoints
    pub fn new(auth_url: String, jobs_url: String) -> Result<Self> {
        let client = Client::builder().timeout(http_timeout()).build()?;

        Ok(Self {
            client,
            auth_url,
            jobs_url,
        })
    }

    /// `login(username, password) -> session token`.
    ///
    /// Takes the password by value so the caller's copy is gone once this
    /// returns; the envelope holding it is dropped before the response is
    /// parsed.
    pub async fn login(&self, username: &str, password: String) -> Result<String> {
        let body = soap_envelope(
            "login",
            &[("username", username), ("password", &password)],
        );
        drop(password);

        let reply = self.call(&self.auth_url, "login", body).await?;
        extract_return(&reply)
    }

    /// `executeQuickJob` runs the query synchronously and returns the result
    /// text directly.
    pub async fn execute_quick_job(
        &self,
        session_id: &str,
        schema_group: &str,
        query: &str,
        context: &str,
        task_name: &str,
    ) -> Result<String> {
        let body = soap_envelope(
            "executeQuickJob",
            &[
                ("sessionID", session_id),
                ("schemaGroup", schema_group),
                ("query", query),
                ("context", context),
                ("taskname", task_name),
                ("isSystem", "false"),
            ],
        );
        let reply = self.call(&self.jobs_url, "executeQuickJob", body).await?;
        extract_return(&reply)
    }

    /// `submitJob` queues the query as a tracked job and returns its id
    pub async fn submit_job(
        &self,
        session_id: &str,
        schema_group: &str,
        query: &str,
        context: &str,
        task_name: &str,
        time_estimate_secs: i32,
    ) -> Result<i64> {
        let estimate = time_estimate_secs.to_string();
        let body = soap_envelope(
            "submitJob",
            &[
                ("sessionID", session_id),
                ("schemaGroup", schema_group),
                ("query", query),
                ("context", context),
                ("taskname", task_name),
                ("TimeEstimate", &estimate),
            ],
        );
        let reply = self.call(&self.jobs_url, "submitJob", body).await?;
        parse_i64(&extract_return(&reply)?)
    }

    /// `getJobStatus` returns the raw status code for a tracked job
    pub async fn get_job_status(
        &self,
        session_id: &str,
        schema_group: &str,
        job_id: i64,
    ) -> Result<JobStatus> {
        let id = job_id.to_string();
        let body = soap_envelope(
            "getJobStatus",
            &[
                ("sessionID", session_id),
                ("schemaGroup", schema_group),
                ("jobID", &id),
            ],
        );
        let reply = self.call(&self.jobs_url, "getJobStatus", body).await?;
        let code = parse_i64(&extract_return(&reply)?)?;
        let code = i32::try_from(code)
            .map_err(|_| CliError::soap(format!("status code {} out of range", code)))?;
        Ok(JobStatus::from_code(code)?)
    }

    /// `submitExtractJob` queues the job that turns a MyDB table into a
    /// downloadable file of the given format (e.g. "FITS")
    pub async fn submit_extract_job(
        &self,
        session_id: &str,
        schema_group: &str,
        table_name: &str,
        format: &str,
    ) -> Result<i64> {
        let body = soap_envelope(
            "submitExtractJob",
            &[
                ("sessionID", session_id),
                ("schemaGroup", schema_group),
                ("tableName", table_name),
                ("format", format),
            ],
        );
        let reply = self.call(&self.jobs_url, "submitExtractJob", body).await?;
        parse_i64(&extract_return(&reply)?)
    }

    async fn call(&self, url: &str, action: &str, body: String) -> Result<String> {
        debug!(url, action, "SOAP call");
        let response = self
            .client
            .post(url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", action))
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}

/// Build a minimal SOAP 1.1 envelope for `operation` with string parameters
fn soap_envelope(operation: &str, params: &[(&str, &str)]) -> String {
    let mut args = String::new();
    for (name, value) in params {
        args.push_str(&format!("<{0}>{1}</{0}>", name, xml_escape(value)));
    }
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <{0}>{1}</{0}>
  </soap:Body>
</soap:Envelope>"#,
        operation, args
    )
}

/// Pull out the text of the `<return>` element, with or without a namespace
/// prefix, and undo XML escaping.
fn extract_return(body: &str) -> Result<String> {
    let re = Regex::new(r"(?s)<(?:\w+:)?return[^>]*>(.*?)</(?:\w+:)?return>")
        .map_err(|e| CliError::soap(format!("bad return pattern: {}", e)))?;

    // A Fault body means the service rejected the call outright
    if body.contains(":Fault>") || body.contains("<Fault>") {
        return Err(CliError::soap(format!("service returned a SOAP fault: {}", body)));
    }

    let captures = re
        .captures(body)
        .ok_or_else(|| CliError::soap(format!("no <return> element in reply: {}", body)))?;
    Ok(xml_unescape(&captures[1]))
}

fn parse_i64(text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| CliError::soap(format!("expected an integer reply, got '{}'", text)))
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn xml_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_contains_operation_and_params() {
        let body = soap_envelope("login", &[("username", "observer"), ("password", "p<w")]);
        assert!(body.contains("<login>"));
        assert!(body.contains("<username>observer</username>"));
        assert!(body.contains("<password>p&lt;w</password>"));
        assert!(body.contains("</login>"));
    }

    #[test]
    fn test_extract_return_plain() {
        let reply = "<soap:Envelope><soap:Body><loginResponse>\
                     <return>SESSION-123</return>\
                     </loginResponse></soap:Body></soap:Envelope>";
        assert_eq!(extract_return(reply).unwrap(), "SESSION-123");
    }

    #[test]
    fn test_extract_return_with_namespace_and_attrs() {
        let reply = r#"<ns1:return xsi:type="xsd:int">5</ns1:return>"#;
        assert_eq!(extract_return(reply).unwrap(), "5");
    }

    #[test]
    fn test_extract_return_unescapes() {
        let reply = "<return>a &lt; b &amp; c</return>";
        assert_eq!(extract_return(reply).unwrap(), "a < b & c");
    }

    #[test]
    fn test_fault_is_an_error() {
        let reply = "<soap:Envelope><soap:Body><soap:Fault>\
                     <faultstring>bad session</faultstring>\
                     </soap:Fault></soap:Body></soap:Envelope>";
        assert!(matches!(extract_return(reply), Err(CliError::Soap(_))));
    }

    #[test]
    fn test_missing_return_is_an_error() {
        assert!(extract_return("<empty/>").is_err());
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64(" 42 ").unwrap(), 42);
        assert!(parse_i64("forty-two").is_err());
    }

    #[test]
    fn test_http_timeout_env_override() {
        std::env::set_var("SKYCAT_HTTP_TIMEOUT_SECS", "7");
        assert_eq!(http_timeout(), Duration::from_secs(7));
        std::env::remove_var("SKYCAT_HTTP_TIMEOUT_SECS");
        assert_eq!(http_timeout(), Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }
}
