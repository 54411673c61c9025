//! Minimal SOAP client for UPnP control endpoints.
//!
//! Zone speakers expose one HTTP control URL per service; every action is
//! a POST with a SOAPACTION header and a small XML envelope. Responses
//! are flat argument lists, which is all this client understands. Faults
//! carry a numeric UPnP error code that is surfaced in the error message.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

/// A UPnP control endpoint: where to POST and which service type to name.
#[derive(Clone, Copy, Debug)]
pub struct Service {
    pub control_path: &'static str,
    pub service_type: &'static str,
}

pub const AV_TRANSPORT: Service = Service {
    control_path: "/MediaRenderer/AVTransport/Control",
    service_type: "urn:schemas-upnp-org:service:AVTransport:1",
};

pub const RENDERING_CONTROL: Service = Service {
    control_path: "/MediaRenderer/RenderingControl/Control",
    service_type: "urn:schemas-upnp-org:service:RenderingControl:1",
};

pub const CONTENT_DIRECTORY: Service = Service {
    control_path: "/MediaServer/ContentDirectory/Control",
    service_type: "urn:schemas-upnp-org:service:ContentDirectory:1",
};

pub const DEVICE_PROPERTIES: Service = Service {
    control_path: "/DeviceProperties/Control",
    service_type: "urn:schemas-upnp-org:service:DeviceProperties:1",
};

#[derive(Debug)]
pub struct SoapClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl SoapClient {
    pub fn new(host: &str, port: u16, timeout_secs: u64) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            base_url: format!("http://{host}:{port}"),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invokes one UPnP action and returns the response arguments.
    pub fn call(
        &self,
        service: Service,
        action: &str,
        args: &[(&str, &str)],
    ) -> Result<SoapResponse> {
        let url = format!("{}{}", self.base_url, service.control_path);
        debug!(action, url = %url, "soap call");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/xml; charset=\"utf-8\"")
            .header(
                "SOAPACTION",
                format!("\"{}#{}\"", service.service_type, action),
            )
            .body(build_envelope(service.service_type, action, args))
            .send()
            .with_context(|| format!("Failed to reach device for {action}"))?;

        let status = response.status();
        let text = response.text().context("Failed to read device response")?;
        if !status.is_success() {
            if let Some(code) = parse_fault_code(&text) {
                bail!("Device refused {action}: UPnP error {code}");
            }
            bail!("Device returned status {status} for {action}");
        }
        parse_response(&text, action)
    }
}

/// Flat argument list of one action response.
#[derive(Debug)]
pub struct SoapResponse {
    fields: HashMap<String, String>,
}

impl SoapResponse {
    pub fn field(&self, name: &str) -> Result<&str> {
        match self.fields.get(name) {
            Some(value) => Ok(value),
            None => bail!("Device response is missing the {name} field"),
        }
    }

    pub fn field_or_empty(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn uint_field(&self, name: &str) -> Result<usize> {
        self.field(name)?
            .parse()
            .with_context(|| format!("Device field {name} is not a number"))
    }
}

fn build_envelope(service_type: &str, action: &str, args: &[(&str, &str)]) -> String {
    let mut arguments = String::new();
    for (name, value) in args {
        arguments.push_str(&format!("<{name}>{}</{name}>", escape(*value)));
    }
    format!(
        "<?xml version=\"1.0\"?>\
         <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">\
         <s:Body><u:{action} xmlns:u=\"{service_type}\">{arguments}</u:{action}>\
         </s:Body></s:Envelope>"
    )
}

fn parse_response(xml: &str, action: &str) -> Result<SoapResponse> {
    let response_element = format!("{action}Response");
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut fields = HashMap::new();
    let mut saw_response = false;
    let mut in_response = false;
    let mut current: Option<String> = None;

    loop {
        match reader
            .read_event()
            .context("Failed to parse device response")?
        {
            Event::Start(e) => {
                let name = element_name(e.local_name().as_ref());
                if name == response_element {
                    saw_response = true;
                    in_response = true;
                } else if in_response && current.is_none() {
                    fields.insert(name.clone(), String::new());
                    current = Some(name);
                }
            }
            Event::Empty(e) => {
                if in_response && current.is_none() {
                    fields.insert(element_name(e.local_name().as_ref()), String::new());
                }
            }
            Event::Text(t) => {
                if let Some(field) = &current {
                    let value = t
                        .unescape()
                        .context("Failed to unescape device response text")?;
                    fields.insert(field.clone(), value.into_owned());
                }
            }
            Event::End(e) => {
                let name = element_name(e.local_name().as_ref());
                if current.as_deref() == Some(name.as_str()) {
                    current = None;
                } else if name == response_element {
                    in_response = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_response {
        bail!("Device reply carries no {response_element} element");
    }
    Ok(SoapResponse { fields })
}

fn parse_fault_code(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut in_code = false;
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) if e.local_name().as_ref() == b"errorCode" => in_code = true,
            Event::Text(t) if in_code => return t.unescape().ok().map(|code| code.into_owned()),
            Event::End(e) if e.local_name().as_ref() == b"errorCode" => in_code = false,
            Event::Eof => return None,
            _ => {}
        }
    }
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}
