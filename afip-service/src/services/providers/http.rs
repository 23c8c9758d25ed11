//! JSON gateway client for the AFIP web services.
//!
//! The gateway fronts the SOAP services and the authentication ticket
//! exchange; this client only speaks its JSON contract:
//!
//! - `GET  {base}/{service}/last-authorized?point_of_sale=&document_type=`
//! - `POST {base}/{service}/authorize`

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{Connector, FiscalWebService, RawResponse, ServiceFault};
use crate::config::AfipConfig;
use crate::models::{AuditTrace, AuthorizationRequest, FiscalService, Observation};

/// Access ticket and issuer sent with every call.
#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub token: Secret<String>,
    pub sign: Secret<String>,
    pub cuit: String,
}

#[derive(Debug, Deserialize)]
struct LastAuthorizedResponse {
    number: u64,
}

#[derive(Debug, Default, Deserialize)]
struct AuthorizeResponse {
    #[serde(default)]
    cae: Option<String>,
    #[serde(default)]
    resultado: Option<String>,
    #[serde(default)]
    vencimiento: Option<String>,
    #[serde(default)]
    fch_venc_cae: Option<String>,
    #[serde(default)]
    observaciones: Vec<WireObservation>,
    #[serde(default)]
    err_msg: Option<String>,
    #[serde(default)]
    excepcion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireObservation {
    code: i64,
    msg: String,
}

/// One fiscal web service reached through the gateway.
#[derive(Clone)]
pub struct HttpFiscalWebService {
    client: Client,
    base_url: String,
    service: FiscalService,
    credentials: GatewayCredentials,
}

impl HttpFiscalWebService {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        service: FiscalService,
        credentials: GatewayCredentials,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service,
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.service.as_str(), path)
    }

    fn authenticated(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-afip-token", self.credentials.token.expose_secret().as_str())
            .header("x-afip-sign", self.credentials.sign.expose_secret().as_str())
            .header("x-afip-cuit", self.credentials.cuit.as_str())
    }
}

/// Timeouts and refused connections may clear up; anything else is permanent.
fn send_fault(err: reqwest::Error, trace: AuditTrace) -> ServiceFault {
    if err.is_timeout() {
        ServiceFault::transient(format!("Timed out waiting for AFIP: {}", err), trace)
    } else if err.is_connect() {
        ServiceFault::transient(format!("Could not connect to AFIP: {}", err), trace)
    } else {
        ServiceFault::permanent(format!("AFIP request failed: {}", err), trace)
    }
}

fn status_fault(status: StatusCode, body: &str, trace: AuditTrace) -> ServiceFault {
    let message = format!("AFIP gateway returned {}: {}", status, body.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        ServiceFault::transient(message, trace)
    } else {
        ServiceFault::permanent(message, trace)
    }
}

#[async_trait]
impl FiscalWebService for HttpFiscalWebService {
    fn service(&self) -> FiscalService {
        self.service
    }

    #[tracing::instrument(skip(self), fields(service = %self.service))]
    async fn last_authorized_number(
        &self,
        point_of_sale: u32,
        document_type: u16,
    ) -> Result<u64, ServiceFault> {
        let url = self.url("last-authorized");
        let request = self.authenticated(self.client.get(&url)).query(&[
            ("point_of_sale", point_of_sale.to_string()),
            ("document_type", document_type.to_string()),
        ]);

        let response = request
            .send()
            .await
            .map_err(|e| send_fault(e, AuditTrace::default()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| send_fault(e, AuditTrace::default()))?;
        let trace = AuditTrace::new(None, Some(body.clone()));

        tracing::debug!(status = %status, "AFIP last-authorized response");

        if !status.is_success() {
            return Err(status_fault(status, &body, trace));
        }

        let parsed: LastAuthorizedResponse = serde_json::from_str(&body).map_err(|e| {
            ServiceFault::permanent(format!("Malformed last-authorized response: {}", e), trace)
        })?;
        Ok(parsed.number)
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            service = %self.service,
            point_of_sale = request.point_of_sale,
            document_type = request.document_type,
            invoice_number = request.invoice_number,
        )
    )]
    async fn submit(&self, request: &AuthorizationRequest) -> Result<RawResponse, ServiceFault> {
        let payload = serde_json::to_string(request).map_err(|e| {
            ServiceFault::permanent(format!("Could not encode request: {}", e), AuditTrace::default())
        })?;

        let response = self
            .authenticated(self.client.post(self.url("authorize")))
            .header(CONTENT_TYPE, "application/json")
            .body(payload.clone())
            .send()
            .await
            .map_err(|e| send_fault(e, AuditTrace::new(Some(payload.clone()), None)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| send_fault(e, AuditTrace::new(Some(payload.clone()), None)))?;
        let trace = AuditTrace::new(Some(payload), Some(body.clone()));

        tracing::debug!(status = %status, "AFIP authorize response");

        if !status.is_success() {
            return Err(status_fault(status, &body, trace));
        }

        let parsed: AuthorizeResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(ServiceFault::permanent(
                    format!("Malformed authorize response: {}", e),
                    trace,
                ))
            }
        };

        Ok(RawResponse {
            auth_code: parsed.cae,
            result: parsed.resultado,
            vencimiento: parsed.vencimiento,
            fch_venc_cae: parsed.fch_venc_cae,
            observations: parsed
                .observaciones
                .into_iter()
                .map(|o| Observation {
                    code: o.code,
                    message: o.msg,
                })
                .collect(),
            error_message: parsed.err_msg,
            exception: parsed.excepcion,
            trace,
        })
    }
}

/// Builds gateway clients for one environment, sharing the HTTP pool.
#[derive(Clone)]
pub struct HttpConnector {
    client: Client,
    base_url: String,
    credentials: GatewayCredentials,
}

impl HttpConnector {
    pub fn new(
        base_url: impl Into<String>,
        credentials: GatewayCredentials,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    pub fn from_config(config: &AfipConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.base_url(),
            GatewayCredentials {
                token: config.credentials.token.clone(),
                sign: config.credentials.sign.clone(),
                cuit: config.issuer.cuit.clone(),
            },
            config.request_timeout(),
            config.connect_timeout(),
        )
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(
        &self,
        service: FiscalService,
    ) -> Result<Arc<dyn FiscalWebService>, ServiceFault> {
        tracing::info!(service = %service, base_url = %self.base_url, "Connecting to AFIP gateway");
        Ok(Arc::new(HttpFiscalWebService::new(
            self.client.clone(),
            self.base_url.clone(),
            service,
            self.credentials.clone(),
        )))
    }
}
