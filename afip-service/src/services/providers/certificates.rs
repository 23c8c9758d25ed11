//! Certificate and environment provider.

use std::path::PathBuf;

use crate::config::AfipConfig;
use crate::models::{EnvironmentKind, Invoice};

pub trait CertificateProvider: Send + Sync {
    fn environment(&self) -> EnvironmentKind;

    fn has_valid_certificate(&self) -> bool;
}

/// Certificate and key files taken from configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredCertificates {
    environment: EnvironmentKind,
    certificate_path: Option<PathBuf>,
    private_key_path: Option<PathBuf>,
}

impl ConfiguredCertificates {
    pub fn new(
        environment: EnvironmentKind,
        certificate_path: Option<PathBuf>,
        private_key_path: Option<PathBuf>,
    ) -> Self {
        Self {
            environment,
            certificate_path,
            private_key_path,
        }
    }

    pub fn from_config(config: &AfipConfig) -> Self {
        Self::new(
            config.environment,
            config.credentials.certificate_path.clone(),
            config.credentials.private_key_path.clone(),
        )
    }
}

impl CertificateProvider for ConfiguredCertificates {
    fn environment(&self) -> EnvironmentKind {
        self.environment
    }

    /// Both files configured and present on disk.
    fn has_valid_certificate(&self) -> bool {
        match (&self.certificate_path, &self.private_key_path) {
            (Some(cert), Some(key)) => cert.is_file() && key.is_file(),
            _ => false,
        }
    }
}

/// Fixed answer, for tests and local runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticCertificates {
    pub environment: EnvironmentKind,
    pub valid: bool,
}

impl CertificateProvider for StaticCertificates {
    fn environment(&self) -> EnvironmentKind {
        self.environment
    }

    fn has_valid_certificate(&self) -> bool {
        self.valid
    }
}

/// Environment the invoice is validated against.
///
/// `None` when there is nothing to validate (no fiscal service, code already
/// obtained) or when running in homologation without usable certificates.
pub fn validation_type(
    invoice: &Invoice,
    certificates: &dyn CertificateProvider,
) -> Option<EnvironmentKind> {
    if invoice.auth_code().is_some() || !invoice.journal.uses_electronic_authorization() {
        return None;
    }
    match certificates.environment() {
        EnvironmentKind::Homologation if !certificates.has_valid_certificate() => None,
        environment => Some(environment),
    }
}
