//! Self-signed certificate bootstrap.
//!
//! The HTTPS listener always needs a key pair on disk. When either file is
//! missing, `openssl` is asked to mint a fresh RSA-2048 certificate for
//! `localhost`, valid for 365 days. Any failure here aborts startup.

use std::ffi::OsString;
use std::path::Path;

use anyhow::{bail, Context};
use tokio::process::Command;

use crate::config::TlsConfig;

pub const CERT_SUBJECT: &str = "/CN=localhost";
pub const CERT_DAYS: u32 = 365;
pub const RSA_BITS: u32 = 2048;

/// Makes sure `tls.cert_path` and `tls.key_path` exist, generating them if not.
pub async fn ensure_certificate(tls: &TlsConfig) -> anyhow::Result<()> {
    let cert = tls.cert_path.as_path();
    let key = tls.key_path.as_path();

    if cert.exists() && key.exists() {
        tracing::debug!("Using existing certificate {}", cert.display());
        return Ok(());
    }

    for path in [cert, key] {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }

    tracing::info!("Generating self-signed certificate at {}", cert.display());
    let output = Command::new(&tls.openssl_bin)
        .args(openssl_args(cert, key))
        .output()
        .await
        .with_context(|| format!("failed to run {}", tls.openssl_bin))?;

    if !output.status.success() {
        bail!(
            "{} exited with {}: {}",
            tls.openssl_bin,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    if !cert.exists() || !key.exists() {
        bail!("{} did not produce a certificate/key pair", tls.openssl_bin);
    }

    Ok(())
}

/// Arguments for `openssl req` producing an unencrypted key and cert.
pub fn openssl_args(cert: &Path, key: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["req", "-x509", "-newkey"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(format!("rsa:{RSA_BITS}").into());
    args.push("-keyout".into());
    args.push(key.as_os_str().to_owned());
    args.push("-out".into());
    args.push(cert.as_os_str().to_owned());
    args.push("-days".into());
    args.push(CERT_DAYS.to_string().into());
    args.push("-nodes".into());
    args.push("-subj".into());
    args.push(CERT_SUBJECT.into());
    args
}
