use std::io::{self, Read, Write};
use std::time::Duration;

use aitk_contracts::{NetworkFailure, ToolError};
use reqwest::blocking::Client as HttpClient;
use tracing::debug;

use super::{transport_error, truncate_text, ImageDownloader};

const SERVICE: &str = "image download";
const SINK_LABEL: &str = "downloaded image";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    http: HttpClient,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageDownloader for HttpDownloader {
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ToolError> {
        debug!(%url, "downloading generated image");
        let response = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .map_err(|err| transport_error(SERVICE, &err))?;
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(ToolError::api(
                SERVICE,
                format!("{code} {}", truncate_text(body.trim(), 256)),
            ));
        }
        stream_body(response, sink)
    }
}

/// Copies `body` into `sink`. Read failures are network errors, write
/// failures are io errors.
fn stream_body(mut body: impl Read, sink: &mut dyn Write) -> Result<u64, ToolError> {
    let mut buffer = vec![0u8; CHUNK_BYTES];
    let mut total = 0u64;
    loop {
        let read = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(read_error(err)),
        };
        sink.write_all(&buffer[..read])
            .map_err(|err| ToolError::io(SINK_LABEL, err))?;
        total += read as u64;
    }
    Ok(total)
}

fn read_error(err: io::Error) -> ToolError {
    if let Some(inner) = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
    {
        return transport_error(SERVICE, inner);
    }
    let failure = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => NetworkFailure::Timeout,
        _ => NetworkFailure::Connection,
    };
    ToolError::network(failure, format!("{SERVICE}: {err}"))
}
