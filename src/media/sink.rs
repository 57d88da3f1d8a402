//! Opening a locator into a paused `rodio` sink.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::time::Duration;

use reqwest::blocking::Client;
use rodio::{Decoder, OutputStream, Sink, Source};
use url::Url;

use super::locator::Locator;
use super::types::StartFailure;

/// Fetches remote media into memory. The client is built on first use.
pub(super) struct HttpFetcher {
    timeout: Duration,
    client: Option<Client>,
}

impl HttpFetcher {
    pub(super) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: None,
        }
    }

    fn client(&mut self, url: &Url) -> Result<&Client, StartFailure> {
        if self.client.is_none() {
            let client = Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| fetch_failure(url, e))?;
            self.client = Some(client);
        }
        self.client.as_ref().ok_or(StartFailure::Disconnected)
    }

    fn fetch(&mut self, url: &Url) -> Result<Vec<u8>, StartFailure> {
        let response = self
            .client(url)?
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_failure(url, e))?;

        let bytes = response.bytes().map_err(|e| fetch_failure(url, e))?;
        Ok(bytes.to_vec())
    }
}

fn fetch_failure(url: &Url, e: reqwest::Error) -> StartFailure {
    StartFailure::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

/// Open `locator` into a paused `Sink`, returning the decoder's total
/// duration when it knows one.
pub(super) fn open_sink(
    stream: &OutputStream,
    locator: &Locator,
    http: &mut HttpFetcher,
) -> Result<(Sink, Option<Duration>), StartFailure> {
    match locator {
        Locator::File(path) => {
            let file = File::open(path).map_err(|e| StartFailure::Open {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?;
            attach(stream, locator, BufReader::new(file))
        }
        Locator::Remote(url) => {
            let bytes = http.fetch(url)?;
            attach(stream, locator, Cursor::new(bytes))
        }
    }
}

fn attach<R>(
    stream: &OutputStream,
    locator: &Locator,
    reader: R,
) -> Result<(Sink, Option<Duration>), StartFailure>
where
    R: Read + Seek + Send + Sync + 'static,
{
    let source = Decoder::new(reader).map_err(|e| StartFailure::Decode {
        locator: locator.to_string(),
        reason: e.to_string(),
    })?;
    let total = source.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}

/// Clamp a seek target to `[0, duration]`. Without a known duration only the
/// lower bound and a representable upper bound apply.
pub(super) fn clamp_seek(seconds: f64, duration: Option<Duration>) -> f64 {
    if seconds.is_nan() {
        return 0.0;
    }
    let upper = duration.map_or(f64::from(u32::MAX), |d| d.as_secs_f64());
    seconds.clamp(0.0, upper)
}
