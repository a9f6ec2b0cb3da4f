//! Raw-TCP mock of a Storage endpoint and a fake credential for the SDK
//! store tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use azure_core::credentials::{AccessToken, TokenCredential, TokenRequestOptions};
use azure_core::time::{Duration, OffsetDateTime};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) struct MockStorageServer {
    listener: TcpListener,
    pub(crate) base_url: String,
}

impl MockStorageServer {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{port}/acct1");
        Self { listener, base_url }
    }

    /// Answer one connection per entry in `responses`, in order. Returns the
    /// raw requests received.
    pub(crate) async fn respond_all(self, responses: Vec<(u16, String)>) -> Vec<String> {
        let responses = responses
            .into_iter()
            .map(|(status, body)| (status, None, body))
            .collect();
        self.serve(responses).await
    }

    /// Answer one request with a Storage error: the code goes in
    /// `x-ms-error-code` and in the XML body.
    pub(crate) async fn respond_error(self, status_code: u16, code: &str) -> String {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>{code}</Code>\
             <Message>mock failure</Message></Error>"
        );
        self.serve(vec![(status_code, Some(code.to_owned()), body)])
            .await
            .remove(0)
    }

    async fn serve(self, responses: Vec<(u16, Option<String>, String)>) -> Vec<String> {
        let mut requests = Vec::with_capacity(responses.len());
        for (status_code, error_code, body) in responses {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            requests.push(read_request(&mut stream).await);

            let error_header = error_code
                .map(|code| format!("x-ms-error-code: {code}\r\n"))
                .unwrap_or_default();
            let response = format!(
                "HTTP/1.1 {status_code} Mock\r\n\
                 Content-Type: application/xml\r\n\
                 Content-Length: {}\r\n\
                 x-ms-request-id: test-123\r\n\
                 {error_header}\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        requests
    }

    pub(crate) async fn respond_once(self, status_code: u16, body: &str) -> String {
        self.respond_all(vec![(status_code, body.to_owned())])
            .await
            .remove(0)
    }
}

/// Read the request head and as much body as `Content-Length` announces.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Case-insensitive header lookup in a raw request.
pub(crate) fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request
        .split("\r\n\r\n")
        .next()?
        .lines()
        .skip(1)
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then_some(value.trim())
        })
}

pub(crate) fn body(request: &str) -> &str {
    request.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

pub(crate) fn request_line(request: &str) -> &str {
    request.lines().next().unwrap_or_default()
}

/// One page of a List Blobs response. Entries with metadata get an
/// `operationid` pair.
pub(crate) fn page_xml(blobs: &[(&str, Option<&str>)], next_marker: &str) -> String {
    let items: String = blobs
        .iter()
        .map(|(name, operation_id)| {
            let metadata = operation_id
                .map(|id| format!("<operationid>{id}</operationid>"))
                .unwrap_or_default();
            format!(
                "<Blob><Name>{name}</Name><Properties><BlobType>BlockBlob</BlobType></Properties>\
                 <Metadata>{metadata}</Metadata></Blob>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <EnumerationResults ServiceEndpoint=\"http://127.0.0.1/acct1\" ContainerName=\"c1\">\
         <Blobs>{items}</Blobs><NextMarker>{next_marker}</NextMarker></EnumerationResults>"
    )
}

/// Hands out a fixed bearer token and counts how often it was asked.
#[derive(Debug, Default)]
pub(crate) struct FakeCredential {
    requests: AtomicUsize,
}

impl FakeCredential {
    pub(crate) fn token_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenCredential for FakeCredential {
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions<'_>>,
    ) -> azure_core::Result<AccessToken> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::new(
            "fake-token",
            OffsetDateTime::now_utc() + Duration::hours(1),
        ))
    }
}
