// Attachment content download.
//
// Attachment URLs are absolute (handed back inside issue payloads), so this
// bypasses the REST namespace prefixes and only reuses the session's auth.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::client::JiraClient;
use crate::error::Error;

impl JiraClient {
    /// Download attachment content and return it base64-encoded.
    pub async fn fetch_attachment(&self, url: &str) -> Result<String, Error> {
        let session = self.session()?;
        let bytes = session.get_bytes(url).await?;
        Ok(STANDARD.encode(bytes))
    }
}
