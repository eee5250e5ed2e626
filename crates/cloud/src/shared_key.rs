use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{CloudError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Shared Key credential for Azure Storage requests.
#[derive(Clone)]
pub struct SharedKeyCredential {
    account: String,
    key: Vec<u8>,
}

impl SharedKeyCredential {
    pub fn new(account: impl Into<String>, base64_key: &str) -> Result<Self> {
        let key = STANDARD.decode(base64_key).map_err(|err| {
            CloudError::Config(format!("storage account key is not valid base64: {err}"))
        })?;
        Ok(Self {
            account: account.into(),
            key,
        })
    }

    pub fn authorization(&self, request: &CanonicalRequest<'_>) -> Result<String> {
        let payload = request.string_to_sign(&self.account);
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|err| CloudError::Config(format!("storage account key rejected: {err}")))?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("SharedKey {}:{}", self.account, signature))
    }
}

/// The request parts that participate in the Shared Key signature.
///
/// `path` must be the percent-encoded URL path and `query` the decoded
/// query pairs sorted by name.
pub struct CanonicalRequest<'a> {
    pub verb: &'a str,
    pub content_length: u64,
    pub content_type: &'a str,
    pub date: &'a str,
    pub version: &'a str,
    pub path: &'a str,
    pub query: &'a [(String, String)],
}

impl CanonicalRequest<'_> {
    // 2015-02-21 signature layout: VERB, eleven standard header slots,
    // the canonicalized x-ms headers, then the canonicalized resource.
    // A zero Content-Length is signed as an empty slot.
    fn string_to_sign(&self, account: &str) -> String {
        let content_length = if self.content_length == 0 {
            String::new()
        } else {
            self.content_length.to_string()
        };
        let mut resource = format!("/{}{}", account, self.path);
        for (name, value) in self.query {
            resource.push('\n');
            resource.push_str(name);
            resource.push(':');
            resource.push_str(value);
        }
        format!(
            "{verb}\n\n\n{content_length}\n\n{content_type}\n\n\n\n\n\n\nx-ms-date:{date}\nx-ms-version:{version}\n{resource}",
            verb = self.verb,
            content_length = content_length,
            content_type = self.content_type,
            date = self.date,
            version = self.version,
            resource = resource,
        )
    }
}
