//! Fetched resource type
//!
//! What a successful origin fetch returns: the response body plus the
//! metadata that travels with it through the cache.

/// A successfully fetched resource from the origin
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// HTTP status of the response
    pub status: u16,
    /// Content-Type header, if the origin sent one
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Body length in bytes
    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }
}
