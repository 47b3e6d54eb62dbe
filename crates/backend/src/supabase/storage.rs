//! Storage buckets.

use async_trait::async_trait;
use tracing::instrument;

use super::{Api, SupabaseClient, check};
use crate::auth::AccessToken;
use crate::error::BackendError;
use crate::gateway::ObjectStorage;

/// Percent-encode each segment of an object path, keeping the slashes.
fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    #[instrument(skip(self, bytes, auth), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
        auth: &AccessToken,
    ) -> Result<String, BackendError> {
        let object = format!(
            "storage/v1/object/{}/{}",
            urlencoding::encode(bucket),
            encode_object_path(path)
        );
        let url = self.url(&object, &[])?;
        let request = self
            .inner
            .client
            .post(url)
            .header("Content-Type", content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .header("cache-control", "max-age=3600")
            .body(bytes);
        let response = self.authorized(request, Some(auth)).send().await?;
        check(response, Api::Storage).await?;

        tracing::info!("object uploaded");
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.inner.config.endpoint(&format!(
            "storage/v1/object/public/{}/{}",
            urlencoding::encode(bucket),
            encode_object_path(path)
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::SupabaseConfig;

    #[test]
    fn test_public_url() {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: "https://abcd.supabase.co".parse().unwrap(),
            anon_key: SecretString::from("anon"),
            schema: "portfolio".to_string(),
        })
        .unwrap();

        assert_eq!(
            client.public_url("blog-images", "blog-1700000000000-my photo.png"),
            "https://abcd.supabase.co/storage/v1/object/public/blog-images/blog-1700000000000-my%20photo.png"
        );
    }

    #[test]
    fn test_encode_object_path_keeps_slashes() {
        assert_eq!(encode_object_path("2025/a b.jpg"), "2025/a%20b.jpg");
    }
}
