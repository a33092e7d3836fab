//! Image upload to the asset endpoint.

use {reqwest::Method, serde::Serialize, tracing::debug};

use crate::{Result, api::ApiClient, types::UploadResponse};

/// `file_type` value for images.
const FILE_TYPE_IMAGE: u8 = 1;

/// How the image bytes reach the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Remote URL the platform fetches itself.
    Url(&'a str),
    /// Base64 payload sent inline.
    Inline(&'a str),
}

impl<'a> ImageSource<'a> {
    /// Classify caller input: `http*` → URL, `data:` URI → its payload after
    /// the first comma, anything else → already-encoded inline data.
    pub fn classify(image_data: &'a str) -> Self {
        if image_data.starts_with("http") {
            return Self::Url(image_data);
        }
        if image_data.starts_with("data:") {
            let payload = image_data
                .split_once(',')
                .map_or("", |(_, payload)| payload);
            return Self::Inline(payload);
        }
        Self::Inline(image_data)
    }
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    file_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<&'a str>,
    srv_send_msg: bool,
}

impl<'a> From<ImageSource<'a>> for UploadRequest<'a> {
    fn from(source: ImageSource<'a>) -> Self {
        let (url, file_data) = match source {
            ImageSource::Url(url) => (Some(url), None),
            ImageSource::Inline(data) => (None, Some(data)),
        };
        Self {
            file_type: FILE_TYPE_IMAGE,
            url,
            file_data,
            srv_send_msg: false,
        }
    }
}

/// Upload an image and return the asset id to reference in an image message.
pub async fn upload_image(api: &ApiClient, token: &str, image_data: &str) -> Result<String> {
    let source = ImageSource::classify(image_data);
    debug!(
        remote = matches!(source, ImageSource::Url(_)),
        "uploading image asset"
    );
    let body = UploadRequest::from(source);
    let resp: UploadResponse = api
        .request(token, Method::POST, "/v2/assets", Some(&body))
        .await?;
    Ok(resp.file_info)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::Error,
        mockito::Matcher,
        reqwest::Client,
        rstest::rstest,
        serde_json::json,
    };

    #[rstest]
    #[case("https://x/y.png", ImageSource::Url("https://x/y.png"))]
    #[case("http://x/y.png", ImageSource::Url("http://x/y.png"))]
    #[case("data:image/png;base64,AAAA", ImageSource::Inline("AAAA"))]
    #[case("data:,AAAA", ImageSource::Inline("AAAA"))]
    #[case("data:image/png;base64", ImageSource::Inline(""))]
    #[case("AAAA", ImageSource::Inline("AAAA"))]
    fn classify_input(#[case] input: &str, #[case] expected: ImageSource<'_>) {
        assert_eq!(ImageSource::classify(input), expected);
    }

    async fn upload_with(expected_body: serde_json::Value, image_data: &str) -> String {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/assets")
            .match_header("authorization", "QQBot tok")
            .match_body(Matcher::Json(expected_body))
            .with_status(200)
            .with_body(r#"{"file_info":"asset-123","file_uuid":"u","ttl":0}"#)
            .create_async()
            .await;

        let api = ApiClient::new(Client::new(), server.url(), server.url());
        let asset = upload_image(&api, "tok", image_data).await.unwrap();
        mock.assert_async().await;
        asset
    }

    #[tokio::test]
    async fn data_uri_sends_inline_payload() {
        let asset = upload_with(
            json!({"file_type": 1, "file_data": "AAAA", "srv_send_msg": false}),
            "data:image/png;base64,AAAA",
        )
        .await;
        assert_eq!(asset, "asset-123");
    }

    #[tokio::test]
    async fn url_sends_url_reference() {
        let asset = upload_with(
            json!({"file_type": 1, "url": "https://x/y.png", "srv_send_msg": false}),
            "https://x/y.png",
        )
        .await;
        assert_eq!(asset, "asset-123");
    }

    #[tokio::test]
    async fn raw_base64_is_forwarded_as_is() {
        let asset = upload_with(
            json!({"file_type": 1, "file_data": "AAAA", "srv_send_msg": false}),
            "AAAA",
        )
        .await;
        assert_eq!(asset, "asset-123");
    }

    #[tokio::test]
    async fn upload_failure_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/assets")
            .with_status(400)
            .with_body(r#"{"message":"file too large","code":850012}"#)
            .create_async()
            .await;

        let api = ApiClient::new(Client::new(), server.url(), server.url());
        let err = upload_image(&api, "tok", "AAAA").await.unwrap_err();
        assert!(matches!(err, Error::Api { code: Some(850012), .. }));
        assert!(err.to_string().contains("/v2/assets"));
    }
}
