use serde::Deserialize;

/// A remote folder, e.g a course. Only the fields we use are decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Folder {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
}

/// One recorded lecture belonging to a folder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    #[serde(rename = "DeliveryID")]
    pub delivery_id: String,
    #[serde(rename = "SessionName")]
    pub session_name: String,
    #[serde(rename = "FolderName")]
    pub folder_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionsEnvelope {
    pub d: SessionResults,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionResults {
    #[serde(rename = "Results")]
    pub results: Vec<Session>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stream {
    #[serde(rename = "StreamUrl")]
    pub stream_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Delivery {
    #[serde(rename = "Streams", default)]
    pub streams: Vec<Stream>,
}

/// Playback/download descriptor of a session. Fetched on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeliveryInfo {
    #[serde(rename = "Delivery", default)]
    pub delivery: Delivery,
    /// Absent for some deliveries, those can only be fetched via their streams.
    #[serde(rename = "DownloadUrl", default)]
    pub download_url: Option<String>,
}

impl DeliveryInfo {
    pub fn streams(&self) -> &[Stream] {
        &self.delivery.streams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sessions_envelope() {
        let body = r#"{"d":{"Results":[{"SessionName":"Lecture 1/Intro","DeliveryID":"D1","FolderName":"CS101","Duration":3600}],"TotalNumber":1}}"#;
        let envelope: SessionsEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.d.results.len(), 1);
        assert_eq!(envelope.d.results[0].session_name, "Lecture 1/Intro");
        assert_eq!(envelope.d.results[0].delivery_id, "D1");
    }

    #[test]
    fn test_decode_delivery_info() {
        let body = r#"{"Delivery":{"Streams":[{"StreamUrl":"http://x/a.m3u8","Tag":"DV"},{"StreamUrl":"http://x/b.m3u8"}]},"DownloadUrl":"http://x/file"}"#;
        let info: DeliveryInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.download_url.as_deref(), Some("http://x/file"));
        assert_eq!(info.streams().len(), 2);
        assert_eq!(info.streams()[1].stream_url, "http://x/b.m3u8");
    }

    #[test]
    fn test_decode_error_shaped_payload_fails() {
        let body = r#"{"ErrorCode":401,"ErrorMessage":"Unauthorized"}"#;
        assert!(serde_json::from_str::<SessionsEnvelope>(body).is_err());
        assert!(serde_json::from_str::<Vec<Folder>>(body).is_err());
    }
}
