use reqwest::Method;

use crate::{
    error::Result,
    spotify::client::ApiClient,
    types::{Device, DevicesResponse, PlayRequest},
    utils, warning,
};

/// Device type reported for phones.
const PHONE_DEVICE_TYPE: &str = "Smartphone";

/// The active device, else a phone, else the first device listed.
pub fn pick_device(devices: &[Device]) -> Option<&Device> {
    devices
        .iter()
        .find(|d| d.is_active)
        .or_else(|| {
            devices
                .iter()
                .find(|d| d.device_type.as_deref() == Some(PHONE_DEVICE_TYPE))
        })
        .or_else(|| devices.first())
}

pub async fn default_device_id(api: &ApiClient) -> Result<Option<String>> {
    let response: DevicesResponse = api.get_json("/me/player/devices").await?;
    Ok(pick_device(&response.devices).and_then(|d| d.id.clone()))
}

/// Resumes whatever was playing last.
pub async fn resume_playback(api: &ApiClient) -> Result<bool> {
    play(api, PlayRequest { uris: None }).await
}

/// Starts playback of `uris` on the default device.
pub async fn play_tracks(api: &ApiClient, uris: &[String]) -> Result<bool> {
    play(
        api,
        PlayRequest {
            uris: Some(uris.to_vec()),
        },
    )
    .await
}

/// Returns `false` when there is no device to play on.
async fn play(api: &ApiClient, request: PlayRequest) -> Result<bool> {
    let Some(device_id) = default_device_id(api).await? else {
        warning!("No playback device available, open Spotify on one of your devices");
        return Ok(false);
    };

    let path = utils::with_query("/me/player/play", "device_id", &device_id);
    api.execute_request(&path, Method::PUT, Some(&serde_json::to_value(&request)?))
        .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, active: bool, kind: &str) -> Device {
        Device {
            id: Some(id.into()),
            name: Some(id.into()),
            is_active: active,
            device_type: Some(kind.into()),
        }
    }

    #[test]
    fn test_active_device_wins() {
        let devices = vec![
            device("phone", false, "Smartphone"),
            device("desk", true, "Computer"),
        ];
        assert_eq!(pick_device(&devices).and_then(|d| d.id.as_deref()), Some("desk"));
    }

    #[test]
    fn test_phone_before_first_device() {
        let devices = vec![
            device("tv", false, "TV"),
            device("phone", false, "Smartphone"),
        ];
        assert_eq!(pick_device(&devices).and_then(|d| d.id.as_deref()), Some("phone"));
    }

    #[test]
    fn test_first_device_as_last_resort() {
        let devices = vec![device("tv", false, "TV"), device("car", false, "Automobile")];
        assert_eq!(pick_device(&devices).and_then(|d| d.id.as_deref()), Some("tv"));
        assert!(pick_device(&[]).is_none());
    }
}
