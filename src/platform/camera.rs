//! Browser camera acquisition
//!
//! The stream only feeds the radar preview; gestures still come from the
//! synthetic source. Failure is logged and otherwise ignored by callers.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack};

use crate::error::{Error, Result};

/// A live camera stream, held until `release`
pub struct CameraFeed {
    stream: MediaStream,
}

impl CameraFeed {
    /// Prompt for the camera and attach the stream to `preview` if given
    pub async fn acquire(preview: Option<&HtmlVideoElement>) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| unavailable("no window"))?;
        let devices = window.navigator().media_devices().map_err(js_error)?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&JsValue::TRUE);
        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(js_error)?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;

        if let Some(video) = preview {
            video.set_src_object(Some(&stream));
            let _ = video.play();
        }

        log::info!("Camera acquired ({} tracks)", stream.get_tracks().length());
        Ok(Self { stream })
    }

    /// Stop every track so the browser drops its camera indicator
    pub fn release(&self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        log::info!("Camera released");
    }
}

fn unavailable(reason: &str) -> Error {
    Error::CameraUnavailable(reason.to_string())
}

fn js_error(value: JsValue) -> Error {
    let reason = value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value));
    Error::CameraUnavailable(reason)
}
