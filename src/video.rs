use crate::listener::Listeners;
use crate::media::{Media, MediaEvent, PlayFuture};
use crate::{Error, PlayRejected};
use futures::channel::oneshot;
use futures::FutureExt;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_app::prelude::*;
use iced::widget::image;
use log::{error, warn};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How long a play request may wait for the pipeline to reach `Playing`.
const PLAY_TIMEOUT_SECS: u64 = 10;

/// Latest decoded RGBA frame.
#[derive(Default)]
struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// A media primitive backed by a GStreamer `playbin` pipeline, loaded from a
/// URI (e.g., a local file path or HTTP stream).
///
/// The pipeline prerolls in the background after construction; metadata
/// and time progress are reported to listeners from [`Media::poll`].
pub struct Video {
    bus: gst::Bus,
    source: gst::Pipeline,
    alive: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,

    duration: Option<Duration>,
    speed: f64,
    last_position: Option<f64>,
    is_eos: bool,

    frame: Arc<Mutex<Frame>>,
    upload_frame: Arc<AtomicBool>,
    handle: RefCell<Option<image::Handle>>,
    paused: Arc<AtomicBool>,
    /// Bumped by every pause; play requests from an older generation abort.
    generation: Arc<AtomicU64>,

    listeners: Listeners,
}

impl Drop for Video {
    fn drop(&mut self) {
        if let Err(err) = self.source.set_state(gst::State::Null) {
            error!("failed to stop pipeline: {err}");
        }

        self.alive.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("video worker panicked");
            }
        }
    }
}

impl Video {
    /// Create a new video from `uri`. Playback starts paused.
    pub fn new(uri: &url::Url) -> Result<Self, Error> {
        gst::init()?;

        let pipeline = format!("playbin uri=\"{}\" video-sink=\"videoconvert ! videoscale ! appsink name=iced_video drop=true caps=video/x-raw,format=RGBA,pixel-aspect-ratio=1/1\"", uri.as_str());
        let pipeline = gst::parse::launch(pipeline.as_ref())?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Cast)?;

        let video_sink: gst::Element = pipeline.property("video-sink");
        let pad = video_sink.pads().first().cloned().ok_or(Error::Cast)?;
        let pad = pad
            .dynamic_cast::<gst::GhostPad>()
            .map_err(|_| Error::Cast)?;
        let bin = pad
            .parent_element()
            .ok_or(Error::Cast)?
            .downcast::<gst::Bin>()
            .map_err(|_| Error::Cast)?;
        let app_sink = bin
            .by_name("iced_video")
            .ok_or(Error::Cast)?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| Error::Cast)?;

        Self::from_gst_pipeline(pipeline, app_sink)
    }

    /// Creates a new video based on an existing GStreamer pipeline and appsink.
    /// Expects an `appsink` plugin with `caps=video/x-raw,format=RGBA`.
    ///
    /// **Note:** volume, mute and speed assume a `playbin` pipeline.
    pub fn from_gst_pipeline(
        pipeline: gst::Pipeline,
        app_sink: gst_app::AppSink,
    ) -> Result<Self, Error> {
        gst::init()?;

        // preroll only; duration arrives later through `poll`
        pipeline.set_state(gst::State::Paused)?;

        let frame = Arc::new(Mutex::new(Frame::default()));
        let upload_frame = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));
        let paused = Arc::new(AtomicBool::new(true));

        let frame_ref = Arc::clone(&frame);
        let upload_frame_ref = Arc::clone(&upload_frame);
        let alive_ref = Arc::clone(&alive);
        let paused_ref = Arc::clone(&paused);

        let worker = std::thread::spawn(move || {
            while alive_ref.load(Ordering::Acquire) {
                if let Err(gst::FlowError::Error) = (|| -> Result<(), gst::FlowError> {
                    let sample = if paused_ref.load(Ordering::SeqCst) {
                        app_sink
                            .try_pull_preroll(gst::ClockTime::from_mseconds(16))
                            .ok_or(gst::FlowError::Eos)?
                    } else {
                        app_sink
                            .try_pull_sample(gst::ClockTime::from_mseconds(16))
                            .ok_or(gst::FlowError::Eos)?
                    };

                    let caps = sample.caps().ok_or(gst::FlowError::Error)?;
                    let s = caps.structure(0).ok_or(gst::FlowError::Error)?;
                    let width = s.get::<i32>("width").map_err(|_| gst::FlowError::Error)?;
                    let height = s.get::<i32>("height").map_err(|_| gst::FlowError::Error)?;

                    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;

                    let mut frame = frame_ref.lock().map_err(|_| gst::FlowError::Error)?;
                    frame.width = width as u32;
                    frame.height = height as u32;
                    frame.pixels.clear();
                    frame.pixels.extend_from_slice(map.as_slice());

                    upload_frame_ref.store(true, Ordering::SeqCst);

                    Ok(())
                })() {
                    error!("error pulling frame");
                }
            }
        });

        Ok(Video {
            bus: pipeline.bus().ok_or(Error::Bus)?,
            source: pipeline,
            alive,
            worker: Some(worker),

            duration: None,
            speed: 1.0,
            last_position: None,
            is_eos: false,

            frame,
            upload_frame,
            handle: RefCell::new(None),
            paused,
            generation: Arc::new(AtomicU64::new(0)),

            listeners: Listeners::new(),
        })
    }

    fn seek(&self, position: gst::ClockTime) -> Result<(), Error> {
        self.source.seek(
            self.speed,
            gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
            gst::SeekType::Set,
            position,
            gst::SeekType::End,
            gst::ClockTime::from_seconds(0),
        )?;
        Ok(())
    }

    fn set_speed(&mut self, speed: f64) -> Result<(), Error> {
        // nothing to reseek before preroll; the rate applies to the next seek
        if let Some(position) = self.source.query_position::<gst::ClockTime>() {
            self.source.seek(
                speed,
                gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE,
                gst::SeekType::Set,
                position,
                gst::SeekType::End,
                gst::ClockTime::from_seconds(0),
            )?;
        }
        self.speed = speed;
        Ok(())
    }

    fn drain_bus(&mut self) {
        for msg in self.bus.iter() {
            match msg.view() {
                gst::MessageView::Error(err) => {
                    error!("bus returned an error: {err}");
                }
                gst::MessageView::Eos(_) => {
                    self.is_eos = true;
                    if let Err(err) = self.source.set_state(gst::State::Paused) {
                        error!("cannot pause at end of stream: {err}");
                    }
                    self.paused.store(true, Ordering::SeqCst);
                }
                gst::MessageView::DurationChanged(_) => {
                    self.duration = None;
                }
                _ => {}
            }
        }
    }
}

/// Converts seconds to a pipeline position, `None` if it cannot be represented.
fn clock_time(seconds: f64) -> Option<gst::ClockTime> {
    let position = Duration::try_from_secs_f64(seconds).ok()?;
    let nanos = u64::try_from(position.as_nanos()).ok()?;
    Some(gst::ClockTime::from_nseconds(nanos))
}

impl Media for Video {
    fn current_time(&self) -> f64 {
        self.source
            .query_position::<gst::ClockTime>()
            .map_or(0.0, |pos| Duration::from_nanos(pos.nseconds()).as_secs_f64())
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut seconds = seconds.max(0.0);
        if let Some(duration) = self.duration {
            seconds = seconds.min(duration.as_secs_f64());
        }
        let Some(position) = clock_time(seconds) else {
            warn!("ignoring seek to {seconds}s");
            return;
        };
        if let Err(err) = self.seek(position) {
            warn!("seek to {seconds}s failed: {err}");
        }
        self.is_eos = false;
    }

    fn duration(&self) -> f64 {
        self.duration.map_or(0.0, |d| d.as_secs_f64())
    }

    /// `0.0` = 0% volume, `1.0` = 100% volume, on a linear scale.
    fn volume(&self) -> f64 {
        self.source.property("volume")
    }

    fn set_volume(&mut self, volume: f64) {
        let muted = self.muted();
        self.source.set_property("volume", volume);
        self.set_muted(muted); // for some reason gstreamer unmutes when changing volume?
    }

    fn playback_rate(&self) -> f64 {
        self.speed
    }

    fn set_playback_rate(&mut self, rate: f64) {
        if let Err(err) = self.set_speed(rate) {
            warn!("cannot change playback rate to {rate}: {err}");
        }
    }

    fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn muted(&self) -> bool {
        self.source.property("mute")
    }

    fn set_muted(&mut self, muted: bool) {
        self.source.set_property("mute", muted);
    }

    fn play(&mut self) -> PlayFuture {
        if self.is_eos {
            self.is_eos = false;
            if let Err(err) = self.seek(gst::ClockTime::ZERO) {
                warn!("cannot restart stream: {err}");
            }
        }

        self.paused.store(false, Ordering::SeqCst);
        match self.source.set_state(gst::State::Playing) {
            Err(err) => {
                self.paused.store(true, Ordering::SeqCst);
                futures::future::ready(Err(PlayRejected(err.to_string()))).boxed()
            }
            Ok(gst::StateChangeSuccess::Async) => {
                let pipeline = self.source.clone();
                let paused = Arc::clone(&self.paused);
                let generation = Arc::clone(&self.generation);
                let requested = generation.load(Ordering::SeqCst);
                let (sender, receiver) = oneshot::channel();

                std::thread::spawn(move || {
                    let timeout = gst::ClockTime::from_seconds(PLAY_TIMEOUT_SECS);
                    let result = match pipeline.state(timeout) {
                        _ if generation.load(Ordering::SeqCst) != requested => {
                            Err(PlayRejected(String::from("aborted by pause")))
                        }
                        (Ok(gst::StateChangeSuccess::Async), ..) => {
                            Err(PlayRejected(String::from("timed out waiting for playback")))
                        }
                        (Ok(_), gst::State::Playing, _) => Ok(()),
                        (Ok(_), current, _) => Err(PlayRejected(format!(
                            "pipeline settled in {current:?} instead of Playing"
                        ))),
                        (Err(err), ..) => Err(PlayRejected(err.to_string())),
                    };
                    if result.is_err() && generation.load(Ordering::SeqCst) == requested {
                        paused.store(true, Ordering::SeqCst);
                    }
                    let _ = sender.send(result);
                });

                receiver
                    .map(|settled| {
                        settled.unwrap_or_else(|_| {
                            Err(PlayRejected(String::from("play request abandoned")))
                        })
                    })
                    .boxed()
            }
            Ok(_) => futures::future::ready(Ok(())).boxed(),
        }
    }

    /// Pausing aborts any play request still waiting on the pipeline.
    fn pause(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.source.set_state(gst::State::Paused) {
            error!("cannot pause: {err}");
        }
        self.paused.store(true, Ordering::SeqCst);
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    fn poll(&mut self) {
        self.drain_bus();

        if self.duration.is_none() {
            if let Some(duration) = self.source.query_duration::<gst::ClockTime>() {
                let duration = Duration::from_nanos(duration.nseconds());
                self.duration = Some(duration);
                self.listeners.emit(MediaEvent::MetadataReady {
                    duration: duration.as_secs_f64(),
                });
            }
        }

        let position = self.current_time();
        if self.last_position != Some(position) {
            self.last_position = Some(position);
            self.listeners.emit(MediaEvent::TimeProgress {
                current_time: position,
            });
        }
    }

    fn frame(&self) -> Option<image::Handle> {
        if self.upload_frame.swap(false, Ordering::SeqCst) {
            let frame = self.frame.lock().ok()?;
            *self.handle.borrow_mut() = Some(image::Handle::from_rgba(
                frame.width,
                frame.height,
                frame.pixels.clone(),
            ));
        }
        self.handle.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_converts_representable_positions() {
        assert_eq!(clock_time(0.0), Some(gst::ClockTime::ZERO));
        assert_eq!(clock_time(1.5), Some(gst::ClockTime::from_mseconds(1500)));
    }

    #[test]
    fn clock_time_rejects_out_of_range_positions() {
        assert_eq!(clock_time(f64::INFINITY), None);
        assert_eq!(clock_time(f64::NAN), None);
        assert_eq!(clock_time(-1.0), None);
        assert_eq!(clock_time(1e20), None);
        assert_eq!(clock_time(f64::MAX), None);
    }
}
