//! Background frame delivery.
//!
//! Wraps an initialized session and an attention source into a reader
//! thread that pushes contact frames over a bounded channel. Control
//! inputs (click state, enable, keyboard activity) are forwarded into the
//! session between reads, so the session itself stays single-threaded.

use crate::port::RegisterPort;
use crate::sensor::TouchSensor;
use crate::types::ContactFrame;
use crate::{Result, RmiError};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One hardware attention event: the report bytes the host read from the
/// data registers, and when it read them.
#[derive(Debug, Clone)]
pub struct Attention {
    pub packet: Vec<u8>,
    pub timestamp_us: u64,
}

/// Source of attention events, implemented over the host's interrupt or
/// polling plumbing.
pub trait AttentionSource: Send {
    /// Block for up to `timeout` waiting for the next attention event.
    /// `Ok(None)` means the wait timed out and the caller should retry.
    fn wait_attention(&mut self, timeout: Duration) -> Result<Option<Attention>>;
}

enum ControlMsg {
    Click(bool),
    Enabled(bool),
    KeyboardActivity(u64),
}

/// Handle to an active contact stream.
pub struct ContactStream {
    receiver: Receiver<ContactFrame>,
    controls: Sender<ControlMsg>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ContactStream {
    /// Move the session and attention source into a reader thread and
    /// start delivering frames.
    pub fn start<P, S>(sensor: TouchSensor<P>, source: S) -> Result<ContactStream>
    where
        P: RegisterPort + Send + 'static,
        S: AttentionSource + 'static,
    {
        let (sender, receiver) = crossbeam_channel::bounded(64);
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();

        let thread = std::thread::Builder::new()
            .name("rmi-f11-contact".into())
            .spawn(move || {
                reader_loop(sensor, source, sender, control_rx, stop_clone);
            })
            .map_err(|e| RmiError::transport(0, format!("failed to spawn reader thread: {e}")))?;

        Ok(ContactStream {
            receiver,
            controls: control_tx,
            stop_flag,
            thread: Some(thread),
        })
    }

    /// Receive the next contact frame (blocks until available).
    pub fn recv(&self) -> Result<ContactFrame> {
        self.receiver.recv().map_err(|_| RmiError::StreamStopped)
    }

    /// Try to receive a contact frame without blocking.
    pub fn try_recv(&self) -> Option<ContactFrame> {
        self.receiver.try_recv().ok()
    }

    /// Receive a contact frame with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ContactFrame> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => RmiError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => RmiError::StreamStopped,
        })
    }

    pub fn set_click_state(&self, clicked: bool) {
        let _ = self.controls.send(ControlMsg::Click(clicked));
    }

    pub fn set_touchpad_enabled(&self, enabled: bool) {
        let _ = self.controls.send(ControlMsg::Enabled(enabled));
    }

    pub fn notify_keyboard_activity(&self, timestamp_us: u64) {
        let _ = self.controls.send(ControlMsg::KeyboardActivity(timestamp_us));
    }

    /// Check if the stream is still active.
    pub fn is_active(&self) -> bool {
        !self.stop_flag.load(Ordering::Relaxed)
    }

    /// Stop the stream and wait for the reader thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ContactStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reader_loop<P: RegisterPort, S: AttentionSource>(
    mut sensor: TouchSensor<P>,
    mut source: S,
    sender: Sender<ContactFrame>,
    controls: Receiver<ControlMsg>,
    stop_flag: Arc<AtomicBool>,
) {
    log::info!("contact reader started");

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("contact reader stopping (stop flag set)");
            break;
        }

        while let Ok(msg) = controls.try_recv() {
            match msg {
                ControlMsg::Click(clicked) => sensor.set_click_state(clicked),
                ControlMsg::Enabled(enabled) => sensor.set_touchpad_enabled(enabled),
                ControlMsg::KeyboardActivity(ts) => sensor.notify_keyboard_activity(ts),
            }
        }

        // Bounded wait so the stop flag is checked periodically.
        let attention = match source.wait_attention(Duration::from_millis(100)) {
            Ok(Some(attention)) => attention,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("attention wait error: {e}");
                continue;
            }
        };

        let Some(frame) = sensor.on_attention(&attention.packet, attention.timestamp_us) else {
            log::trace!("frame suppressed");
            continue;
        };

        if let Err(e) = sender.try_send(frame) {
            match e {
                crossbeam_channel::TrySendError::Full(_) => {
                    log::trace!("contact channel full, dropping frame");
                }
                crossbeam_channel::TrySendError::Disconnected(_) => {
                    log::info!("contact channel disconnected, stopping reader");
                    break;
                }
            }
        }
    }
}
