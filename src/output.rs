use crate::error::SinkError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam::channel::{bounded, Receiver, Sender};
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};

/// Stream parameters negotiated at open time. The engine always asks for
/// 44.1 kHz interleaved stereo PCM16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for SinkSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// Final consumer of rendered PCM16 frames, implemented per platform.
/// `write` may block under device backpressure but never indefinitely.
pub trait OutputSink: Send {
    fn open(&mut self, spec: SinkSpec) -> Result<(), SinkError>;
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError>;
    fn close(&mut self);
}

/// How long `write` waits on a full device ring before giving up.
const BACKPRESSURE_TIMEOUT: Duration = Duration::from_secs(5);
const BACKPRESSURE_POLL: Duration = Duration::from_millis(1);

/// Real audio output through cpal. `write` pushes decoded samples into a
/// lock-free ring; the device callback drains it, filling underruns with
/// silence. cpal streams are not `Send`, so the stream lives on its own
/// thread for the lifetime of the open sink.
pub struct CpalSink {
    ring: Option<Arc<ArrayQueue<f32>>>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalSink {
    pub fn new() -> Self {
        Self {
            ring: None,
            shutdown: None,
            thread: None,
        }
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for CpalSink {
    fn open(&mut self, spec: SinkSpec) -> Result<(), SinkError> {
        if self.ring.is_some() {
            return Ok(());
        }

        // One second of interleaved audio of headroom.
        let capacity = (spec.sample_rate as usize * spec.channels as usize).max(1024);
        let ring = Arc::new(ArrayQueue::new(capacity));
        let callback_ring = Arc::clone(&ring);

        let (ready_tx, ready_rx) = bounded::<Result<(), SinkError>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread = std::thread::Builder::new()
            .name("swingcue-output".into())
            .spawn(move || run_stream(spec, callback_ring, ready_tx, shutdown_rx))
            .map_err(|e| SinkError::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(
                    sample_rate = spec.sample_rate,
                    channels = spec.channels,
                    "output stream opened"
                );
                self.ring = Some(ring);
                self.shutdown = Some(shutdown_tx);
                self.thread = Some(thread);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(SinkError::Thread("output thread exited during open".into()))
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let ring = self.ring.as_ref().ok_or(SinkError::NotOpen)?;
        for pair in bytes.chunks_exact(2) {
            let mut sample = i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32767.0;
            let mut waited = Duration::ZERO;
            while let Err(rejected) = ring.push(sample) {
                sample = rejected;
                if waited >= BACKPRESSURE_TIMEOUT {
                    return Err(SinkError::Write(
                        "output ring stayed full past the backpressure timeout".into(),
                    ));
                }
                std::thread::sleep(BACKPRESSURE_POLL);
                waited += BACKPRESSURE_POLL;
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("output thread panicked during close");
            }
        }
        self.ring = None;
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_stream(
    spec: SinkSpec,
    ring: Arc<ArrayQueue<f32>>,
    ready_tx: Sender<Result<(), SinkError>>,
    shutdown_rx: Receiver<()>,
) {
    let stream = match build_stream(spec, ring) {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    // Hold the stream alive until close; dropping it here releases the
    // device on this thread.
    let _ = shutdown_rx.recv();
    drop(stream);
}

fn build_stream(spec: SinkSpec, ring: Arc<ArrayQueue<f32>>) -> Result<cpal::Stream, SinkError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(SinkError::NoDevice)?;
    let supported = device.default_output_config()?;

    let config = cpal::StreamConfig {
        channels: spec.channels,
        sample_rate: cpal::SampleRate(spec.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_typed::<f32>(&device, &config, ring)?,
        cpal::SampleFormat::I16 => build_typed::<i16>(&device, &config, ring)?,
        cpal::SampleFormat::U16 => build_typed::<u16>(&device, &config, ring)?,
        other => return Err(SinkError::UnsupportedFormat(format!("{other:?}"))),
    };

    stream.play()?;
    Ok(stream)
}

fn build_typed<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<ArrayQueue<f32>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for out in data.iter_mut() {
                let sample = ring.pop().unwrap_or(0.0);
                // Limiting and NaN protection before the hardware.
                let sample = if sample.is_finite() {
                    sample.clamp(-1.0, 1.0)
                } else {
                    0.0
                };
                *out = T::from_sample(sample);
            }
        },
        |err| error!("audio stream error: {err}"),
        None,
    )
}

/// Captures written bytes in memory. Used by the controller tests and any
/// headless host that wants the rendered PCM without a device.
pub struct MemorySink {
    data: Arc<Mutex<Vec<u8>>>,
    open: bool,
    fail_open: bool,
    fail_writes: Arc<AtomicBool>,
    spec: Option<SinkSpec>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(Vec::new())),
            open: false,
            fail_open: false,
            fail_writes: Arc::new(AtomicBool::new(false)),
            spec: None,
        }
    }

    /// A sink whose `open` always fails, for exercising initialization
    /// error paths.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new()
        }
    }

    /// Shared handle to the captured bytes; stays valid after the sink
    /// moves into the engine.
    pub fn buffer(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.data)
    }

    /// Switch that makes `write` reject frames while set, for exercising
    /// the write-error recovery path. Stays valid after the sink moves
    /// into the engine.
    pub fn write_failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_writes)
    }

    pub fn spec(&self) -> Option<SinkSpec> {
        self.spec
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for MemorySink {
    fn open(&mut self, spec: SinkSpec) -> Result<(), SinkError> {
        if self.fail_open {
            return Err(SinkError::NoDevice);
        }
        self.open = true;
        self.spec = Some(spec);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        if !self.open {
            return Err(SinkError::NotOpen);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SinkError::Write("injected write failure".into()));
        }
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_requires_open() {
        let mut sink = MemorySink::new();
        assert!(matches!(sink.write(&[0, 0]), Err(SinkError::NotOpen)));

        sink.open(SinkSpec::default()).expect("open should succeed");
        sink.write(&[1, 2, 3, 4]).expect("write should succeed");
        assert_eq!(sink.buffer().lock().unwrap().len(), 4);

        sink.close();
        assert!(matches!(sink.write(&[0, 0]), Err(SinkError::NotOpen)));
    }

    #[test]
    fn test_failing_sink_reports_no_device() {
        let mut sink = MemorySink::failing();
        assert!(matches!(
            sink.open(SinkSpec::default()),
            Err(SinkError::NoDevice)
        ));
    }

    #[test]
    fn test_write_failure_switch_toggles_rejection() {
        let mut sink = MemorySink::new();
        let switch = sink.write_failure_switch();
        sink.open(SinkSpec::default()).unwrap();

        switch.store(true, Ordering::SeqCst);
        assert!(matches!(sink.write(&[1, 2]), Err(SinkError::Write(_))));
        assert!(
            sink.buffer().lock().unwrap().is_empty(),
            "a rejected write must not land in the buffer"
        );

        switch.store(false, Ordering::SeqCst);
        sink.write(&[1, 2]).expect("writes should recover once the switch clears");
        assert_eq!(sink.buffer().lock().unwrap().len(), 2);
    }

    #[test]
    fn test_memory_sink_records_spec() {
        let mut sink = MemorySink::new();
        let spec = SinkSpec {
            sample_rate: 44100,
            channels: 2,
        };
        sink.open(spec).unwrap();
        assert_eq!(sink.spec(), Some(spec));
    }
}
