//! Native JACK frame source.
//!
//! The JACK process callback owns the bridge's `ProducerCallback`: it
//! gathers the input port buffers into a stack array and hands them over
//! as one `FrameBlock`. Nothing on that path allocates or locks.
//!
//! ```text
//! JACK RT thread ── in_1..in_C ──► ProducerCallback ──► ring buffer
//! JACK shutdown  ───────────────► TerminationHandle (HostShutdown)
//! ```

use jack::{AsyncClient, AudioIn, Client, ClientOptions, ClientStatus, Control, Port, ProcessScope};

use audio_bridge_core::models::device_info::{EndpointInfo, EndpointKind};
use audio_bridge_core::models::error::BridgeError;
use audio_bridge_core::models::run_report::TerminationReason;
use audio_bridge_core::pipeline::frame_block::{FrameBlock, MAX_CHANNELS};
use audio_bridge_core::pipeline::producer::ProducerCallback;
use audio_bridge_core::session::termination::TerminationHandle;
use audio_bridge_core::traits::frame_source::FrameSource;

use crate::{full_port_name, input_port_name};

/// JACK process handler. Owns the producer exclusively.
struct JackProcessor {
    ports: Vec<Port<AudioIn>>,
    callback: ProducerCallback,
}

impl jack::ProcessHandler for JackProcessor {
    fn process(&mut self, _client: &Client, ps: &ProcessScope) -> Control {
        let mut slices: [&[f32]; MAX_CHANNELS] = [&[]; MAX_CHANNELS];
        for (slot, port) in slices.iter_mut().zip(&self.ports) {
            *slot = port.as_slice(ps);
        }
        let channels = self.ports.len();
        self.callback
            .process(&FrameBlock::new(&slices[..channels], ps.n_frames() as usize));
        Control::Continue
    }
}

/// JACK notification handler
struct JackNotifications {
    termination: TerminationHandle,
}

impl jack::NotificationHandler for JackNotifications {
    unsafe fn shutdown(&mut self, _status: ClientStatus, reason: &str) {
        log::error!("JACK server shut down: {}", reason);
        self.termination.terminate(TerminationReason::HostShutdown);
    }

    fn sample_rate(&mut self, _client: &Client, srate: jack::Frames) -> Control {
        log::info!("JACK sample rate changed to: {}", srate);
        Control::Continue
    }

    fn xrun(&mut self, _client: &Client) -> Control {
        log::warn!("JACK xrun detected");
        Control::Continue
    }
}

/// A JACK client with one input port per bridged channel.
///
/// The client is opened by [`JackSource::open`] so the server's sample rate
/// is known before the session starts; ports are registered and the
/// client activated in [`FrameSource::activate`].
pub struct JackSource {
    client_name: String,
    channels: usize,
    sample_rate: u32,
    buffer_size: u32,
    client: Option<Client>,
    active: Option<AsyncClient<JackNotifications, JackProcessor>>,
}

impl JackSource {
    /// Connect to a running JACK server (never starts one).
    pub fn open(client_name: &str, channels: usize) -> Result<Self, BridgeError> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(BridgeError::ConfigurationFailed(format!(
                "unsupported channel count: {}",
                channels
            )));
        }

        // JACK may rename the client if the name is taken
        let (client, _status) = Client::new(client_name, ClientOptions::NO_START_SERVER)
            .map_err(|e| BridgeError::ClientFailed(format!("failed to create JACK client: {}", e)))?;
        let client_name = client.name().to_string();
        let sample_rate = client.sample_rate() as u32;
        let buffer_size = client.buffer_size();

        log::info!(
            "JACK client '{}' created (sample rate: {}Hz, buffer: {} frames)",
            client_name,
            sample_rate,
            buffer_size
        );

        Ok(Self {
            client_name,
            channels,
            sample_rate,
            buffer_size,
            client: Some(client),
            active: None,
        })
    }

    /// Name the server assigned to this client.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl FrameSource for JackSource {
    fn activate(
        &mut self,
        callback: ProducerCallback,
        termination: TerminationHandle,
    ) -> Result<(), BridgeError> {
        let client = self
            .client
            .take()
            .ok_or_else(|| BridgeError::InvalidState("JACK client already active".into()))?;

        let mut ports = Vec::with_capacity(self.channels);
        for index in 0..self.channels {
            let name = input_port_name(index);
            let port = client.register_port(&name, AudioIn::default()).map_err(|e| {
                BridgeError::PortRegistrationFailed(format!("{}: {}", name, e))
            })?;
            log::debug!("Registered {}", full_port_name(&self.client_name, &name));
            ports.push(port);
        }

        let processor = JackProcessor { ports, callback };
        let notifications = JackNotifications { termination };
        let active = client
            .activate_async(notifications, processor)
            .map_err(|e| BridgeError::ClientFailed(format!("failed to activate JACK client: {}", e)))?;

        log::info!(
            "JACK client '{}' active with {} input ports",
            self.client_name,
            self.channels
        );
        self.active = Some(active);
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), BridgeError> {
        if let Some(active) = self.active.take() {
            active
                .deactivate()
                .map_err(|e| BridgeError::ClientFailed(format!("failed to deactivate JACK client: {}", e)))?;
            log::info!("JACK client '{}' closed", self.client_name);
        }
        // dropping an inactive client closes it
        self.client = None;
        Ok(())
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }

    fn name(&self) -> &str {
        &self.client_name
    }

    fn info(&self) -> EndpointInfo {
        EndpointInfo::new(self.client_name.clone(), "JACK client", EndpointKind::Host)
    }
}
