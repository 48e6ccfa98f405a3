//! MQTT publisher over rust-mqtt and an embassy-net TCP socket
//!
//! One client, one broker, no credentials, no TLS. The session is opened once
//! at startup and never re-established: if it drops, every later publish
//! fails and is logged by the loop.

use core::fmt::Write;
use core::net::Ipv4Addr;

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::Duration;
use log::info;
use pico_sensor_core::config::MqttConfig;
use pico_sensor_core::publish::{PublishError, Publisher};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;
use thiserror_no_std::Error;

const TCP_BUFFER_SIZE: usize = 1024;
const MQTT_BUFFER_SIZE: usize = 256;
const MAX_PROPERTIES: usize = 5;
const SOCKET_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("could not resolve broker host: {0:?}")]
    Dns(embassy_net::dns::Error),
    #[error("broker host has no IPv4 address")]
    NoAddress,
    #[error("TCP connect failed: {0:?}")]
    Tcp(embassy_net::tcp::ConnectError),
    #[error("broker refused connection: {0:?}")]
    Broker(ReasonCode),
}

/// Socket and client buffers. Large, so they live in a `StaticCell`.
pub struct SocketBuffers {
    tcp_rx: [u8; TCP_BUFFER_SIZE],
    tcp_tx: [u8; TCP_BUFFER_SIZE],
    mqtt_rx: [u8; MQTT_BUFFER_SIZE],
    mqtt_tx: [u8; MQTT_BUFFER_SIZE],
}

impl SocketBuffers {
    pub const fn new() -> Self {
        Self {
            tcp_rx: [0; TCP_BUFFER_SIZE],
            tcp_tx: [0; TCP_BUFFER_SIZE],
            mqtt_rx: [0; MQTT_BUFFER_SIZE],
            mqtt_tx: [0; MQTT_BUFFER_SIZE],
        }
    }
}

impl Default for SocketBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept an IPv4 literal directly, otherwise ask DNS.
async fn resolve(stack: Stack<'_>, host: &str) -> Result<IpAddress, ConnectError> {
    if let Ok(address) = host.parse::<Ipv4Addr>() {
        return Ok(IpAddress::Ipv4(address));
    }

    let addresses = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(ConnectError::Dns)?;
    addresses.first().copied().ok_or(ConnectError::NoAddress)
}

pub struct MqttPublisher<'a> {
    client: MqttClient<'a, TcpSocket<'a>, MAX_PROPERTIES, CountingRng>,
}

impl<'a> MqttPublisher<'a> {
    /// Open the TCP connection and complete the MQTT handshake.
    pub async fn connect(
        stack: Stack<'a>,
        buffers: &'a mut SocketBuffers,
        config: MqttConfig<'a>,
    ) -> Result<Self, ConnectError> {
        let SocketBuffers {
            tcp_rx,
            tcp_tx,
            mqtt_rx,
            mqtt_tx,
        } = buffers;

        let address = resolve(stack, config.broker).await?;
        info!("Connecting to MQTT broker {}:{}", address, config.port);

        let mut socket = TcpSocket::new(stack, tcp_rx, tcp_tx);
        socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));
        socket
            .connect((address, config.port))
            .await
            .map_err(ConnectError::Tcp)?;

        let mut client_config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        client_config.add_client_id(config.client_id);
        client_config.max_packet_size = MQTT_BUFFER_SIZE as u32;

        let mut client = MqttClient::<_, MAX_PROPERTIES, _>::new(
            socket,
            mqtt_tx,
            MQTT_BUFFER_SIZE,
            mqtt_rx,
            MQTT_BUFFER_SIZE,
            client_config,
        );
        client
            .connect_to_broker()
            .await
            .map_err(ConnectError::Broker)?;

        Ok(Self { client })
    }
}

fn publish_error(code: ReasonCode) -> PublishError {
    match code {
        ReasonCode::NetworkError => PublishError::Transport,
        other => {
            let mut reason = heapless::String::new();
            // Truncated reasons are still better than none
            let _ = write!(reason, "{:?}", other);
            PublishError::Rejected(reason)
        }
    }
}

impl Publisher for MqttPublisher<'_> {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), PublishError> {
        self.client
            .send_message(topic, payload, QualityOfService::QoS0, retain)
            .await
            .map_err(publish_error)
    }
}
