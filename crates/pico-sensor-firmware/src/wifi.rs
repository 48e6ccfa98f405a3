//! Wi-Fi station bring-up on esp-radio
//!
//! The controller is configured once and asked to connect once. Waiting for
//! association and DHCP is left to
//! [`pico_sensor_core::network::wait_for_address`], polling [`WifiStation`].

use core::net::Ipv4Addr;

use embassy_net::{Runner, Stack};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiError};
use log::info;
use pico_sensor_core::config::InternetConfig;
use pico_sensor_core::network::Station;

/// Put the controller in station mode and start associating with the access point.
pub fn start_station(
    controller: &mut WifiController<'static>,
    internet: &InternetConfig<'_>,
) -> Result<(), WifiError> {
    let client = ClientConfig::default()
        .with_ssid(internet.ssid.into())
        .with_password(internet.password.into());

    controller.set_config(&ModeConfig::Client(client))?;
    controller.start()?;
    info!("Wi-Fi started in station mode, joining {}", internet.ssid);

    controller.connect()
}

/// The station interface: the radio controller plus the IP stack on top of it.
///
/// Holding this keeps the controller alive for the lifetime of the firmware.
pub struct WifiStation {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl WifiStation {
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>) -> Self {
        Self { controller, stack }
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }
}

impl Station for WifiStation {
    fn ipv4_address(&mut self) -> Option<Ipv4Addr> {
        if !self.controller.is_connected().unwrap_or(false) {
            return None;
        }
        self.stack
            .config_v4()
            .map(|config| config.address.address())
    }
}

/// Network stack task
///
/// Runs the embassy-net event loop over the station interface.
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
