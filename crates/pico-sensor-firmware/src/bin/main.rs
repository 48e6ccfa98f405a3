#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

extern crate alloc;

use alloc::boxed::Box;
use embassy_executor::Spawner;
use embassy_net::StackResources;
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};
use static_cell::StaticCell;

use pico_sensor_core::app_state::{AppState, Hardware};
use pico_sensor_core::network::wait_for_address;
use pico_sensor_core::sensors::DHT11Sensor;
use pico_sensor_firmware::mqtt::{MqttPublisher, SocketBuffers};
use pico_sensor_firmware::wifi::{WifiStation, net_task, start_station};
use pico_sensor_firmware::wifi_secrets::CONFIG;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    error!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static SOCKET_BUFFERS: StaticCell<SocketBuffers> = StaticCell::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(log::LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // Wi-Fi
    let radio_init = Box::leak(Box::new(
        esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"),
    ));
    let (mut wifi_controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");
    start_station(&mut wifi_controller, &CONFIG.internet).expect("Failed to start Wi-Fi station");

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner).expect("Failed to spawn network task"));

    let mut station = WifiStation::new(wifi_controller, stack);
    wait_for_address(
        &mut station,
        &mut embassy_time::Delay,
        CONFIG.join_poll_interval_ms(),
    )
    .await;

    // Peripherals: DHT11 data line is open-drain with the pull-up holding it idle high
    let mut dht_pin = Flex::new(peripherals.GPIO0);
    dht_pin.apply_output_config(
        &OutputConfig::default()
            .with_drive_mode(DriveMode::OpenDrain)
            .with_pull(Pull::Up),
    );
    dht_pin.set_input_enable(true);
    dht_pin.set_output_enable(true);
    dht_pin.set_high();

    let hardware = Hardware {
        sensor: DHT11Sensor::new(dht_pin, Delay::new()),
        tilt: Input::new(peripherals.GPIO2, InputConfig::default()),
        mirror_led: Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default()),
        alert_led: Output::new(peripherals.GPIO6, Level::Low, OutputConfig::default()),
    };

    // MQTT
    let buffers = SOCKET_BUFFERS.init(SocketBuffers::new());
    let publisher = MqttPublisher::connect(station.stack(), buffers, CONFIG.mqtt)
        .await
        .expect("Failed to connect to MQTT broker");

    let mut app = AppState::start(hardware, publisher, CONFIG)
        .await
        .expect("Failed to clear retained message");

    app.run(&mut embassy_time::Delay).await
}
