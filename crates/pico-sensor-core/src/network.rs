//! Waiting for the station interface to join the access point.

use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;
use log::info;

/// A station-mode network interface.
pub trait Station {
    /// The IPv4 address assigned to the interface, once associated and configured.
    fn ipv4_address(&mut self) -> Option<Ipv4Addr>;
}

/// Poll `station` until it reports an address, sleeping `interval_ms` between polls.
///
/// There is no timeout: if the access point never accepts us this waits forever.
pub async fn wait_for_address<S, D>(station: &mut S, delay: &mut D, interval_ms: u32) -> Ipv4Addr
where
    S: Station,
    D: DelayNs,
{
    loop {
        if let Some(address) = station.ipv4_address() {
            info!("Connected on: {}", address);
            return address;
        }
        info!("Connecting to Wi-Fi...");
        delay.delay_ms(interval_ms).await;
    }
}
