//! Modbus TCP client for inverter power readings
//!
//! This module provides async Modbus TCP communication with SMA-style
//! inverters and meters, plus decoding of the power register block
//! including the vendor "not a number" markers.

use crate::config::RegisterFormat;
use crate::error::{Result, SwitcherError};
use crate::logging::get_logger;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::client::tcp;
use tokio_modbus::prelude::*;

/// SMA marker for an unavailable U16 value
pub const NAN_U16: u16 = 0xFFFF;
/// SMA marker for an unavailable S16 value
pub const NAN_S16: u16 = 0x8000;
/// SMA marker for an unavailable U32 value
pub const NAN_U32: u32 = 0xFFFF_FFFF;
/// SMA marker for an unavailable S32 value
pub const NAN_S32: u32 = 0x8000_0000;

/// Modbus TCP client
pub struct ModbusClient {
    /// Modbus TCP client connection
    client: Option<tokio_modbus::client::Context>,

    /// Remote host name or address
    host: String,

    /// Remote TCP port
    port: u16,

    /// Connection timeout
    connection_timeout: Duration,

    /// Operation timeout
    operation_timeout: Duration,

    /// Logger
    logger: crate::logging::StructuredLogger,
}

impl ModbusClient {
    /// Create a new Modbus client
    pub fn new(host: &str, port: u16) -> Self {
        let logger = get_logger("modbus");
        Self {
            client: None,
            host: host.to_string(),
            port,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(2),
            logger,
        }
    }

    /// Override connect and operation timeouts
    pub fn with_timeouts(mut self, connection: Duration, operation: Duration) -> Self {
        self.connection_timeout = connection;
        self.operation_timeout = operation;
        self
    }

    /// Connect to the Modbus server
    pub async fn connect(&mut self) -> Result<()> {
        let address = format!("{}:{}", self.host, self.port);

        self.logger
            .debug(&format!("Connecting to Modbus server at {}", address));

        let socket_addr = match timeout(self.connection_timeout, resolve(&address)).await {
            Ok(resolved) => resolved?,
            Err(_) => return Err(SwitcherError::timeout("Address resolution timeout")),
        };

        match timeout(self.connection_timeout, tcp::connect(socket_addr)).await {
            Ok(Ok(client)) => {
                self.client = Some(client);
                self.logger.debug("Connected to Modbus server");
                Ok(())
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to connect to Modbus server {}: {}", address, e);
                self.logger.warn(&error_msg);
                Err(SwitcherError::modbus(error_msg))
            }
            Err(_) => {
                let error_msg = format!("Connection timeout to {}", address);
                self.logger.warn(&error_msg);
                Err(SwitcherError::timeout(error_msg))
            }
        }
    }

    /// Disconnect from the Modbus server
    pub fn disconnect(&mut self) {
        if self.client.take().is_some() {
            self.logger.trace("Disconnected from Modbus server");
        }
    }

    /// Read holding registers
    pub async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>> {
        let timeout_duration = self.operation_timeout;

        // Log before borrowing client
        self.logger.trace(&format!(
            "Reading {} registers from address {} on unit {}",
            count, address, unit_id
        ));

        let client = self.get_client()?;
        client.set_slave(Slave(unit_id));
        let request = client.read_holding_registers(address, count);

        match timeout(timeout_duration, request).await {
            Ok(Ok(Ok(response))) => {
                self.logger
                    .trace(&format!("Read {} registers: {:?}", response.len(), response));
                Ok(response)
            }
            Ok(Ok(Err(exception))) => Err(SwitcherError::modbus(format!(
                "Modbus exception reading register {}: {:?}",
                address, exception
            ))),
            Ok(Err(e)) => Err(SwitcherError::modbus(format!(
                "Failed to read holding registers: {}",
                e
            ))),
            Err(_) => Err(SwitcherError::timeout("Read operation timeout")),
        }
    }

    /// Get client reference or error if not connected
    fn get_client(&mut self) -> Result<&mut tokio_modbus::client::Context> {
        self.client
            .as_mut()
            .ok_or_else(|| SwitcherError::modbus("Not connected to Modbus server"))
    }
}

async fn resolve(address: &str) -> Result<SocketAddr> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }
    tokio::net::lookup_host(address)
        .await
        .map_err(|e| SwitcherError::modbus(format!("Invalid socket address {}: {}", address, e)))?
        .next()
        .ok_or_else(|| SwitcherError::modbus(format!("Invalid socket address {}", address)))
}

/// Decode a power value in Watts from a register block (big-endian words)
///
/// Vendor NaN markers and negative readings decode to 0 W.
pub fn decode_power_watts(registers: &[u16], format: RegisterFormat) -> Result<u32> {
    let needed = format.word_count() as usize;
    if registers.len() < needed {
        return Err(SwitcherError::modbus(format!(
            "Insufficient registers for {:?}: got {}, need {}",
            format,
            registers.len(),
            needed
        )));
    }

    let watts = match format {
        RegisterFormat::U16 => {
            let raw = registers[0];
            if raw == NAN_U16 { 0 } else { u32::from(raw) }
        }
        RegisterFormat::S16 => {
            let raw = registers[0];
            if raw == NAN_S16 {
                0
            } else {
                u32::try_from(raw as i16).unwrap_or(0)
            }
        }
        RegisterFormat::U32 => {
            let raw = join_words(registers[0], registers[1]);
            if raw == NAN_U32 { 0 } else { raw }
        }
        RegisterFormat::S32 => {
            let raw = join_words(registers[0], registers[1]);
            if raw == NAN_S32 {
                0
            } else {
                u32::try_from(raw as i32).unwrap_or(0)
            }
        }
    };
    Ok(watts)
}

fn join_words(high: u16, low: u16) -> u32 {
    (u32::from(high) << 16) | u32::from(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_s32() {
        assert_eq!(
            decode_power_watts(&[0x0000, 0x05DC], RegisterFormat::S32).unwrap(),
            1500
        );
        assert_eq!(
            decode_power_watts(&[0x0001, 0x0000], RegisterFormat::S32).unwrap(),
            65536
        );
    }

    #[test]
    fn test_decode_nan_markers_read_zero() {
        assert_eq!(
            decode_power_watts(&[0x8000, 0x0000], RegisterFormat::S32).unwrap(),
            0
        );
        assert_eq!(
            decode_power_watts(&[0xFFFF, 0xFFFF], RegisterFormat::U32).unwrap(),
            0
        );
        assert_eq!(decode_power_watts(&[0xFFFF], RegisterFormat::U16).unwrap(), 0);
        assert_eq!(decode_power_watts(&[0x8000], RegisterFormat::S16).unwrap(), 0);
    }

    #[test]
    fn test_decode_negative_reads_zero() {
        // -100 W as S32
        assert_eq!(
            decode_power_watts(&[0xFFFF, 0xFF9C], RegisterFormat::S32).unwrap(),
            0
        );
        assert_eq!(decode_power_watts(&[0xFF9C], RegisterFormat::S16).unwrap(), 0);
    }

    #[test]
    fn test_decode_insufficient_registers() {
        assert!(decode_power_watts(&[0x0001], RegisterFormat::S32).is_err());
        assert!(decode_power_watts(&[], RegisterFormat::U16).is_err());
    }

    #[test]
    fn test_modbus_client_creation() {
        let mut client = ModbusClient::new("127.0.0.1", 502);
        assert!(client.get_client().is_err());
    }
}
