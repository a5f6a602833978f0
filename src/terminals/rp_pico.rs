//! Raspberry Pi Pico terminal implementation using UART.
//!
//! Provides a [`Terminal`](crate::Terminal) for the RP2040's UART
//! peripherals, for use with a serial terminal program like minicom,
//! screen or PuTTY. The RP2040 timer doubles as the millisecond clock the
//! editor needs for paste detection, and a polled read backs
//! [`probe`](crate::probe).
//!
//! # Examples
//!
//! ```no_run
//! use rawline::terminals::rp_pico::UartTerminal;
//!
//! // Assuming pac, pins, clocks and a configured uart0 at 115200 8N1...
//! # fn demo(uart0: (), timer: ()) {
//! // let terminal = UartTerminal::new(uart0, timer);
//! # }
//! ```

use embedded_io::{Read as EmbeddedRead, Write as EmbeddedWrite};
use rp2040_hal::timer::Timer;
pub use rp2040_hal::uart::{DataBits, Enabled, StopBits, UartDevice, UartPeripheral, ValidUartPinout};

use crate::{Error, Result, Terminal};

/// UART terminal for the Raspberry Pi Pico.
///
/// # Type Parameters
///
/// * `D` - The UART device (typically `pac::UART0` or `UART1`)
/// * `P` - The pins routed to TX/RX
pub struct UartTerminal<D: UartDevice, P: ValidUartPinout<D>> {
    uart: UartPeripheral<Enabled, D, P>,
    timer: Timer,
}

impl<D: UartDevice, P: ValidUartPinout<D>> UartTerminal<D, P> {
    /// Wrap a configured UART peripheral and the system timer.
    pub fn new(uart: UartPeripheral<Enabled, D, P>, timer: Timer) -> Self {
        Self { uart, timer }
    }

    fn read_byte_blocking(&mut self) -> Result<u8> {
        let mut buf = [0u8];
        self.uart.read_exact(&mut buf).map_err(|_| Error::Io("UART read failed"))?;
        Ok(buf[0])
    }

    fn micros(&self) -> u64 {
        self.timer.get_counter().ticks()
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> Terminal for UartTerminal<D, P> {
    fn read_byte(&mut self) -> Result<u8> {
        self.read_byte_blocking()
    }

    fn read_byte_timeout(&mut self, timeout_ms: u32) -> Result<Option<u8>> {
        let deadline = self.micros() + u64::from(timeout_ms) * 1_000;
        while self.micros() < deadline {
            if self.uart.uart_is_readable() {
                return self.read_byte_blocking().map(Some);
            }
        }
        Ok(None)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.uart.write_all(data).map_err(|_| Error::Io("UART write failed"))
    }

    fn flush(&mut self) -> Result<()> {
        self.uart.flush().map_err(|_| Error::Io("UART flush failed"))
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        // UART is always in "raw" mode
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        // UART is always in "raw" mode
        Ok(())
    }

    fn now_millis(&mut self) -> u64 {
        self.micros() / 1_000
    }
}
