// Terminal implementations for different platforms

#[cfg(all(unix, feature = "std"))]
mod unix;

#[cfg(all(unix, feature = "std"))]
pub use unix::StdioTerminal;

#[cfg(feature = "rp-pico")]
pub mod rp_pico;

#[cfg(feature = "rp-pico")]
pub use rp_pico::UartTerminal;
