//! [`TargetInterface`] on top of the OpenOCD TCL-RPC server.
//!
//! OpenOCD owns the JTAG adapter, this only sends it TCL commands. Every
//! command and every response is terminated by `0x1a`.

use std::{
    io::{self, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use lpc32xx_init::{CoprocessorRegister, Error, TargetInterface};

const TERMINATOR: u8 = 0x1a;

/// Errors talking to OpenOCD.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum OpenOcdError {
    /// Could not connect to OpenOCD at {address}.
    Connect { address: String, source: io::Error },

    /// Communication with OpenOCD failed.
    Io(#[from] io::Error),

    /// OpenOCD closed the connection.
    ConnectionClosed,

    /// OpenOCD answered '{command}' with '{response}'.
    UnexpectedResponse { command: String, response: String },

    /// EmbeddedICE register {0} has no OpenOCD name.
    UnknownIceBreakerRegister(u8),
}

/// OpenOCD's name of an EmbeddedICE register, by hardware index.
pub fn ice_breaker_register_name(index: u8) -> Option<&'static str> {
    let name = match index {
        0 => "debug_ctrl",
        1 => "debug_status",
        2 => "vector_catch",
        4 => "comms_ctrl",
        5 => "comms_data",
        _ => return None,
    };

    Some(name)
}

/// A connection to the OpenOCD TCL-RPC server.
#[derive(Debug)]
pub struct OpenOcdInterface<S = TcpStream> {
    stream: S,
    /// Bytes received after the last terminator.
    pending: Vec<u8>,
}

impl OpenOcdInterface<TcpStream> {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, OpenOcdError> {
        let address = format!("{host}:{port}");
        let connect_error = |source| OpenOcdError::Connect {
            address: address.clone(),
            source,
        };

        let socket_address = address
            .to_socket_addrs()
            .map_err(connect_error)?
            .next()
            .ok_or_else(|| {
                connect_error(io::Error::new(
                    io::ErrorKind::NotFound,
                    "host name did not resolve",
                ))
            })?;

        let socket = TcpStream::connect_timeout(&socket_address, timeout).map_err(connect_error)?;
        socket.set_read_timeout(Some(timeout))?;
        socket.set_write_timeout(Some(timeout))?;
        socket.set_nodelay(true)?;

        tracing::info!("Connected to OpenOCD at {address}");

        Ok(Self::new(socket))
    }
}

impl<S: Read + Write> OpenOcdInterface<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    /// Run a TCL command and return its result, without the terminator.
    pub fn command(&mut self, command: &str) -> Result<String, OpenOcdError> {
        tracing::trace!("> {command}");

        let mut packet = Vec::with_capacity(command.len() + 1);
        packet.extend_from_slice(command.as_bytes());
        packet.push(TERMINATOR);
        self.stream.write_all(&packet)?;
        self.stream.flush()?;

        let response = self.read_response()?;
        tracing::trace!("< {response}");

        Ok(response)
    }

    fn read_response(&mut self) -> Result<String, OpenOcdError> {
        loop {
            if let Some(end) = self.pending.iter().position(|&b| b == TERMINATOR) {
                let response: Vec<u8> = self.pending.drain(..=end).take(end).collect();
                return Ok(String::from_utf8_lossy(&response).trim().to_string());
            }

            let mut buffer = [0; 512];
            let read = self.stream.read(&mut buffer)?;
            if read == 0 {
                return Err(OpenOcdError::ConnectionClosed);
            }
            self.pending.extend_from_slice(&buffer[..read]);
        }
    }

    /// Run a command that prints nothing when it succeeds.
    fn command_silent(&mut self, command: &str) -> Result<(), OpenOcdError> {
        let response = self.command(command)?;

        if response.is_empty() {
            Ok(())
        } else {
            Err(unexpected(command, response))
        }
    }

    /// Run a command printing a single number, possibly after a `name:` prefix.
    fn command_value(&mut self, command: &str) -> Result<u32, OpenOcdError> {
        let response = self.command(command)?;

        parse_value(&response).ok_or_else(|| unexpected(command, response))
    }
}

fn unexpected(command: &str, response: String) -> OpenOcdError {
    OpenOcdError::UnexpectedResponse {
        command: command.to_string(),
        response,
    }
}

/// Parse the value out of `mdw`, `reg` and `arm mrc` output.
///
/// * `mdw`: `0x80000000: deadbeef`
/// * `reg`: `comms_data (/32): 0x00000000`
/// * `arm mrc`: `0x00051078` or `331896`
fn parse_value(response: &str) -> Option<u32> {
    match response.rsplit_once(':') {
        Some((prefix, value)) => {
            let value = value.split_whitespace().next()?;
            if prefix.trim_start().starts_with("0x") && !value.starts_with("0x") {
                // mdw prints the data without a prefix
                u32::from_str_radix(value, 16).ok()
            } else {
                parse_int::parse(value).ok()
            }
        }
        None => parse_int::parse(response.trim()).ok(),
    }
}

fn interface_error(operation: String) -> impl FnOnce(OpenOcdError) -> Error {
    move |error| Error::interface(operation, error)
}

impl<S: Read + Write> TargetInterface for OpenOcdInterface<S> {
    fn halt_and_hold(&mut self, mode: u32) -> Result<(), Error> {
        // OpenOCD halts at the reset vector, there is no other boot mode to select.
        tracing::debug!("Resetting into halt, boot mode {mode}");
        self.command("reset halt")
            .map(drop)
            .map_err(interface_error("reset and halt the target".into()))
    }

    fn read_word_32(&mut self, address: u32) -> Result<u32, Error> {
        self.command_value(&format!("mdw {address:#010x}"))
            .map_err(interface_error(format!("read {address:#010x}")))
    }

    fn write_word_32(&mut self, address: u32, value: u32) -> Result<(), Error> {
        self.command_silent(&format!("mww {address:#010x} {value:#010x}"))
            .map_err(interface_error(format!("write {address:#010x}")))
    }

    fn delay(&mut self, duration: Duration) -> Result<(), Error> {
        std::thread::sleep(duration);
        Ok(())
    }

    fn read_coprocessor(&mut self, register: CoprocessorRegister) -> Result<u32, Error> {
        let CoprocessorRegister {
            coprocessor,
            opcode1,
            crn,
            crm,
            opcode2,
        } = register;

        self.command_value(&format!(
            "arm mrc {coprocessor} {opcode1} {crn} {crm} {opcode2}"
        ))
        .map_err(interface_error(format!("read {register}")))
    }

    fn write_coprocessor(&mut self, register: CoprocessorRegister, value: u32) -> Result<(), Error> {
        let CoprocessorRegister {
            coprocessor,
            opcode1,
            crn,
            crm,
            opcode2,
        } = register;

        self.command_silent(&format!(
            "arm mcr {coprocessor} {opcode1} {crn} {crm} {opcode2} {value:#010x}"
        ))
        .map_err(interface_error(format!("write {register}")))
    }

    fn read_ice_breaker(&mut self, index: u8) -> Result<u32, Error> {
        let operation = format!("read EmbeddedICE register {index}");

        let Some(name) = ice_breaker_register_name(index) else {
            return Err(interface_error(operation)(
                OpenOcdError::UnknownIceBreakerRegister(index),
            ));
        };

        // `force` reads the register from the target instead of OpenOCD's cache.
        self.command_value(&format!("reg {name} force"))
            .map_err(interface_error(operation))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.stream
            .flush()
            .map_err(|error| Error::interface("flush the connection", error))
    }
}
