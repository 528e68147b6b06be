//! Unified error types for the Pochtomat firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's error handling uniform.  All variants are `Copy`
//! so they can be passed through the scheduler and logged without
//! allocation.  None of them are fatal except [`PeripheralError`], which
//! only occurs during boot.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The network link is down or could not be provisioned.
    Link(LinkError),
    /// The registration exchange did not yield an identity.
    Registration(RegistrationError),
    /// The persistent backend session failed.
    Session(SessionError),
    /// A non-volatile store could not be read or written.
    Storage(StorageError),
    /// An inbound payload could not be decoded.
    Payload(PayloadError),
    /// Peripheral initialisation failed (fatal at boot).
    Peripheral(PeripheralError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Registration(e) => write!(f, "registration: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Payload(e) => write!(f, "payload: {e}"),
            Self::Peripheral(e) => write!(f, "peripheral: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Station is not associated with an access point.
    Down,
    /// Provisioning (captive portal / stored credentials) did not connect.
    ProvisioningFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "network link down"),
            Self::ProvisioningFailed => write!(f, "link provisioning failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Registration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// Request could not be sent or no response arrived in time.
    Transport,
    /// Backend answered with something other than 201 Created.
    UnexpectedStatus(u16),
    /// Response body was not a non-negative decimal integer.
    MalformedBody,
    /// Request body could not be serialised.
    Encode,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "request failed or timed out"),
            Self::UnexpectedStatus(code) => write!(f, "unexpected HTTP status {code}"),
            Self::MalformedBody => write!(f, "response body is not a device id"),
            Self::Encode => write!(f, "request body encoding failed"),
        }
    }
}

impl From<RegistrationError> for Error {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Connect handshake failed or timed out.
    ConnectFailed,
    /// Operation requires an open connection but none is present.
    NotConnected,
    /// A frame could not be written to the connection.
    SendFailed,
    /// Peer closed the connection or the transport reported an error.
    Closed,
    /// No liveness response within the dead-session window.
    HeartbeatTimeout,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::SendFailed => write!(f, "send failed"),
            Self::Closed => write!(f, "connection closed"),
            Self::HeartbeatTimeout => write!(f, "heartbeat timeout"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key / file does not exist.
    NotFound,
    /// Access outside the fixed region bounds.
    OutOfBounds,
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the backend.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::OutOfBounds => write!(f, "access out of bounds"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Payload is empty or whitespace only.
    Empty,
    /// Payload looked like JSON but did not parse.
    Malformed,
    /// Payload parsed but named no known command.
    UnknownCommand,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty payload"),
            Self::Malformed => write!(f, "malformed payload"),
            Self::UnknownCommand => write!(f, "unknown command"),
        }
    }
}

impl From<PayloadError> for Error {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

// ---------------------------------------------------------------------------
// Peripheral errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralError {
    /// OLED controller did not acknowledge on I2C.
    DisplayInitFailed,
    /// GPIO configuration failed (ESP-IDF return code).
    GpioConfigFailed(i32),
    /// LEDC timer or channel configuration failed.
    PwmInitFailed(i32),
}

impl fmt::Display for PeripheralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisplayInitFailed => write!(f, "display init failed"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::PwmInitFailed(rc) => write!(f, "LEDC config failed (rc={rc})"),
        }
    }
}

impl From<PeripheralError> for Error {
    fn from(e: PeripheralError) -> Self {
        Self::Peripheral(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_errors_convert_into_error() {
        let e: Error = SessionError::HeartbeatTimeout.into();
        assert_eq!(e, Error::Session(SessionError::HeartbeatTimeout));

        let e: Error = RegistrationError::UnexpectedStatus(500).into();
        assert!(matches!(
            e,
            Error::Registration(RegistrationError::UnexpectedStatus(500))
        ));
    }

    #[test]
    fn display_includes_subsystem_prefix() {
        let e = Error::from(StorageError::NotFound);
        assert_eq!(format!("{e}"), "storage: not found");

        let e = Error::from(RegistrationError::UnexpectedStatus(403));
        assert_eq!(format!("{e}"), "registration: unexpected HTTP status 403");
    }
}
