//! # Scan Error Taxonomy
//!
//! Every failure that can escape the discovery engine is one of the five
//! variants below. Per-probe failures never surface here: they are retried
//! inside the ping manager and collapse into an unsuccessful `PingResult`.

use std::io;

use thiserror::Error;

/// Terminal failure of a discovery operation.
///
/// Never retried by the engine itself. Retrying a whole scan is the caller's call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanError {
    /// The local machine's routable IPv4 address could not be determined.
    #[error("network interface error - could not determine local IP address")]
    NetworkInterfaceError,

    /// An IP address or subnet base was malformed.
    #[error("invalid subnet configuration")]
    InvalidSubnet,

    /// Opening the raw ICMP socket was refused by the operating system.
    #[error("permission denied - ICMP requires elevated privileges")]
    PermissionDenied,

    /// A probe ran out of time (or the network reported time exceeded).
    #[error("network timeout exceeded")]
    TimeoutExceeded,

    /// Any other failure of the OS or the network stack.
    #[error("system error occurred")]
    SystemError,
}

impl ScanError {
    /// Operator facing advice printed next to the error message.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NetworkInterfaceError => "Check your network connection and try again",
            Self::InvalidSubnet => "Ensure you have a valid IP address assigned",
            Self::PermissionDenied => {
                "Try running with sudo, or grant the binary CAP_NET_RAW (setcap cap_net_raw+ep)"
            }
            Self::TimeoutExceeded => "Network may be slow or unreachable",
            Self::SystemError => "Check system logs for more details",
        }
    }

    /// Process exit status used by the command line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NetworkInterfaceError => 1,
            Self::InvalidSubnet => 2,
            Self::PermissionDenied => 3,
            Self::TimeoutExceeded => 4,
            Self::SystemError => 5,
        }
    }

    /// Classifies a failure to open a raw socket.
    ///
    /// Missing privilege is kept apart from every other cause because it is the
    /// one failure an operator can fix directly.
    pub fn from_socket_error(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::SystemError,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
