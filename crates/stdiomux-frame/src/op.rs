//! Frame operation codes.
//!
//! The opcode occupies the top 4 bits of the first header word, so codes
//! range over 0..=15. Codes 1-8 are assigned; the rest are carried through
//! as [`Op::Unknown`] and ignored by sessions.

use std::fmt;

/// Operation carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Session start; payload is the sender's hello arguments.
    Hello,
    /// Open a stream. The dialer chooses the stream id.
    Dial,
    /// Dialer pushes bytes to a stream it opened.
    SendToServer,
    /// Acceptor pushes bytes back to the dialer's stream.
    SendToClient,
    /// Dialer will no longer use the stream.
    CloseClientSide,
    /// Acceptor will no longer use the stream.
    CloseServerSide,
    /// Acceptor reports a failure on a dialed stream.
    ServerError,
    /// Dialer reports a failure on a stream it opened.
    ClientError,
    /// Unassigned opcode.
    Unknown(u8),
}

impl Op {
    /// Largest code that fits in the 4-bit field.
    pub const MAX_CODE: u8 = 0xF;

    pub fn from_code(code: u8) -> Self {
        match code {
            0x1 => Op::Hello,
            0x2 => Op::Dial,
            0x3 => Op::SendToServer,
            0x4 => Op::SendToClient,
            0x5 => Op::CloseClientSide,
            0x6 => Op::CloseServerSide,
            0x7 => Op::ServerError,
            0x8 => Op::ClientError,
            other => Op::Unknown(other & Self::MAX_CODE),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Op::Hello => 0x1,
            Op::Dial => 0x2,
            Op::SendToServer => 0x3,
            Op::SendToClient => 0x4,
            Op::CloseClientSide => 0x5,
            Op::CloseServerSide => 0x6,
            Op::ServerError => 0x7,
            Op::ClientError => 0x8,
            Op::Unknown(code) => code & Self::MAX_CODE,
        }
    }

    /// Human-readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Op::Hello => "hello",
            Op::Dial => "dial",
            Op::SendToServer => "send-to-server",
            Op::SendToClient => "send-to-client",
            Op::CloseClientSide => "close-client",
            Op::CloseServerSide => "close-server",
            Op::ServerError => "server-error",
            Op::ClientError => "client-error",
            Op::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let assigned = [
            (Op::Hello, 1),
            (Op::Dial, 2),
            (Op::SendToServer, 3),
            (Op::SendToClient, 4),
            (Op::CloseClientSide, 5),
            (Op::CloseServerSide, 6),
            (Op::ServerError, 7),
            (Op::ClientError, 8),
        ];
        for (op, code) in assigned {
            assert_eq!(op.code(), code);
            assert_eq!(Op::from_code(code), op);
        }
    }

    #[test]
    fn unassigned_codes_are_unknown() {
        assert_eq!(Op::from_code(0), Op::Unknown(0));
        assert_eq!(Op::from_code(0xF), Op::Unknown(0xF));
        assert_eq!(Op::Unknown(9).code(), 9);
        assert_eq!(Op::Unknown(9).to_string(), "unknown");
    }

    #[test]
    fn names() {
        assert_eq!(Op::SendToServer.to_string(), "send-to-server");
        assert_eq!(Op::CloseClientSide.to_string(), "close-client");
    }
}
