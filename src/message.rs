//! Wire format definitions
//!
//! Newline-delimited UTF-8 text. Server notices keep the `\r` after the
//! newline that existing clients already expect.

/// Line terminator for inbound messages
pub const DELIMITER: u8 = b'\n';

/// Private greeting sent to a newly accepted session
pub const WELCOME: &str = "Welcome to chat\n\r";

/// Broadcast to existing sessions when someone joins
pub const NEWCOMER: &str = "We have a newcomer\n\r";

/// Broadcast to remaining sessions when someone leaves
pub const ONE_LESS: &str = "We are one less\n\r";

/// Format an inbound line for rebroadcast
///
/// `line` still carries its delimiter, so the result is ready to write.
pub fn chat_line(peer: &str, line: &str) -> String {
    format!("{peer}: {line}")
}

/// Decode one raw inbound line
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_literals() {
        assert_eq!(WELCOME.as_bytes(), b"Welcome to chat\n\r");
        assert_eq!(NEWCOMER.as_bytes(), b"We have a newcomer\n\r");
        assert_eq!(ONE_LESS.as_bytes(), b"We are one less\n\r");
    }

    #[test]
    fn test_chat_line_prefixes_peer() {
        assert_eq!(
            chat_line("127.0.0.1:50000", "hello\n"),
            "127.0.0.1:50000: hello\n"
        );
    }

    #[test]
    fn test_decode_line_lossy() {
        assert_eq!(decode_line(b"hi\n"), "hi\n");
        assert_eq!(decode_line(b"a\xffb\n"), "a\u{FFFD}b\n");
    }
}
