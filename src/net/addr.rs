//! Decoding for kernel connection-table addresses and states.
//!
//! The connection tables encode an IPv4 endpoint as eight hex digits with
//! the octets stored least-significant first, a colon, and four hex digits
//! of port. State is a two-hex-digit code. Both decoders pass unknown or
//! malformed input through unchanged; callers must tolerate the raw form.

/// Decodes `XXXXXXXX:PPPP` into dotted-decimal `a.b.c.d:port`.
///
/// Returns the input unchanged when it does not match the expected
/// 8-hex-digit address + hex port shape (IPv6 rows, truncated fields).
pub fn decode_address(raw: &str) -> String {
    let Some((ip_hex, port_hex)) = raw.split_once(':') else {
        return raw.to_string();
    };
    if ip_hex.len() != 8 || !ip_hex.is_ascii() {
        return raw.to_string();
    }

    // Octets are stored least-significant first: hex pairs read back to front.
    let (Ok(a), Ok(b), Ok(c), Ok(d)) = (
        u8::from_str_radix(&ip_hex[6..8], 16),
        u8::from_str_radix(&ip_hex[4..6], 16),
        u8::from_str_radix(&ip_hex[2..4], 16),
        u8::from_str_radix(&ip_hex[0..2], 16),
    ) else {
        return raw.to_string();
    };
    let Ok(port) = u16::from_str_radix(port_hex, 16) else {
        return raw.to_string();
    };

    format!("{a}.{b}.{c}.{d}:{port}")
}

/// Maps a two-hex-digit connection state code to its symbolic name.
/// Unknown codes pass through unchanged.
pub fn decode_state(code: &str) -> String {
    let name = match code {
        "01" => "ESTABLISHED",
        "02" => "SYN_SENT",
        "03" => "SYN_RECV",
        "04" => "FIN_WAIT1",
        "05" => "FIN_WAIT2",
        "06" => "TIME_WAIT",
        "07" => "CLOSE",
        "08" => "CLOSE_WAIT",
        "09" => "LAST_ACK",
        "0A" => "LISTEN",
        "0B" => "CLOSING",
        other => other,
    };
    name.to_string()
}
