/* ************************************************************************
*   File: telnet.rs                                     Part of CircleMUD *
*  Usage: Definitions for the TELNET protocol                             *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

pub const IAC: u8 = 255; /* interpret as command: */
pub const DONT: u8 = 254; /* you are not to use option */
pub const DO: u8 = 253; /* please, you use option */
pub const WONT: u8 = 252; /* I won't use option */
pub const WILL: u8 = 251; /* I will use option */
pub const SB: u8 = 250; /* interpret as subnegotiation */
pub const SE: u8 = 240; /* end sub negotiation */

/* telnet options */
pub const TELOPT_ECHO: u8 = 1; /* echo */

/* what the server sends to stop or resume the client's local echo */
pub fn echo_sequence(on: bool) -> [u8; 3] {
    [IAC, if on { WONT } else { WILL }, TELOPT_ECHO]
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
enum TelnetState {
    #[default]
    Data,
    Iac,
    /* waiting for the option byte of WILL/WONT/DO/DONT */
    Option,
    Sub,
    SubIac,
}

/*
 * Strips IAC sequences from the byte stream of one connection.  A
 * sequence may be split across reads, so the state survives calls.
 */
#[derive(Default)]
pub struct TelnetFilter {
    state: TelnetState,
}

impl TelnetFilter {
    pub fn new() -> TelnetFilter {
        TelnetFilter::default()
    }

    pub fn filter(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len());
        for &b in input {
            self.state = match (self.state, b) {
                (TelnetState::Data, IAC) => TelnetState::Iac,
                (TelnetState::Data, _) => {
                    out.push(b);
                    TelnetState::Data
                }
                /* escaped 255 is not text we can use */
                (TelnetState::Iac, IAC) => TelnetState::Data,
                (TelnetState::Iac, WILL | WONT | DO | DONT) => TelnetState::Option,
                (TelnetState::Iac, SB) => TelnetState::Sub,
                (TelnetState::Iac, _) => TelnetState::Data,
                (TelnetState::Option, _) => TelnetState::Data,
                (TelnetState::Sub, IAC) => TelnetState::SubIac,
                (TelnetState::Sub, _) => TelnetState::Sub,
                (TelnetState::SubIac, SE) => TelnetState::Data,
                (TelnetState::SubIac, _) => TelnetState::Sub,
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiation_is_removed() {
        let mut f = TelnetFilter::new();
        let mut input = vec![IAC, DO, TELOPT_ECHO];
        input.extend_from_slice(b"look");
        input.extend_from_slice(&[IAC, SB, 24, 0, b'x', IAC, SE]);
        input.extend_from_slice(b"\r\n");
        assert_eq!(f.filter(&input), b"look\r\n".to_vec());
    }

    #[test]
    fn sequences_split_across_reads() {
        let mut f = TelnetFilter::new();
        assert_eq!(f.filter(&[b'n', IAC]), b"n".to_vec());
        assert_eq!(f.filter(&[WONT]), Vec::<u8>::new());
        assert_eq!(f.filter(&[TELOPT_ECHO, b'o']), b"o".to_vec());
    }
}
