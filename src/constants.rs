/* ************************************************************************
*   File: constants.rs                                  Part of CircleMUD *
*  Usage: Numeric and string contants used by the MUD                     *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

pub const TICKMUD_VERSION: &str = concat!("TickMUD, version ", env!("CARGO_PKG_VERSION"), ", based on CircleMUD 3.1");

/* strings corresponding to ordinals/bitvectors in structs.rs ***********/

/* RoomFlags, in bit order */
pub const ROOM_BITS: [&str; 6] = ["DARK", "NO_MOB", "INDOORS", "PEACEFUL", "DEATH", "PRIVATE"];

/* AffectFlags, in bit order */
pub const AFFECTED_BITS: [&str; 15] = [
    "INVIS",
    "DET-INVIS",
    "HASTE",
    "BLIND",
    "POISON",
    "SLEEP",
    "CURSE",
    "FIRE-SHIELD",
    "ACID-SHEATH",
    "MINOR-GLOBE",
    "FEEBLEMIND",
    "PROT-EVIL",
    "PROT-GOOD",
    "ENDURE-ELEM",
    "DAZED",
];

/* WearPos - for eq list, indexed by WearPos::index() */
pub const WEAR_WHERE: [&str; 17] = [
    "<used as light>      ",
    "<worn on finger>     ",
    "<worn on finger>     ",
    "<worn around neck>   ",
    "<worn around neck>   ",
    "<worn on body>       ",
    "<worn on head>       ",
    "<worn on legs>       ",
    "<worn on feet>       ",
    "<worn on hands>      ",
    "<worn on arms>       ",
    "<worn as shield>     ",
    "<worn about body>    ",
    "<worn about waist>   ",
    "<worn around wrist>  ",
    "<worn around wrist>  ",
    "<wielded>            ",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{AffectFlags, RoomFlags, NUM_WEARS};
    use crate::util::sprintbit;

    #[test]
    fn bit_names_cover_every_flag() {
        assert_eq!(RoomFlags::all().bits().count_ones() as usize, ROOM_BITS.len());
        assert_eq!(AffectFlags::all().bits().count_ones() as usize, AFFECTED_BITS.len());
        assert_eq!(WEAR_WHERE.len(), NUM_WEARS);
        assert_eq!(
            sprintbit((RoomFlags::INDOORS | RoomFlags::PEACEFUL).bits(), &ROOM_BITS),
            "INDOORS PEACEFUL"
        );
    }
}
