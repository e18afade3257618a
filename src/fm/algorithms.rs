//! Operator routing for the 32 DX7 algorithms.
//!
//! Each algorithm lists one routing byte per operator, in computation order
//! (operator 6 first). Operators read their modulation from one of two buses
//! and write to a bus or to the voice output.

// Based on Apache-licensed code (c) 2012 by Google Inc.

pub const OUT_BUS_ONE: u8 = 1 << 0;
pub const OUT_BUS_TWO: u8 = 1 << 1;
pub const OUT_BUS_ADD: u8 = 1 << 2;
pub const IN_BUS_ONE: u8 = 1 << 4;
pub const IN_BUS_TWO: u8 = 1 << 5;
pub const FB_IN: u8 = 1 << 6;
pub const FB_OUT: u8 = 1 << 7;

pub const NUM_ALGORITHMS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing(pub u8);

impl Routing {
    /// Bus the operator reads from: 0 for none, 1 or 2.
    #[inline]
    pub fn input_bus(self) -> usize {
        ((self.0 >> 4) & 0x03) as usize
    }

    /// Bus the operator writes to: 0 for the voice output, 1 or 2.
    #[inline]
    pub fn output_bus(self) -> usize {
        (self.0 & 0x03) as usize
    }

    #[inline]
    pub fn is_additive(self) -> bool {
        self.0 & OUT_BUS_ADD != 0
    }

    #[inline]
    pub fn is_carrier(self) -> bool {
        self.output_bus() == 0
    }

    #[inline]
    pub fn feedback_in(self) -> bool {
        self.0 & FB_IN != 0
    }

    #[inline]
    pub fn feedback_out(self) -> bool {
        self.0 & FB_OUT != 0
    }
}

const fn algorithm(ops: [u8; 6]) -> [Routing; 6] {
    [
        Routing(ops[0]),
        Routing(ops[1]),
        Routing(ops[2]),
        Routing(ops[3]),
        Routing(ops[4]),
        Routing(ops[5]),
    ]
}

pub const ALGORITHMS: [[Routing; 6]; NUM_ALGORITHMS] = [
    algorithm([0xc1, 0x11, 0x11, 0x14, 0x01, 0x14]), // 1
    algorithm([0x01, 0x11, 0x11, 0x14, 0xc1, 0x14]), // 2
    algorithm([0xc1, 0x11, 0x14, 0x01, 0x11, 0x14]), // 3
    algorithm([0xc1, 0x11, 0x94, 0x01, 0x11, 0x14]), // 4
    algorithm([0xc1, 0x14, 0x01, 0x14, 0x01, 0x14]), // 5
    algorithm([0xc1, 0x94, 0x01, 0x14, 0x01, 0x14]), // 6
    algorithm([0xc1, 0x11, 0x05, 0x14, 0x01, 0x14]), // 7
    algorithm([0x01, 0x11, 0xc5, 0x14, 0x01, 0x14]), // 8
    algorithm([0x01, 0x11, 0x05, 0x14, 0xc1, 0x14]), // 9
    algorithm([0x01, 0x05, 0x14, 0xc1, 0x11, 0x14]), // 10
    algorithm([0xc1, 0x05, 0x14, 0x01, 0x11, 0x14]), // 11
    algorithm([0x01, 0x05, 0x05, 0x14, 0xc1, 0x14]), // 12
    algorithm([0xc1, 0x05, 0x05, 0x14, 0x01, 0x14]), // 13
    algorithm([0xc1, 0x05, 0x11, 0x14, 0x01, 0x14]), // 14
    algorithm([0x01, 0x05, 0x11, 0x14, 0xc1, 0x14]), // 15
    algorithm([0xc1, 0x11, 0x02, 0x25, 0x05, 0x14]), // 16
    algorithm([0x01, 0x11, 0x02, 0x25, 0xc5, 0x14]), // 17
    algorithm([0x01, 0x11, 0x11, 0xc5, 0x05, 0x14]), // 18
    algorithm([0xc1, 0x14, 0x14, 0x01, 0x11, 0x14]), // 19
    algorithm([0x01, 0x05, 0x14, 0xc1, 0x14, 0x14]), // 20
    algorithm([0x01, 0x14, 0x14, 0xc1, 0x14, 0x14]), // 21
    algorithm([0xc1, 0x14, 0x14, 0x14, 0x01, 0x14]), // 22
    algorithm([0xc1, 0x14, 0x14, 0x01, 0x14, 0x04]), // 23
    algorithm([0xc1, 0x14, 0x14, 0x14, 0x04, 0x04]), // 24
    algorithm([0xc1, 0x14, 0x14, 0x04, 0x04, 0x04]), // 25
    algorithm([0xc1, 0x05, 0x14, 0x01, 0x14, 0x04]), // 26
    algorithm([0x01, 0x05, 0x14, 0xc1, 0x14, 0x04]), // 27
    algorithm([0x04, 0xc1, 0x11, 0x14, 0x01, 0x14]), // 28
    algorithm([0xc1, 0x14, 0x01, 0x14, 0x04, 0x04]), // 29
    algorithm([0x04, 0xc1, 0x11, 0x14, 0x04, 0x04]), // 30
    algorithm([0xc1, 0x14, 0x04, 0x04, 0x04, 0x04]), // 31
    algorithm([0xc4, 0x04, 0x04, 0x04, 0x04, 0x04]), // 32
];

/// Routing of algorithm `index` (0-based, wraps at 32).
#[inline]
pub fn routing(index: u8) -> &'static [Routing; 6] {
    &ALGORITHMS[index as usize % NUM_ALGORITHMS]
}
