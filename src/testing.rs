//! Interface fixtures shared by unit tests.

use crate::provider::{InterfaceInfo, MemberInfo, MemberVisitor};

#[derive(Debug, Default)]
pub struct Counter {
    pub value: i32,
}

impl Counter {
    pub const ID: u64 = 0x11;
    pub const CHECKSUM: u64 = 0xc0ffee;

    pub fn increment(&mut self, amount: i32) -> i32 {
        self.value += amount;
        self.value
    }

    pub fn value(&mut self) -> i32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

impl InterfaceInfo for Counter {
    const MEMBER_FUNCTION_COUNT: usize = 3;

    fn interface_name() -> String {
        "counter:demo/counter".to_string()
    }

    fn interface_id() -> u64 {
        Self::ID
    }

    fn interface_checksum() -> u64 {
        Self::CHECKSUM
    }

    fn visit_member_functions(visitor: &mut MemberVisitor<'_, Self>) {
        visitor
            .member(
                Counter::increment,
                MemberInfo::new("Counter::increment", "increment", 0x1101, 0xa1),
            )
            .member(
                Counter::value,
                MemberInfo::new("Counter::value", "value", 0x1102, 0xa2),
            )
            .member(
                Counter::reset,
                MemberInfo::new("Counter::reset", "reset", 0x1103, 0xa3),
            );
    }
}

#[derive(Debug, Default)]
pub struct Greeter {
    pub greeted: u32,
}

impl Greeter {
    pub const ID: u64 = 0x22;

    pub fn greet(&mut self, times: u32) -> u32 {
        self.greeted += times;
        self.greeted
    }

    pub fn ratio(&mut self, numerator: f64, denominator: f64) -> f64 {
        numerator / denominator
    }
}

impl InterfaceInfo for Greeter {
    const MEMBER_FUNCTION_COUNT: usize = 2;

    fn interface_name() -> String {
        "greeter:demo/greeter".to_string()
    }

    fn interface_id() -> u64 {
        Self::ID
    }

    fn interface_checksum() -> u64 {
        0x6e6e
    }

    fn visit_member_functions(visitor: &mut MemberVisitor<'_, Self>) {
        visitor
            .member(
                Greeter::greet,
                MemberInfo::new("Greeter::greet", "greet", 0x2201, 0xb1),
            )
            .member(
                Greeter::ratio,
                MemberInfo::new("Greeter::ratio", "ratio", 0x2202, 0xb2),
            );
    }
}
