//! Sample functions, hand assembled for the supported subset, each with a
//! native Rust counterpart that computes the same thing.
//!
//! All of them follow the usual calling convention: arguments in R0-R3,
//! result in R0, return with `bx lr`. Pointer arguments are addresses in
//! the image's data region.

use crate::asm::{
    add_imm, add_reg, b, bl, bx, cmp_imm, cmp_reg, ldr_imm, ldrb_imm, mov_imm, mov_reg, mul,
    str_imm, sub_imm, words_to_bytes,
};
use crate::cpu::condition::Condition::{AL, EQ, GT};
use crate::cpu::registers::{REG_LR, REG_SP};
use crate::error::EmuError;
use crate::session::{RunOutcome, Session, SessionConfig};

const R12: usize = 12;

/// `quadratic(x, a, b, c) = a*x*x + b*x + c`
#[must_use]
pub fn quadratic() -> Vec<u32> {
    vec![
        mul(R12, 0, 0),
        mul(1, R12, 1),
        mul(2, 0, 2),
        add_reg(0, 1, 2),
        add_reg(0, 0, 3),
        bx(REG_LR),
    ]
}

/// `sum_array(ptr, n)`
#[must_use]
pub fn sum_array() -> Vec<u32> {
    vec![
        mov_imm(2, 0),
        mov_imm(3, 0),
        // loop:
        cmp_reg(3, 1),
        b(EQ, 4),
        ldr_imm(R12, 0, 0),
        add_reg(2, 2, R12),
        add_imm(0, 0, 4),
        add_imm(3, 3, 1),
        b(AL, -8),
        // done:
        mov_reg(0, 2),
        bx(REG_LR),
    ]
}

/// `find_max(ptr, n)`, `n` at least 1.
#[must_use]
pub fn find_max() -> Vec<u32> {
    vec![
        ldr_imm(2, 0, 0),
        mov_imm(3, 1),
        // loop:
        cmp_reg(3, 1),
        b(EQ, 6),
        add_imm(0, 0, 4),
        ldr_imm(R12, 0, 0),
        cmp_reg(2, R12),
        b(GT, 0),
        mov_reg(2, R12),
        // next:
        add_imm(3, 3, 1),
        b(AL, -10),
        // done:
        mov_reg(0, 2),
        bx(REG_LR),
    ]
}

/// `fib_iter(n)`
#[must_use]
pub fn fib_iter() -> Vec<u32> {
    vec![
        cmp_imm(0, 0),
        b(EQ, 10),
        mov_imm(1, 0),
        mov_imm(2, 1),
        mov_imm(3, 1),
        // loop:
        cmp_reg(3, 0),
        b(EQ, 4),
        mov_reg(R12, 1),
        mov_reg(1, 2),
        add_reg(2, R12, 1),
        add_imm(3, 3, 1),
        b(AL, -8),
        // done:
        mov_reg(0, 2),
        bx(REG_LR),
    ]
}

/// `fib_rec(n)`, calling itself through `bl` and spilling LR, R4 and R5.
#[must_use]
pub fn fib_rec() -> Vec<u32> {
    vec![
        cmp_imm(0, 1),
        b(GT, 0),
        bx(REG_LR),
        // recurse:
        sub_imm(REG_SP, REG_SP, 12),
        str_imm(REG_LR, REG_SP, 0),
        str_imm(4, REG_SP, 4),
        str_imm(5, REG_SP, 8),
        mov_reg(4, 0),
        sub_imm(0, 4, 1),
        bl(AL, -11),
        mov_reg(5, 0),
        sub_imm(0, 4, 2),
        bl(AL, -14),
        add_reg(0, 5, 0),
        ldr_imm(REG_LR, REG_SP, 0),
        ldr_imm(4, REG_SP, 4),
        ldr_imm(5, REG_SP, 8),
        add_imm(REG_SP, REG_SP, 12),
        bx(REG_LR),
    ]
}

/// `strlen(ptr)` over a NUL terminated byte string.
#[must_use]
pub fn strlen() -> Vec<u32> {
    vec![
        mov_imm(1, 0),
        // loop:
        ldrb_imm(2, 0, 0),
        cmp_imm(2, 0),
        b(EQ, 2),
        add_imm(0, 0, 1),
        add_imm(1, 1, 1),
        b(AL, -7),
        // done:
        mov_reg(0, 1),
        bx(REG_LR),
    ]
}

pub mod native {
    #[must_use]
    pub const fn quadratic(x: i32, a: i32, b: i32, c: i32) -> i32 {
        a.wrapping_mul(x)
            .wrapping_mul(x)
            .wrapping_add(b.wrapping_mul(x))
            .wrapping_add(c)
    }

    #[must_use]
    pub fn sum_array(values: &[i32]) -> i32 {
        values.iter().fold(0, |acc, v| acc.wrapping_add(*v))
    }

    #[must_use]
    pub fn find_max(values: &[i32]) -> i32 {
        values.iter().copied().max().unwrap_or_default()
    }

    #[must_use]
    pub const fn fib_iter(n: u32) -> i32 {
        let (mut prev, mut cur) = (0_i32, 1_i32);
        if n == 0 {
            return 0;
        }
        let mut i = 1;
        while i < n {
            let next = prev.wrapping_add(cur);
            prev = cur;
            cur = next;
            i += 1;
        }
        cur
    }

    #[must_use]
    pub const fn fib_rec(n: u32) -> i32 {
        if n <= 1 {
            n as i32
        } else {
            fib_rec(n - 1).wrapping_add(fib_rec(n - 2))
        }
    }

    #[must_use]
    pub const fn strlen(s: &str) -> i32 {
        s.len() as i32
    }
}

/// Words of `values`, little-endian, for the data region.
#[must_use]
pub fn words_data(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// `s` followed by a NUL byte.
#[must_use]
pub fn c_string(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(0);
    bytes
}

/// Lays out `code` and `data`, then runs one call. `args` receives the data
/// region's address and returns R0-R3.
///
/// # Errors
/// Any layout or emulation error.
pub fn call(
    config: &SessionConfig,
    code: &[u32],
    data: &[u8],
    args: impl FnOnce(u32) -> [u32; 4],
) -> Result<RunOutcome, EmuError> {
    let memory = config.image(&words_to_bytes(code), data)?;
    let args = args(memory.data_base());
    Session::new(config, memory, args).run()
}
