use emu::asm::{self, words_to_bytes};
use emu::cache::{CacheSize, CacheStats};
use emu::cpu::condition::Condition;
use emu::cpu::registers::REG_LR;
use emu::cpu::state::InstructionCounters;
use emu::error::UnsupportedMode;
use emu::memory::AccessKind;
use emu::programs::{self, c_string, call, native, words_data};
use emu::{EmuError, RunOutcome, Session, SessionConfig};
use pretty_assertions::assert_eq;

fn array_call(code: &[u32], values: &[i32]) -> RunOutcome {
    call(&SessionConfig::default(), code, &words_data(values), |data| {
        [data, values.len() as u32, 0, 0]
    })
    .unwrap()
}

fn string_call(code: &[u32], s: &str) -> RunOutcome {
    call(&SessionConfig::default(), code, &c_string(s), |data| {
        [data, 0, 0, 0]
    })
    .unwrap()
}

fn scalar_call(code: &[u32], args: [i32; 4]) -> RunOutcome {
    call(&SessionConfig::default(), code, &[], |_| args.map(|a| a as u32)).unwrap()
}

fn arrays() -> Vec<Vec<i32>> {
    vec![
        vec![1, 2, 3, 4],
        vec![4, 0, 3, 0, 5],
        vec![9, 0, -5, -1, 12],
        (0..1000).collect(),
        vec![10, 2, 6, 3, 5],
        vec![-4, 3, 7, -2, 12],
        vec![0, -5, 0, 3, 1],
    ]
}

#[test]
fn sum_array_example() {
    let outcome = array_call(&programs::sum_array(), &[9, 0, -5, -1, 12]);
    assert_eq!(outcome.return_value as i32, 15);
    assert_eq!(
        outcome.counters(),
        InstructionCounters {
            computation: 24,
            memory: 5,
            branch_taken: 7,
            branch_not_taken: 5,
        }
    );
}

#[test]
fn sum_array_matches_native() {
    for values in arrays() {
        let outcome = array_call(&programs::sum_array(), &values);
        assert_eq!(outcome.return_value as i32, native::sum_array(&values), "{values:?}");
    }
}

#[test]
fn find_max_example() {
    let outcome = array_call(&programs::find_max(), &[-4, 3, 7, -2, 12]);
    assert_eq!(outcome.return_value as i32, 12);
}

#[test]
fn find_max_matches_native() {
    for values in arrays() {
        let outcome = array_call(&programs::find_max(), &values);
        assert_eq!(outcome.return_value as i32, native::find_max(&values), "{values:?}");
    }
}

#[test]
fn fib_iter_sequence() {
    let expected = [
        0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610, 987, 1597, 2584, 4181, 6765,
    ];
    for (n, want) in expected.into_iter().enumerate() {
        let outcome = scalar_call(&programs::fib_iter(), [n as i32, 0, 0, 0]);
        assert_eq!(outcome.return_value as i32, want, "fib_iter({n})");
    }
}

#[test]
fn fib_rec_matches_native() {
    for n in 0..=20 {
        let outcome = scalar_call(&programs::fib_rec(), [n as i32, 0, 0, 0]);
        assert_eq!(outcome.return_value as i32, native::fib_rec(n), "fib_rec({n})");
    }
}

#[test]
fn fib_rec_restores_the_stack() {
    let config = SessionConfig::default();
    let outcome = call(&config, &programs::fib_rec(), &[], |_| [10, 0, 0, 0]).unwrap();
    assert_eq!(outcome.return_value, 55);
    assert_eq!(
        outcome.state.registers.register_at(13),
        outcome.memory.stack_top()
    );
    assert!(outcome.counters().memory > 0);
}

#[test]
fn quadratic_matches_native() {
    for [x, a, b, c] in [[1, 2, 3, 4], [7, 0, 4, -1], [-10, 13, 0, 6], [-5, -8, -23, -1]] {
        let outcome = scalar_call(&programs::quadratic(), [x, a, b, c]);
        assert_eq!(outcome.return_value as i32, native::quadratic(x, a, b, c));
    }
}

#[test]
fn strlen_matches_native() {
    for s in ["hello", "project04", "hi", "opportunity", "backpack", ""] {
        let outcome = string_call(&programs::strlen(), s);
        assert_eq!(outcome.return_value as i32, native::strlen(s), "{s:?}");
    }
}

#[test]
fn cache_counts_every_fetch() {
    let outcome = array_call(&programs::sum_array(), &[1, 2, 3, 4]);
    let stats = outcome.cache_stats();
    assert_eq!(stats.requests, outcome.counters().total());
    assert_eq!(stats.hits + stats.misses, stats.requests);
    assert_eq!(stats.size, 8);
}

#[test]
fn large_cache_only_misses_cold() {
    let config = SessionConfig {
        cache_size: CacheSize::new(1024).unwrap(),
        ..SessionConfig::default()
    };
    let values: Vec<i32> = (0..1000).collect();
    let code = programs::sum_array();
    let outcome = call(&config, &code, &words_data(&values), |data| {
        [data, 1000, 0, 0]
    })
    .unwrap();

    let stats = outcome.cache_stats();
    assert_eq!(stats.misses, code.len() as u64);
    assert_eq!(stats.requests, 6 + 7 * 1000);
}

#[test]
fn single_slot_cache_misses_on_every_address_change() {
    let config = SessionConfig {
        cache_size: CacheSize::new(1).unwrap(),
        ..SessionConfig::default()
    };
    let outcome = call(&config, &programs::quadratic(), &[], |_| [1, 1, 1, 1]).unwrap();
    assert_eq!(
        outcome.cache_stats(),
        CacheStats {
            size: 1,
            requests: 6,
            hits: 0,
            misses: 6,
        }
    );
}

#[test]
fn sessions_are_deterministic() {
    let values = [10, 2, 6, 3, 5];
    let a = array_call(&programs::find_max(), &values);
    let b = array_call(&programs::find_max(), &values);
    assert_eq!(a, b);
}

fn run_words(words: &[u32], args: [u32; 4]) -> Result<RunOutcome, EmuError> {
    let config = SessionConfig::default();
    let memory = config.image(&words_to_bytes(words), &[])?;
    Session::new(&config, memory, args).run()
}

#[test]
fn byte_store_fails() {
    // STRB R1, [R0]
    let strb = 0xE5C0_1000;
    let err = run_words(&[strb, asm::bx(REG_LR)], [0x8000, 0, 0, 0]).unwrap_err();
    assert_eq!(
        err,
        EmuError::UnsupportedAddressingMode {
            address: 0x8000,
            raw: strb,
            mode: UnsupportedMode::ByteStore,
        }
    );
}

#[test]
fn load_from_unmapped_address_fails() {
    let err = run_words(&[asm::ldr_imm(1, 0, 0), asm::bx(REG_LR)], [0x10, 0, 0, 0]).unwrap_err();
    assert_eq!(
        err,
        EmuError::OutOfBounds {
            address: 0x10,
            width: 4,
            kind: AccessKind::Load,
        }
    );
}

#[test]
fn branch_into_data_fails_on_fetch() {
    let words = [asm::mov_imm(1, 0x10), asm::add_imm(1, 1, 0xFF), asm::bx(1)];
    let err = run_words(&words, [0; 4]).unwrap_err();
    assert!(matches!(
        err,
        EmuError::OutOfBounds {
            kind: AccessKind::Fetch,
            ..
        }
    ));
}

#[test]
fn conditional_branch_outside_the_modeled_set_fails() {
    let ble = asm::b(Condition::LE, 0);
    let err = run_words(&[ble], [0; 4]).unwrap_err();
    assert_eq!(
        err,
        EmuError::UnsupportedAddressingMode {
            address: 0x8000,
            raw: ble,
            mode: UnsupportedMode::Condition(Condition::LE),
        }
    );
}

#[test]
fn overwritten_link_register_never_halts() {
    let config = SessionConfig {
        max_instructions: 500,
        ..SessionConfig::default()
    };
    // bl to the next instruction then return: LR now points back into the code.
    let words = [asm::bl(Condition::AL, -1), asm::bx(REG_LR)];
    let memory = config.image(&words_to_bytes(&words), &[]).unwrap();
    let err = Session::new(&config, memory, [0; 4]).run().unwrap_err();
    assert!(matches!(err, EmuError::NonTerminating { limit: 500, .. }));
}

#[test]
fn invalid_cache_size() {
    assert_eq!(
        CacheSize::new(12),
        Err(EmuError::InvalidCacheSize {
            size: 12,
            max: CacheSize::MAX
        })
    );
}
