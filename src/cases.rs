use clap::ValueEnum;
use emu::SessionConfig;
use emu::programs::{self, c_string, native, words_data};
use serde::Serialize;
use tracing::info;

use crate::report::CaseReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Program {
    Quadratic,
    SumArray,
    FindMax,
    FibIter,
    FibRec,
    Strlen,
}

impl Program {
    pub const ALL: [Self; 6] = [
        Self::Quadratic,
        Self::SumArray,
        Self::FindMax,
        Self::FibIter,
        Self::FibRec,
        Self::Strlen,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Quadratic => "quadratic",
            Self::SumArray => "sum_array",
            Self::FindMax => "find_max",
            Self::FibIter => "fib_iter",
            Self::FibRec => "fib_rec",
            Self::Strlen => "strlen",
        }
    }

    fn code(self) -> Vec<u32> {
        match self {
            Self::Quadratic => programs::quadratic(),
            Self::SumArray => programs::sum_array(),
            Self::FindMax => programs::find_max(),
            Self::FibIter => programs::fib_iter(),
            Self::FibRec => programs::fib_rec(),
            Self::Strlen => programs::strlen(),
        }
    }

    /// Every input the harness runs this program with.
    #[allow(clippy::cast_possible_wrap)]
    pub fn cases(self) -> Vec<Case> {
        match self {
            Self::Quadratic => [[1, 2, 3, 4], [7, 0, 4, -1], [-10, 13, 0, 6], [-5, -8, -23, -1]]
                .into_iter()
                .map(|[x, a, b, c]| Case {
                    program: self,
                    input: format!("{x}, {a}, {b}, {c}"),
                    expected: native::quadratic(x, a, b, c),
                    data: Vec::new(),
                    args: CaseArgs::Scalars([x, a, b, c]),
                })
                .collect(),
            Self::SumArray => sum_array_inputs()
                .into_iter()
                .map(|values| self.array_case(&values, native::sum_array(&values)))
                .collect(),
            Self::FindMax => find_max_inputs()
                .into_iter()
                .map(|values| self.array_case(&values, native::find_max(&values)))
                .collect(),
            Self::FibIter | Self::FibRec => (0..=20)
                .map(|n| Case {
                    program: self,
                    input: n.to_string(),
                    expected: if self == Self::FibIter {
                        native::fib_iter(n)
                    } else {
                        native::fib_rec(n)
                    },
                    data: Vec::new(),
                    args: CaseArgs::Scalars([n as i32, 0, 0, 0]),
                })
                .collect(),
            Self::Strlen => ["hello", "project04", "hi", "opportunity", "backpack"]
                .into_iter()
                .map(|s| Case {
                    program: self,
                    input: format!("{s:?}"),
                    expected: native::strlen(s),
                    data: c_string(s),
                    args: CaseArgs::Pointer { len: 0 },
                })
                .collect(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn array_case(self, values: &[i32], expected: i32) -> Case {
        let input = if values.len() > 10 {
            format!("{}-{}", values[0], values[values.len() - 1])
        } else {
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        Case {
            program: self,
            input,
            expected,
            data: words_data(values),
            args: CaseArgs::Pointer {
                len: values.len() as u32,
            },
        }
    }
}

fn sum_array_inputs() -> Vec<Vec<i32>> {
    vec![
        vec![1, 2, 3, 4],
        vec![4, 0, 3, 0, 5],
        vec![9, 0, -5, -1, 12],
        (0..1000).collect(),
    ]
}

fn find_max_inputs() -> Vec<Vec<i32>> {
    vec![
        vec![10, 2, 6, 3, 5],
        vec![-4, 3, 7, -2, 12],
        vec![0, -5, 0, 3, 1],
        (0..1000).collect(),
    ]
}

#[derive(Debug, Clone, Copy)]
pub enum CaseArgs {
    Scalars([i32; 4]),
    /// R0 = address of the data region, R1 = `len`.
    Pointer { len: u32 },
}

impl CaseArgs {
    #[allow(clippy::cast_sign_loss)]
    fn resolve(self, data_base: u32) -> [u32; 4] {
        match self {
            Self::Scalars(args) => args.map(|a| a as u32),
            Self::Pointer { len } => [data_base, len, 0, 0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Case {
    pub program: Program,
    pub input: String,
    pub expected: i32,
    data: Vec<u8>,
    args: CaseArgs,
}

impl Case {
    /// Emulates the case in a fresh session and compares it with the native result.
    #[allow(clippy::cast_possible_wrap)]
    pub fn run(&self, config: &SessionConfig) -> CaseReport {
        let code = self.program.code();
        let outcome = programs::call(config, &code, &self.data, |data_base| {
            self.args.resolve(data_base)
        });

        match outcome {
            Ok(outcome) => {
                let emulated = outcome.return_value as i32;
                info!(
                    program = self.program.name(),
                    input = %self.input,
                    expected = self.expected,
                    emulated,
                    "case finished"
                );
                CaseReport {
                    program: self.program,
                    input: self.input.clone(),
                    expected: self.expected,
                    emulated: Some(emulated),
                    error: None,
                    counters: Some(outcome.counters()),
                    cache: Some(outcome.cache_stats()),
                }
            }
            Err(err) => CaseReport {
                program: self.program,
                input: self.input.clone(),
                expected: self.expected,
                emulated: None,
                error: Some(err.to_string()),
                counters: None,
                cache: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn case_counts() {
        let counts: Vec<usize> = Program::ALL.iter().map(|p| p.cases().len()).collect();
        assert_eq!(counts, vec![4, 4, 4, 21, 21, 5]);
    }

    #[test]
    fn array_inputs_are_labelled() {
        let cases = Program::SumArray.cases();
        assert_eq!(cases[2].input, "9, 0, -5, -1, 12");
        assert_eq!(cases[3].input, "0-999");
        assert_eq!(cases[3].expected, 499_500);
    }

    #[test]
    fn every_case_passes() {
        let config = SessionConfig::default();
        for program in Program::ALL {
            for case in program.cases() {
                let report = case.run(&config);
                assert!(report.passed(), "{report:?}");
            }
        }
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let config = SessionConfig {
            max_instructions: 3,
            ..SessionConfig::default()
        };
        let report = Program::FibIter.cases()[5].run(&config);
        assert!(!report.passed());
        assert_eq!(report.emulated, None);
        assert!(report.error.unwrap().contains('3'));
    }
}
