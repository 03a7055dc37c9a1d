//! Static (declared-argument) parser collaborator.
//!
//! The orchestrator only needs `parse_known`: the values of the arguments the
//! static parser declares, plus every token it did not recognize.
//! [`ClapStaticParser`] provides this on top of a `clap::Command`.

use crate::error::ArgResult;
use clap::{Arg, ArgAction, Command};
use serde_json::{Map, Value};
use tracing::debug;

/// Result of a lenient static parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownArgs {
    /// Recognized values keyed by argument name.
    pub recognized: Map<String, Value>,
    /// Tokens left for the dynamic tokenizer, in their original order.
    pub residual: Vec<String>,
}

/// A parser for a fixed set of declared arguments.
pub trait StaticParser {
    /// Parse the tokens this parser knows and pass the rest through.
    fn parse_known(&self, tokens: &[String]) -> ArgResult<KnownArgs>;
}

impl<F> StaticParser for F
where
    F: Fn(&[String]) -> ArgResult<KnownArgs>,
{
    fn parse_known(&self, tokens: &[String]) -> ArgResult<KnownArgs> {
        self(tokens)
    }
}

fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

/// `-1`, `-0.5`, `-1e-3`.
fn is_negative_number(token: &str) -> bool {
    token.strip_prefix('-').is_some_and(|rest| {
        rest.starts_with(|c: char| c.is_ascii_digit()) && rest.parse::<f64>().is_ok()
    })
}

/// Lenient static parsing backed by a clap [`Command`].
///
/// Flags declared on the command are handed to clap together with their
/// values; everything else is returned as residual. Declared defaults show up
/// as recognized values.
///
/// A negative number after a declared flag is taken as its value unless the
/// command declares a short flag that is itself a digit. Repeating a flag
/// keeps the last value.
#[derive(Debug, Clone)]
pub struct ClapStaticParser {
    command: Command,
    numeric_flags: bool,
}

impl ClapStaticParser {
    pub fn new(command: Command) -> Self {
        let mut command = command.allow_negative_numbers(true).args_override_self(true);
        // Finalize generated arguments (help, version) and num_args defaults.
        command.build();
        let numeric_flags = command.get_arguments().any(|arg| {
            arg.get_short_and_visible_aliases()
                .is_some_and(|shorts| shorts.iter().any(char::is_ascii_digit))
        });
        Self {
            command,
            numeric_flags,
        }
    }

    fn is_value(&self, token: &str) -> bool {
        !is_flag(token) || (!self.numeric_flags && is_negative_number(token))
    }

    /// Find the declared argument a flag token refers to.
    fn find_arg(&self, token: &str) -> Option<&Arg> {
        let name = token.split_once('=').map_or(token, |(name, _)| name);

        if let Some(long) = name.strip_prefix("--") {
            return self.command.get_arguments().find(|arg| {
                arg.get_long_and_visible_aliases()
                    .is_some_and(|names| names.contains(&long))
            });
        }

        let short = name.strip_prefix('-')?;
        let mut chars = short.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };
        self.command.get_arguments().find(|arg| {
            arg.get_short_and_visible_aliases()
                .is_some_and(|shorts| shorts.contains(&c))
        })
    }

    /// Split tokens into those clap should see and the residual.
    fn partition(&self, tokens: &[String]) -> (Vec<String>, Vec<String>) {
        let mut recognized = Vec::new();
        let mut residual = Vec::new();
        let mut iter = tokens.iter().peekable();

        while let Some(token) = iter.next() {
            let arg = if self.is_value(token) { None } else { self.find_arg(token) };
            let Some(arg) = arg else {
                residual.push(token.clone());
                continue;
            };

            recognized.push(token.clone());
            if !arg.get_action().takes_values() || token.contains('=') {
                continue;
            }
            let max = arg.get_num_args().map_or(1, |range| range.max_values());
            for _ in 0..max {
                match iter.next_if(|t| self.is_value(t)) {
                    Some(value) => recognized.push(value.clone()),
                    None => break,
                }
            }
        }

        (recognized, residual)
    }
}

impl StaticParser for ClapStaticParser {
    fn parse_known(&self, tokens: &[String]) -> ArgResult<KnownArgs> {
        let (known, residual) = self.partition(tokens);
        debug!(known = known.len(), residual = residual.len(), "Partitioned tokens for static parser");

        let argv = std::iter::once(self.command.get_name().to_string()).chain(known);
        let matches = self.command.clone().try_get_matches_from(argv)?;

        let mut recognized = Map::new();
        for arg in self.command.get_arguments() {
            let id = arg.get_id().as_str();
            let value = match arg.get_action() {
                ArgAction::SetTrue | ArgAction::SetFalse => matches
                    .try_get_one::<bool>(id)
                    .ok()
                    .flatten()
                    .map(|b| Value::Bool(*b)),
                ArgAction::Count => matches
                    .try_get_one::<u8>(id)
                    .ok()
                    .flatten()
                    .map(|n| Value::from(*n)),
                action @ (ArgAction::Set | ArgAction::Append) => {
                    let Some(raw) = matches.try_get_raw(id).ok().flatten() else {
                        continue;
                    };
                    let mut values: Vec<Value> = raw
                        .map(|s| Value::String(s.to_string_lossy().into_owned()))
                        .collect();
                    let single = matches!(action, ArgAction::Set)
                        && arg.get_num_args().is_none_or(|range| range.max_values() <= 1);
                    if single && values.len() == 1 {
                        values.pop()
                    } else {
                        Some(Value::Array(values))
                    }
                }
                _ => None,
            };
            if let Some(value) = value {
                recognized.insert(id.to_string(), value);
            }
        }

        Ok(KnownArgs {
            recognized,
            residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArgError, ErrorCode};
    use serde_json::json;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn train_command() -> Command {
        Command::new("train")
            .arg(Arg::new("model").long("model").required(true))
            .arg(Arg::new("optimizer").long("optimizer").default_value("sgd"))
            .arg(Arg::new("lr").long("lr").default_value("0.01"))
            .arg(Arg::new("batchsize").short('b').long("batchsize").default_value("128"))
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue))
            .arg(
                Arg::new("layers")
                    .long("layers")
                    .num_args(1..)
                    .action(ArgAction::Set),
            )
    }

    #[test]
    fn test_recognized_and_defaults() {
        let parser = ClapStaticParser::new(train_command());
        let known = parser
            .parse_known(&tokens("--model resnet18 --optimizer adam --lr 0.1"))
            .unwrap();

        assert_eq!(known.recognized["model"], json!("resnet18"));
        assert_eq!(known.recognized["optimizer"], json!("adam"));
        assert_eq!(known.recognized["lr"], json!("0.1"));
        assert_eq!(known.recognized["batchsize"], json!("128"));
        assert_eq!(known.recognized["verbose"], json!(false));
        assert!(!known.recognized.contains_key("layers"));
        assert!(known.residual.is_empty());
    }

    #[test]
    fn test_unrecognized_tokens_pass_through() {
        let parser = ClapStaticParser::new(train_command());
        let known = parser
            .parse_known(&tokens("--model resnet18 --unrecognized hello -b 64 --x.y=1,2"))
            .unwrap();

        assert_eq!(known.recognized["batchsize"], json!("64"));
        assert_eq!(known.residual, tokens("--unrecognized hello --x.y=1,2"));
    }

    #[test]
    fn test_single_value_flag_leaves_extra_values() {
        let parser = ClapStaticParser::new(train_command());
        let known = parser
            .parse_known(&tokens("--model resnet18 extra --lr=0.5"))
            .unwrap();

        assert_eq!(known.recognized["lr"], json!("0.5"));
        assert_eq!(known.residual, tokens("extra"));
    }

    #[test]
    fn test_multi_value_flag() {
        let parser = ClapStaticParser::new(train_command());
        let known = parser
            .parse_known(&tokens("--model m --layers 64 128 --verbose"))
            .unwrap();

        assert_eq!(known.recognized["layers"], json!(["64", "128"]));
        assert_eq!(known.recognized["verbose"], json!(true));
    }

    #[test]
    fn test_negative_number_values() {
        let parser = ClapStaticParser::new(train_command());
        let known = parser
            .parse_known(&tokens("--model m --lr -0.1 --layers -1 -2 3 --x -3"))
            .unwrap();

        assert_eq!(known.recognized["lr"], json!("-0.1"));
        assert_eq!(known.recognized["layers"], json!(["-1", "-2", "3"]));
        assert_eq!(known.residual, tokens("--x -3"));
    }

    #[test]
    fn test_numeric_short_flag_disables_negative_values() {
        let command = train_command().arg(Arg::new("one").short('1').action(ArgAction::SetTrue));
        let parser = ClapStaticParser::new(command);
        assert!(!parser.is_value("-1"));
        assert!(!parser.is_value("-0.5"));

        let parser = ClapStaticParser::new(train_command());
        assert!(parser.is_value("-1"));
        assert!(parser.is_value("-1e-3"));
        assert!(!parser.is_value("-inf"));
        assert!(!parser.is_value("-b"));
    }

    #[test]
    fn test_repeated_flag_keeps_last_value() {
        let parser = ClapStaticParser::new(train_command());
        let known = parser
            .parse_known(&tokens("--model a --lr 1 --lr 2 --model b"))
            .unwrap();

        assert_eq!(known.recognized["lr"], json!("2"));
        assert_eq!(known.recognized["model"], json!("b"));
    }

    #[test]
    fn test_static_errors_propagate() {
        let parser = ClapStaticParser::new(train_command());
        let err = parser.parse_known(&tokens("--lr 0.1")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StaticParser);
        match err {
            ArgError::StaticParser(e) => {
                assert_eq!(e.kind(), clap::error::ErrorKind::MissingRequiredArgument)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_closure_parser() {
        let parser = |tokens: &[String]| -> ArgResult<KnownArgs> {
            Ok(KnownArgs {
                recognized: Map::new(),
                residual: tokens.to_vec(),
            })
        };
        let known = parser.parse_known(&tokens("--a 1")).unwrap();
        assert_eq!(known.residual, tokens("--a 1"));
    }
}
