//! Decoding one job-file line into a [`Directive`].

use crate::error::SpecErrorKind;

/// One `param=variant` argument of a `run`/`vprof` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub param: String,
    pub variant: String,
}

impl Selection {
    /// Decode a `param=variant` token; exactly one `=` with text on both sides
    pub fn decode(token: &str) -> Result<Self, SpecErrorKind> {
        match token.split_once('=') {
            Some((param, variant))
                if !param.is_empty() && !variant.is_empty() && !variant.contains('=') =>
            {
                Ok(Self {
                    param: param.to_string(),
                    variant: variant.to_string(),
                })
            }
            _ => Err(SpecErrorKind::MalformedSelection(token.to_string())),
        }
    }

    /// The token as written in the job file
    pub fn token(&self) -> String {
        format!("{}={}", self.param, self.variant)
    }
}

/// A decoded job-file line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `param <name> <variant> <fragment...>`
    Param {
        name: String,
        variant: String,
        fragment: String,
    },
    /// `shared <fragment...>`
    Shared { fragment: String },
    /// `shared(<key>) <fragment...>`
    SharedLocal { key: String, fragment: String },
    /// `raw <window> <fragment...>`
    Raw { window: String, fragment: String },
    /// `run <param=variant>...`
    Run(Vec<Selection>),
    /// `vprof <param=variant>...`
    Vprof(Vec<Selection>),
}

impl Directive {
    /// Decode a trimmed line that is neither blank nor a comment
    pub fn decode(line: &str) -> Result<Self, SpecErrorKind> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        match keyword {
            "param" => match args.as_slice() {
                [name, variant, rest @ ..] => Ok(Self::Param {
                    name: name.to_string(),
                    variant: variant.to_string(),
                    fragment: rest.join(" "),
                }),
                _ => Err(SpecErrorKind::MissingParamArgs),
            },
            "shared" => Ok(Self::Shared {
                fragment: args.join(" "),
            }),
            "raw" => match args.as_slice() {
                [window, rest @ ..] => Ok(Self::Raw {
                    window: window.to_string(),
                    fragment: rest.join(" "),
                }),
                [] => Err(SpecErrorKind::MissingWindowName),
            },
            "run" => Ok(Self::Run(decode_selections(&args, "run")?)),
            "vprof" => Ok(Self::Vprof(decode_selections(&args, "vprof")?)),
            other => match other.strip_prefix("shared(") {
                Some(rest) => {
                    let key = rest
                        .strip_suffix(')')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .ok_or_else(|| SpecErrorKind::MalformedSharedKey(other.to_string()))?;
                    Ok(Self::SharedLocal {
                        key: key.to_string(),
                        fragment: args.join(" "),
                    })
                }
                None => Err(SpecErrorKind::UnknownDirective(other.to_string())),
            },
        }
    }
}

fn decode_selections(args: &[&str], keyword: &'static str) -> Result<Vec<Selection>, SpecErrorKind> {
    if args.is_empty() {
        return Err(SpecErrorKind::EmptySelection(keyword));
    }
    args.iter().map(|token| Selection::decode(token)).collect()
}
