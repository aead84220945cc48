use miette::{IntoDiagnostic, Result};
use std::io::{Read, Write};

use minic_obf::obfuscate::{DeadCodeInsertion, Obfuscator, ObfuscatorConfig, Technique};

const DEFAULT_TECHNIQUES: [Technique; 2] = [Technique::RenameIdentifiers, Technique::DeadCode];

struct Args {
    config: ObfuscatorConfig,
    input: clio::Input,
    output: clio::Output,
}

impl Args {
    fn help() -> String {
        let help = r#"_Usage_: *minic-obf* [techniques] [options] <input> [-o output]

_Techniques_ (all of them if none is given, in the order given otherwise):
    *-rename*         Rename functions, parameters and local variables
    *-dead-code*      Insert unused variable declarations
    *-t ids*          Comma-separated technique ids, see below

_Options_:
    *-p probability*  Chance of a declaration after each statement (default 0.25)
    *-seed n*         Seed the random generator for reproducible output
    *-strict*         Fail on an assignment to something that is not a variable
    *-help*           Print this help message

_Arguments_:
    *input*           Input file, use - for stdin
    *-o output*       Output file, use - or omit for stdout"#;

        // Ids are appended unmarked, their underscores are not markup.
        let ids: Vec<_> = DEFAULT_TECHNIQUES.iter().map(Technique::as_str).collect();
        format!("{}\n\nTechnique ids: {}", markup(help), ids.join(", "))
    }

    /// Parse command line arguments, return Err if failed.
    fn try_parse() -> Result<Self, String> {
        let mut args = std::env::args_os();
        args.next(); // skip program name

        let mut techniques = Vec::new();
        let mut probability = None;
        let mut seed = None;
        let mut strict = false;
        let mut input = None;
        let mut output = None;

        while let Some(arg) = args.next() {
            match arg.to_str() {
                Some("-help") => {
                    // Print help message and exit
                    println!("{}", Self::help());
                    std::process::exit(0);
                }
                Some("-rename") => techniques.push(Technique::RenameIdentifiers.to_string()),
                Some("-dead-code") => techniques.push(Technique::DeadCode.to_string()),
                Some("-t") => {
                    let value = args.next().ok_or("missing value of `-t`")?;
                    let value = value.to_string_lossy();
                    techniques.extend(value.split(',').map(|id| id.trim().to_string()));
                }
                Some("-strict") => strict = true,
                Some("-p") => {
                    let value = args.next().ok_or("missing value of `-p`")?;
                    let value = value.to_string_lossy();
                    let value: f64 = value
                        .parse()
                        .map_err(|_| format!("invalid probability: {}", value))?;
                    probability = Some(value);
                }
                Some("-seed") => {
                    let value = args.next().ok_or("missing value of `-seed`")?;
                    let value = value.to_string_lossy();
                    let value: u64 = value
                        .parse()
                        .map_err(|_| format!("invalid seed: {}", value))?;
                    seed = Some(value);
                }
                Some("-o") => {
                    let value = args.next().ok_or("missing value of `-o`")?;
                    output = Some(value);
                }
                Some(flag) if flag.starts_with('-') && flag != "-" => {
                    return Err(format!("unknown option: {}", flag));
                }
                _ if input.is_none() => input = Some(arg),
                _ => return Err(format!("unexpected argument: {}", arg.to_string_lossy())),
            }
        }

        let config = build_config(&techniques, probability, seed, strict)?;

        // Parse input
        let input = input.ok_or("missing argument `input`")?;
        let input = clio::Input::new(&input).map_err(|err| err.to_string())?;

        // Parse output. Missing output is allowed.
        let output = output.unwrap_or_else(|| "-".into());
        let output = clio::Output::new(&output).map_err(|err| err.to_string())?;

        Ok(Self {
            config,
            input,
            output,
        })
    }

    /// Parse command line arguments, print help message and exit if failed.
    fn parse() -> Self {
        Self::try_parse().unwrap_or_else(|err| {
            eprintln!("{}: {}", markup("_Error_"), err);
            eprintln!("{}", Self::help());
            std::process::exit(1);
        })
    }
}

/// Configuration from technique ids and pass options. No id selects every
/// technique.
fn build_config(
    techniques: &[String],
    probability: Option<f64>,
    seed: Option<u64>,
    strict: bool,
) -> Result<ObfuscatorConfig, String> {
    let mut config = if techniques.is_empty() {
        ObfuscatorConfig::with_techniques(DEFAULT_TECHNIQUES)
    } else {
        ObfuscatorConfig::parse_techniques(techniques.iter().map(String::as_str))
            .map_err(|err| err.to_string())?
    };
    config.rename.strict = strict;
    if let Some(probability) = probability {
        config.dead_code = DeadCodeInsertion::new(probability).map_err(|err| err.to_string())?;
    }
    if let Some(seed) = seed {
        config.dead_code = config.dead_code.with_seed(seed);
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let mut args = Args::parse();

    // Read input
    let mut input = String::new();
    args.input.read_to_string(&mut input).into_diagnostic()?;

    // Parse
    let program = match minic_obf::parse(&input) {
        Ok(program) => program,
        Err(diagnostic) => Err(diagnostic.with_source_code(input))?,
    };

    // Obfuscate
    let obfuscator = Obfuscator::from_config(&args.config);
    let obfuscated = match obfuscator.run(program) {
        Ok(obfuscated) => obfuscated,
        Err(err) => {
            for warning in err.warnings.iter().cloned() {
                eprintln!("{:?}", miette::Report::new(warning));
            }
            Err(err)?
        }
    };
    for warning in obfuscated.warnings {
        eprintln!("{:?}", miette::Report::new(warning));
    }

    // Generate output
    write!(args.output, "{}", minic_obf::emit(&obfuscated.program)).into_diagnostic()?;

    Ok(())
}

/// Simple markup for help message.
///
/// * `_underline_`
/// * `*bold*`
fn markup(s: &str) -> String {
    use owo_colors::OwoColorize;
    use regex::{Captures, Regex};

    let Ok(re) = Regex::new(r"_(?P<underline>.*?)_|\*(?P<bold>.*?)\*") else {
        return s.to_string();
    };
    re.replace_all(s, |caps: &Captures| {
        if let Some(s) = caps.name("bold") {
            return s.as_str().bold().to_string();
        }
        if let Some(s) = caps.name("underline") {
            return s.as_str().bold().underline().to_string();
        }
        caps[0].to_string()
    })
    .into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn no_technique_selects_all() {
        let config = build_config(&[], None, None, false).unwrap();
        assert_eq!(config.techniques(), DEFAULT_TECHNIQUES);
    }

    #[test]
    fn technique_ids_keep_order() {
        let config = build_config(&ids(&["dead_code", "rename_identifiers"]), None, None, false)
            .unwrap();
        assert_eq!(
            config.techniques(),
            [Technique::DeadCode, Technique::RenameIdentifiers]
        );
    }

    #[test]
    fn unknown_technique_id_is_an_error() {
        let err = build_config(&ids(&["rename_identifiers", "flatten"]), None, None, false)
            .unwrap_err();
        assert!(err.contains("flatten"), "{err}");
    }

    #[test]
    fn options_reach_the_passes() {
        let config = build_config(&ids(&["dead_code"]), Some(0.5), Some(9), true).unwrap();
        assert!(config.rename.strict);
        assert_eq!(config.dead_code.probability(), 0.5);
        assert_eq!(config.dead_code.seed(), Some(9));
        assert!(build_config(&[], Some(2.0), None, false).is_err());
    }
}
