fn main() {
    #[cfg(feature = "fuzz")]
    {
        afl::fuzz!(|data: &[u8]| {
            if let Ok(input) = std::str::from_utf8(data) {
                if fuzz(input.to_string()).is_err() {
                    println!("Fuzzing failed");
                } else {
                    println!("Fuzzing succeeded");
                }
            }
        });
    }
}

/// Renamed programs must survive emission and parsing unchanged.
#[cfg(feature = "fuzz")]
fn fuzz(input: String) -> miette::Result<()> {
    use minic_obf::obfuscate::RenameIdentifiers;

    let program = minic_obf::parse(&input).map_err(|err| err.with_source_code(input.clone()))?;
    let (renamed, _) = RenameIdentifiers::default().run(program)?;
    let output = minic_obf::emit(&renamed);
    let reparsed = minic_obf::parse(&output).map_err(|err| err.with_source_code(output.clone()))?;
    assert_eq!(reparsed, renamed, "round trip changed the tree:\n{}", output);
    Ok(())
}
