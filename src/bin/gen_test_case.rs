use proptest::{
    strategy::{Strategy, ValueTree},
    test_runner::TestRunner,
};

fn main() {
    let mut runner = TestRunner::default();
    let gen = minic_obf::ast::arbitrary::arb_program();
    let ast = match gen.new_tree(&mut runner) {
        Ok(tree) => tree.current(),
        Err(reason) => {
            eprintln!("failed to generate a program: {}", reason);
            std::process::exit(1);
        }
    };
    print!("{}", minic_obf::emit(&ast));
}
