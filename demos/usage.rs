//! Illustrates the public API: parse a file, run the interpreter, inspect
//! draw items and diagnostics. Not wired up as a Cargo example target
//! (this crate's own `examples/` directory is reserved for the retrieval
//! pack it was built from) — read this as documentation.

use gerber_core::Gerber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let gerber = Gerber::new("tests/two_square_boxes.gbr")?;
    let interpreter = gerber.interpret();

    println!("draw items: {}", interpreter.items.len());
    for diagnostic in &interpreter.diagnostics {
        println!("{}", diagnostic);
    }

    Ok(())
}
