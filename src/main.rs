fn main() {
    if let Err(err) = sheetbridge::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
